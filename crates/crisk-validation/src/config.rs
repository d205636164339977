use crisk_model::{PredictorSet, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("at least 2 folds are required, got {folds}")]
    TooFewFolds { folds: usize },
    #[display("at least one repeat is required")]
    NoRepeats,
    #[display("no evaluation horizons configured")]
    NoHorizons,
    #[display("horizons must be positive")]
    ZeroHorizon,
    #[display("at least one calibration bin is required")]
    NoCalibrationBins,
    #[display("cause of interest must be 1 or 2, got {code}")]
    InvalidCause { code: u8 },
    #[display("maximum time must be positive and finite, got {max_time}")]
    InvalidMaxTime { max_time: f64 },
}

/// Cross-validation run configuration.
///
/// Every field has a default, so a partial JSON object deserializes:
///
/// ```
/// use crisk_validation::CvConfig;
///
/// let config: CvConfig = serde_json::from_str(r#"{"folds": 3, "continuous": ["age"]}"#).unwrap();
/// assert_eq!(config.folds, 3);
/// assert_eq!(config.repeats, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CvConfig {
    pub seed: u64,
    pub folds: usize,
    pub repeats: usize,
    pub categorical: Vec<String>,
    pub continuous: Vec<String>,
    /// Upper evaluation horizons, in whole time units.
    pub horizons: Vec<u32>,
    pub calibration_bins: usize,
    pub calibration_horizons: Vec<u32>,
    /// Observed times above this are censored here.
    pub max_time: f64,
    /// Status code of the cause of interest.
    pub cause: u8,
    /// Run splits on scoped worker threads.
    pub parallel: bool,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            folds: 5,
            repeats: 10,
            categorical: vec![],
            continuous: vec![],
            horizons: vec![60, 114],
            calibration_bins: 10,
            calibration_horizons: vec![60, 114],
            max_time: 114.0,
            cause: 1,
            parallel: false,
        }
    }
}

impl CvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folds < 2 {
            return Err(ConfigError::TooFewFolds { folds: self.folds });
        }
        if self.repeats == 0 {
            return Err(ConfigError::NoRepeats);
        }
        if self.horizons.is_empty() {
            return Err(ConfigError::NoHorizons);
        }
        if self.horizons.contains(&0) || self.calibration_horizons.contains(&0) {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.calibration_bins == 0 {
            return Err(ConfigError::NoCalibrationBins);
        }
        if !(self.max_time.is_finite() && self.max_time > 0.0) {
            return Err(ConfigError::InvalidMaxTime {
                max_time: self.max_time,
            });
        }
        self.cause()?;

        let max_horizon = self.max_horizon().unwrap_or(0);
        if f64::from(max_horizon) > self.max_time {
            log::warn!(
                "largest horizon {max_horizon} is beyond the maximum time {}",
                self.max_time
            );
        }
        Ok(())
    }

    pub fn cause(&self) -> Result<Status, ConfigError> {
        match Status::try_from(self.cause) {
            Ok(status) if !status.is_censored() => Ok(status),
            _ => Err(ConfigError::InvalidCause { code: self.cause }),
        }
    }

    #[must_use]
    pub fn predictors(&self) -> PredictorSet {
        PredictorSet::new(self.categorical.clone(), self.continuous.clone())
    }

    /// Evaluation horizons, ascending and deduplicated.
    #[must_use]
    pub fn sorted_horizons(&self) -> Vec<u32> {
        sorted_unique(&self.horizons)
    }

    #[must_use]
    pub fn sorted_calibration_horizons(&self) -> Vec<u32> {
        sorted_unique(&self.calibration_horizons)
    }

    #[must_use]
    pub fn max_horizon(&self) -> Option<u32> {
        self.horizons.iter().copied().max()
    }
}

fn sorted_unique(values: &[u32]) -> Vec<u32> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values.dedup();
    values
}
