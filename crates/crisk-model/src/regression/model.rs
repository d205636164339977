use std::fmt;

use crate::{Design, Status, Subject};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("training sample is empty")]
    Empty,
    #[display("no events of cause {cause} in the training sample")]
    NoEvents { cause: u8 },
    #[display("subject {index} has {found} covariates, expected {expected}")]
    Dimension {
        index: usize,
        found: usize,
        expected: usize,
    },
    #[display("subject {index} has a non-finite covariate or time")]
    NonFinite { index: usize },
    #[display("information matrix is singular at column {column}")]
    Singular { column: usize },
    #[display("estimation diverged after {iterations} iterations")]
    Diverged { iterations: usize },
    #[display("unknown predictor column '{name}'")]
    UnknownPredictor { name: String },
    #[display("model needs a non-censored cause")]
    CensoredCause,
}

/// Which design columns a model uses and which cause it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub cause: Status,
    /// Design column names, in model order.
    pub predictors: Vec<String>,
    /// Indices of `predictors` in the design.
    pub columns: Vec<usize>,
}

impl ModelSpec {
    /// Builds a spec using the named design columns.
    pub fn new<S>(design: &Design, cause: Status, names: &[S]) -> Result<Self, FitError>
    where
        S: AsRef<str>,
    {
        if cause.is_censored() {
            return Err(FitError::CensoredCause);
        }
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                design
                    .column_index(name)
                    .ok_or_else(|| FitError::UnknownPredictor {
                        name: name.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            cause,
            predictors: names.iter().map(|n| n.as_ref().to_owned()).collect(),
            columns,
        })
    }

    /// Builds a spec using every design column.
    #[must_use]
    pub fn all_columns(design: &Design, cause: Status) -> Self {
        Self {
            cause,
            predictors: design.names().map(str::to_owned).collect(),
            columns: (0..design.len()).collect(),
        }
    }

    /// Picks this spec's columns out of a full covariate vector.
    #[must_use]
    pub fn select(&self, covariates: &[f64]) -> Vec<f64> {
        self.columns.iter().map(|&c| covariates[c]).collect()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cause {} ~ {}",
            self.cause.code(),
            self.predictors.join(" + ")
        )
    }
}

/// A fitted model predicting the cumulative incidence of one cause.
pub trait CompetingRiskModel: fmt::Debug + Send + Sync {
    /// Cause the model was fitted for.
    fn cause(&self) -> Status;

    /// Cumulative incidence of the cause at each of `times`, for one subject's
    /// full design covariate vector.
    ///
    /// The returned values lie in `[0, 1]` and are non-decreasing in time.
    fn predict_cif(&self, covariates: &[f64], times: &[f64]) -> Vec<f64>;

    /// Predictions for many subjects; row `i` belongs to `subjects[i]`.
    fn predict_matrix(&self, subjects: &[Subject], times: &[f64]) -> Vec<Vec<f64>> {
        subjects
            .iter()
            .map(|s| self.predict_cif(&s.covariates, times))
            .collect()
    }
}

/// Fits a [`CompetingRiskModel`] to a training sample.
pub trait ModelFitter: Send + Sync {
    type Model: CompetingRiskModel;

    fn fit(&self, spec: &ModelSpec, subjects: &[Subject]) -> Result<Self::Model, FitError>;
}
