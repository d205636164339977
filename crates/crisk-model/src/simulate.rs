//! Seeded synthetic competing-risks data.
//!
//! Each subject gets a categorical `group` (`a`, `b` or `c`) and two standard
//! normal covariates `x1` and `x2`. Latent times for the cause of interest, the
//! competing cause and censoring are exponential; the cause of interest has a
//! proportional hazard in the covariates. Observed times are rounded up to
//! whole time units, and anything past `max_time` is censored there.
//!
//! Because the cause-specific hazards are constant, the true cumulative
//! incidence is known in closed form ([`SimulationParams::true_cif`]), which
//! makes [`OracleModel`] available as a reference model.

use rand::{Rng, SeedableRng as _};
use rand_distr::{Distribution as _, Exp, StandardNormal};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{Cell, CompetingRiskModel, Record, STATUS_COLUMN, Status, TIME_COLUMN};

pub const GROUP_LEVELS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display("{name} must be finite and non-negative, got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[display("maximum time must be positive, got {max_time}")]
    InvalidMaxTime { max_time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub rows: usize,
    /// Baseline hazard of the cause of interest.
    pub event_rate: f64,
    pub competing_rate: f64,
    pub censoring_rate: f64,
    /// Log hazard ratio of `x1` for the cause of interest.
    pub x1_effect: f64,
    pub x2_effect: f64,
    /// Log hazard ratio per group step (`b` is one step, `c` two).
    pub group_effect: f64,
    pub max_time: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            rows: 100,
            event_rate: 0.01,
            competing_rate: 0.0075,
            censoring_rate: 0.0075,
            x1_effect: 0.7,
            x2_effect: -0.3,
            group_effect: 0.4,
            max_time: 120.0,
        }
    }
}

impl SimulationParams {
    fn validate(&self) -> Result<(), SimulationError> {
        for (name, value) in [
            ("event rate", self.event_rate),
            ("competing rate", self.competing_rate),
            ("censoring rate", self.censoring_rate),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimulationError::InvalidRate { name, value });
            }
        }
        if !(self.max_time.is_finite() && self.max_time > 0.0) {
            return Err(SimulationError::InvalidMaxTime {
                max_time: self.max_time,
            });
        }
        Ok(())
    }

    #[expect(clippy::cast_precision_loss)]
    fn event_hazard(&self, group: usize, x1: f64, x2: f64) -> f64 {
        let eta = self.group_effect * group as f64 + self.x1_effect * x1 + self.x2_effect * x2;
        self.event_rate * eta.exp()
    }

    /// True cumulative incidence of the cause of interest at `time`.
    ///
    /// `group` is an index into [`GROUP_LEVELS`]. Censoring does not enter the
    /// cumulative incidence.
    #[must_use]
    pub fn true_cif(&self, group: usize, x1: f64, x2: f64, time: f64) -> f64 {
        let l1 = self.event_hazard(group, x1, x2);
        let total = l1 + self.competing_rate;
        if total <= 0.0 || time <= 0.0 {
            return 0.0;
        }
        l1 / total * (1.0 - (-total * time).exp())
    }
}

/// Draws `params.rows` records with columns `group`, `x1`, `x2`, `time` and
/// `status`.
///
/// The same `seed` always yields the same records.
pub fn simulate_records(
    params: &SimulationParams,
    seed: u64,
) -> Result<Vec<Record>, SimulationError> {
    params.validate()?;
    let exp = |rate: f64| {
        Exp::new(rate).map_err(|_| SimulationError::InvalidRate {
            name: "rate",
            value: rate,
        })
    };
    let competing = exp(params.competing_rate)?;
    let censoring = exp(params.censoring_rate)?;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut records = Vec::with_capacity(params.rows);
    for _ in 0..params.rows {
        let group = rng.random_range(0..GROUP_LEVELS.len());
        let x1: f64 = rng.sample(StandardNormal);
        let x2: f64 = rng.sample(StandardNormal);

        let event = exp(params.event_hazard(group, x1, x2))?;
        let candidates = [
            (event.sample(&mut rng), Status::Event),
            (competing.sample(&mut rng), Status::Competing),
            (censoring.sample(&mut rng), Status::Censored),
        ];
        let (latent, status) = candidates
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((f64::INFINITY, Status::Censored));
        let (time, status) = if latent > params.max_time {
            (params.max_time, Status::Censored)
        } else {
            (latent.ceil().max(1.0), status)
        };

        records.push(Record::from([
            ("group".to_owned(), Cell::from(GROUP_LEVELS[group])),
            ("x1".to_owned(), Cell::from(x1)),
            ("x2".to_owned(), Cell::from(x2)),
            (TIME_COLUMN.to_owned(), Cell::from(time)),
            (STATUS_COLUMN.to_owned(), Cell::from(f64::from(status.code()))),
        ]));
    }

    log::debug!("simulated {} records with seed {seed}", records.len());
    Ok(records)
}

/// Reference model predicting the true cumulative incidence of a simulation.
///
/// Expects the design produced by categorical `group` and continuous `x1`,
/// `x2`: `[groupb, groupc, x1, x2]`.
#[derive(Debug, Clone)]
pub struct OracleModel {
    pub params: SimulationParams,
}

impl CompetingRiskModel for OracleModel {
    fn cause(&self) -> Status {
        Status::Event
    }

    fn predict_cif(&self, covariates: &[f64], times: &[f64]) -> Vec<f64> {
        let group = if covariates[1] > 0.5 {
            2
        } else {
            usize::from(covariates[0] > 0.5)
        };
        times
            .iter()
            .map(|&t| self.params.true_cif(group, covariates[2], covariates[3], t))
            .collect()
    }
}
