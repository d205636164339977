//! Censoring models for inverse probability of censoring weighting.
//!
//! Both models estimate the censoring survival `G(t) = P(C > t)` with the
//! reverse Kaplan-Meier curve of the evaluation sample, but they weight
//! observations differently and are kept as separate types:
//!
//! - [`IpcwCensoring`] weights single observations, for AUC and Brier score.
//! - [`MarginalCensoring`] weights pairs of observations, for the truncated
//!   concordance index.

use crisk_model::Subject;
use crisk_stats::survival::KaplanMeierCurve;

fn censoring_curve(subjects: &[Subject]) -> KaplanMeierCurve {
    KaplanMeierCurve::censoring(subjects.iter().map(|s| (s.time, s.status.is_censored())))
}

fn inverse(g: f64) -> Option<f64> {
    (g > 0.0).then(|| 1.0 / g)
}

/// Per-observation weights for time-dependent AUC and Brier score.
#[derive(Debug, Clone)]
pub struct IpcwCensoring {
    curve: KaplanMeierCurve,
}

impl IpcwCensoring {
    #[must_use]
    pub fn new(subjects: &[Subject]) -> Self {
        Self {
            curve: censoring_curve(subjects),
        }
    }

    /// `1 / G(T-)` for a subject observed to fail at `time`.
    #[must_use]
    pub fn event_weight(&self, time: f64) -> Option<f64> {
        inverse(self.curve.survival_before(time))
    }

    /// `1 / G(t)` for a subject still event-free at evaluation time `t`.
    #[must_use]
    pub fn survivor_weight(&self, time: f64) -> Option<f64> {
        inverse(self.curve.survival_at(time))
    }
}

/// Pairwise weights for the truncated concordance index.
#[derive(Debug, Clone)]
pub struct MarginalCensoring {
    curve: KaplanMeierCurve,
}

impl MarginalCensoring {
    #[must_use]
    pub fn new(subjects: &[Subject]) -> Self {
        Self {
            curve: censoring_curve(subjects),
        }
    }

    /// Weight of a pair where the case fails at `case_time` before the other
    /// subject's observed time: `1 / (G(Ti-) G(Ti))`.
    #[must_use]
    pub fn ordered_pair_weight(&self, case_time: f64) -> Option<f64> {
        inverse(self.curve.survival_before(case_time) * self.curve.survival_at(case_time))
    }

    /// Weight of a pair where the other subject had a competing event at
    /// `competing_time` no later than `case_time`: `1 / (G(Ti-) G(Tj-))`.
    #[must_use]
    pub fn competing_pair_weight(&self, case_time: f64, competing_time: f64) -> Option<f64> {
        inverse(
            self.curve.survival_before(case_time) * self.curve.survival_before(competing_time),
        )
    }
}

#[cfg(test)]
mod tests {
    use crisk_model::Status;

    use super::*;

    fn subject(time: f64, status: Status) -> Subject {
        Subject {
            covariates: vec![],
            time,
            status,
        }
    }

    fn sample() -> Vec<Subject> {
        vec![
            subject(1.0, Status::Event),
            subject(2.0, Status::Censored),
            subject(3.0, Status::Competing),
            subject(4.0, Status::Event),
        ]
    }

    #[test]
    fn test_ipcw_weights() {
        let censoring = IpcwCensoring::new(&sample());
        // G drops to 2/3 at t=2 (three at risk, one censored).
        assert_eq!(censoring.event_weight(1.0), Some(1.0));
        assert_eq!(censoring.event_weight(2.0), Some(1.0));
        assert!((censoring.survivor_weight(2.0).unwrap() - 1.5).abs() < 1e-12);
        assert!((censoring.event_weight(3.0).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_pair_weights() {
        let censoring = MarginalCensoring::new(&sample());
        assert_eq!(censoring.ordered_pair_weight(1.0), Some(1.0));
        assert!((censoring.ordered_pair_weight(4.0).unwrap() - 2.25).abs() < 1e-12);
        assert!((censoring.competing_pair_weight(4.0, 3.0).unwrap() - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_censoring_survival() {
        let censoring = IpcwCensoring::new(&[subject(1.0, Status::Censored)]);
        assert_eq!(censoring.survivor_weight(1.0), None);
    }
}
