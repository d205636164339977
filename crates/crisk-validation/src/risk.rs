use crisk_metrics::{concordance, integrated_brier, score};
use crisk_model::{CompetingRiskModel, Status, Subject};

use crate::{Metric, MetricKey, MetricRecord, SplitId};

/// Metric records of one split's held-out evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskEvaluation {
    /// Mean predicted cumulative incidence at `0..=max horizon`.
    pub incidence: Vec<MetricRecord>,
    pub auc: Vec<MetricRecord>,
    pub brier: Vec<MetricRecord>,
    pub ibs: Vec<MetricRecord>,
    pub concordance: Vec<MetricRecord>,
}

/// Scores a fitted model on held-out subjects.
///
/// For each horizon `h`, AUC and Brier score are evaluated at every whole time
/// `1..=h`, the integrated Brier score over that path, and the truncated
/// concordance at `h`.
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    cause: Status,
    /// Strictly ascending.
    horizons: Vec<u32>,
}

impl RiskEvaluator {
    /// Horizons are sorted and deduplicated.
    ///
    /// With no horizons only the incidence at time 0 is evaluated.
    #[must_use]
    pub fn new(cause: Status, mut horizons: Vec<u32>) -> Self {
        horizons.sort_unstable();
        horizons.dedup();
        Self { cause, horizons }
    }

    #[must_use]
    pub fn horizons(&self) -> &[u32] {
        &self.horizons
    }

    /// Largest horizon, or 0 without horizons.
    #[must_use]
    pub fn max_horizon(&self) -> u32 {
        self.horizons.last().copied().unwrap_or(0)
    }

    pub fn evaluate<M>(&self, split: SplitId, model: &M, test: &[Subject]) -> RiskEvaluation
    where
        M: CompetingRiskModel + ?Sized,
    {
        let record = |key, value| MetricRecord { split, key, value };
        let max_horizon = self.max_horizon();
        let mut evaluation = RiskEvaluation::default();

        let grid = (0..=max_horizon).map(f64::from).collect::<Vec<_>>();
        let predictions = model.predict_matrix(test, &grid);
        for (k, time) in (0..=max_horizon).enumerate() {
            let average = mean(predictions.iter().map(|row| row[k]));
            evaluation
                .incidence
                .push(record(MetricKey::incidence(time), average));
        }

        // The censoring model depends only on `test`, so one pass over the
        // longest grid serves every horizon.
        let times = (1..=max_horizon).map(f64::from).collect::<Vec<_>>();
        let table = score(model, test, self.cause, &times);

        for &horizon in &self.horizons {
            let mut path_len = 0;
            for (k, time) in (1..=horizon).enumerate() {
                evaluation
                    .auc
                    .push(record(MetricKey::timed(Metric::Auc, horizon, time), table.auc[k]));
                evaluation.brier.push(record(
                    MetricKey::timed(Metric::Brier, horizon, time),
                    table.brier[k],
                ));
                path_len = k + 1;
            }

            let ibs = integrated_brier(&table.brier[..path_len]);
            if ibs.is_none() {
                log::warn!("split {split}: integrated Brier score missing at horizon {horizon}");
            }
            evaluation
                .ibs
                .push(record(MetricKey::at_horizon(Metric::Ibs, horizon), ibs));

            let c_index = concordance(model, test, f64::from(horizon), self.cause);
            if c_index.is_none() {
                log::warn!("split {split}: concordance missing at horizon {horizon}");
            }
            evaluation.concordance.push(record(
                MetricKey::at_horizon(Metric::Concordance, horizon),
                c_index,
            ));
        }

        evaluation
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (count, sum) = values
        .into_iter()
        .fold((0_usize, 0.0), |(count, sum), v| (count + 1, sum + v));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Risk rises linearly to the subject's covariate at t=10.
    #[derive(Debug)]
    struct Linear;

    impl CompetingRiskModel for Linear {
        fn cause(&self) -> Status {
            Status::Event
        }

        fn predict_cif(&self, covariates: &[f64], times: &[f64]) -> Vec<f64> {
            times
                .iter()
                .map(|t| covariates[0] * (t / 10.0).min(1.0))
                .collect()
        }
    }

    fn test_subjects() -> Vec<Subject> {
        [
            (0.9, 1.0, Status::Event),
            (0.7, 2.0, Status::Event),
            (0.2, 3.0, Status::Competing),
            (0.4, 4.0, Status::Event),
            (0.1, 6.0, Status::Censored),
            (0.3, 9.0, Status::Censored),
        ]
        .into_iter()
        .map(|(risk, time, status)| Subject {
            covariates: vec![risk],
            time,
            status,
        })
        .collect()
    }

    #[test]
    fn test_record_layout() {
        let evaluator = RiskEvaluator::new(Status::Event, vec![3, 5]);
        let evaluation = evaluator.evaluate(SplitId(4), &Linear, &test_subjects());

        assert_eq!(evaluation.incidence.len(), 6);
        assert_eq!(evaluation.incidence[0].value, Some(0.0));
        assert_eq!(evaluation.auc.len(), 3 + 5);
        assert_eq!(evaluation.brier.len(), 3 + 5);
        assert_eq!(evaluation.ibs.len(), 2);
        assert_eq!(evaluation.concordance.len(), 2);
        assert!(
            evaluation
                .auc
                .iter()
                .chain(&evaluation.concordance)
                .all(|r| r.split == SplitId(4))
        );
        assert_eq!(evaluation.auc[3].key, MetricKey::timed(Metric::Auc, 5, 1));
    }

    #[test]
    fn test_horizon_paths_share_values() {
        let evaluator = RiskEvaluator::new(Status::Event, vec![3, 5]);
        let evaluation = evaluator.evaluate(SplitId(1), &Linear, &test_subjects());

        for k in 0..3 {
            assert_eq!(evaluation.brier[k].value, evaluation.brier[3 + k].value);
        }
        let path = evaluation.brier[..3]
            .iter()
            .map(|r| r.value.unwrap())
            .sum::<f64>();
        let ibs = evaluation.ibs[0].value.unwrap();
        assert!((ibs - path / 3.0).abs() < 1e-12);
        assert_eq!(evaluation.concordance[0].value, Some(1.0));
    }

    #[test]
    fn test_horizons_normalized() {
        let evaluator = RiskEvaluator::new(Status::Event, vec![5, 3, 5]);
        assert_eq!(evaluator.horizons(), &[3, 5]);
        assert_eq!(evaluator.max_horizon(), 5);

        let sorted = RiskEvaluator::new(Status::Event, vec![3, 5]);
        let subjects = test_subjects();
        assert_eq!(
            evaluator.evaluate(SplitId(0), &Linear, &subjects),
            sorted.evaluate(SplitId(0), &Linear, &subjects)
        );
    }

    #[test]
    fn test_no_horizons() {
        let evaluator = RiskEvaluator::new(Status::Event, vec![]);
        assert_eq!(evaluator.max_horizon(), 0);

        let evaluation = evaluator.evaluate(SplitId(0), &Linear, &test_subjects());
        assert_eq!(evaluation.incidence.len(), 1);
        assert!(evaluation.auc.is_empty());
        assert!(evaluation.ibs.is_empty());
        assert!(evaluation.concordance.is_empty());
    }
}
