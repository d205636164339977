use crisk_metrics::calibrate;
use crisk_model::{CompetingRiskModel, Status, Subject};

use crate::{CalibrationRecord, SplitId};

/// Quantile-binned calibration of a fitted model at fixed horizons.
///
/// Each horizon is evaluated on its own; bins may be fewer than requested when
/// tied predictions collapse them.
#[derive(Debug, Clone)]
pub struct CalibrationEvaluator {
    cause: Status,
    horizons: Vec<u32>,
    bins: usize,
}

impl CalibrationEvaluator {
    #[must_use]
    pub fn new(cause: Status, horizons: Vec<u32>, bins: usize) -> Self {
        Self {
            cause,
            horizons,
            bins,
        }
    }

    pub fn evaluate<M>(
        &self,
        split: SplitId,
        model: &M,
        test: &[Subject],
    ) -> Vec<CalibrationRecord>
    where
        M: CompetingRiskModel + ?Sized,
    {
        self.horizons
            .iter()
            .flat_map(|&horizon| {
                let bins = calibrate(model, test, f64::from(horizon), self.cause, self.bins);
                if bins.len() < self.bins {
                    log::debug!(
                        "split {split}: {} of {} calibration bins at horizon {horizon}",
                        bins.len(),
                        self.bins
                    );
                }
                bins.into_iter().map(move |bin| CalibrationRecord {
                    split,
                    horizon,
                    bin,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crisk_model::{
        Dataset, PredictorSet,
        simulate::{OracleModel, SimulationParams, simulate_records},
    };

    use super::*;

    fn oracle_dataset(rows: usize) -> (OracleModel, Dataset) {
        let params = SimulationParams {
            rows,
            censoring_rate: 0.003,
            ..SimulationParams::default()
        };
        let records = simulate_records(&params, 2024).unwrap();
        let predictors = PredictorSet::new(vec!["group".into()], vec!["x1".into(), "x2".into()]);
        let dataset = Dataset::from_records(&records, &predictors, params.max_time).unwrap();
        (OracleModel { params }, dataset)
    }

    #[test]
    fn test_oracle_is_calibrated() {
        let (oracle, dataset) = oracle_dataset(4000);
        let evaluator = CalibrationEvaluator::new(Status::Event, vec![60], 5);
        let records = evaluator.evaluate(SplitId(1), &oracle, dataset.subjects());

        assert_eq!(records.len(), 5);
        for record in &records {
            assert_eq!(record.horizon, 60);
            let gap = (record.bin.mean_observed - record.bin.mean_predicted).abs();
            assert!(gap < 0.08, "{record:?}");
        }
    }

    #[test]
    fn test_each_horizon_reported() {
        let (oracle, dataset) = oracle_dataset(200);
        let evaluator = CalibrationEvaluator::new(Status::Event, vec![30, 90], 4);
        let records = evaluator.evaluate(SplitId(2), &oracle, dataset.subjects());
        assert_eq!(records.iter().filter(|r| r.horizon == 30).count(), 4);
        assert_eq!(records.iter().filter(|r| r.horizon == 90).count(), 4);
        assert!(records.iter().all(|r| r.split == SplitId(2)));
    }
}
