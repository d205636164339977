//! Cross-split summaries.
//!
//! Records are grouped by key in ordered maps and each group's samples are
//! sorted by split id before summarizing, so summaries do not depend on the
//! order in which splits finished.

use std::collections::BTreeMap;

use crisk_stats::descriptive::MeanCi;
use serde::Serialize;

use crate::{CalibrationRecord, MetricKey, MetricRecord, SplitId};

/// Mean and 95% confidence interval of one metric key across splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryRecord {
    #[serde(flatten)]
    pub key: MetricKey,
    #[serde(flatten)]
    pub summary: MeanCi,
}

/// Calibration of one bin at one horizon across splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationSummary {
    pub horizon: u32,
    pub bin: usize,
    pub predicted: MeanCi,
    pub observed: MeanCi,
}

/// Summarizes metric records per key, in key order.
#[must_use]
pub fn summarize_metrics(records: &[MetricRecord]) -> Vec<SummaryRecord> {
    let mut groups = BTreeMap::<MetricKey, Vec<(SplitId, Option<f64>)>>::new();
    for record in records {
        groups
            .entry(record.key)
            .or_default()
            .push((record.split, record.value));
    }

    groups
        .into_iter()
        .map(|(key, mut samples)| {
            samples.sort_by_key(|(split, _)| *split);
            SummaryRecord {
                key,
                summary: MeanCi::from_samples(samples.into_iter().map(|(_, v)| v)),
            }
        })
        .collect()
}

/// Summarizes calibration records per `(horizon, bin)`.
#[must_use]
pub fn summarize_calibration(records: &[CalibrationRecord]) -> Vec<CalibrationSummary> {
    let mut groups = BTreeMap::<(u32, usize), Vec<&CalibrationRecord>>::new();
    for record in records {
        groups
            .entry((record.horizon, record.bin.bin))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|((horizon, bin), mut samples)| {
            samples.sort_by_key(|r| r.split);
            CalibrationSummary {
                horizon,
                bin,
                predicted: MeanCi::from_values(samples.iter().map(|r| r.bin.mean_predicted)),
                observed: MeanCi::from_values(samples.iter().map(|r| r.bin.mean_observed)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crisk_metrics::CalibrationBin;
    use rand::{SeedableRng as _, seq::SliceRandom as _};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::Metric;

    #[expect(clippy::cast_precision_loss)]
    fn records() -> Vec<MetricRecord> {
        let mut records = vec![];
        for split in 1..=10 {
            for time in 1..=3 {
                let value = (split % 4 != 0)
                    .then(|| 0.6 + 0.013 * split as f64 + 0.001 * f64::from(time));
                records.push(MetricRecord {
                    split: SplitId(split),
                    key: MetricKey::timed(Metric::Auc, 3, time),
                    value,
                });
            }
            records.push(MetricRecord {
                split: SplitId(split),
                key: MetricKey::at_horizon(Metric::Concordance, 3),
                value: Some(0.1 * split as f64),
            });
        }
        records
    }

    #[test]
    fn test_order_invariant() {
        let records = records();
        let expected = summarize_metrics(&records);
        assert_eq!(expected.len(), 4);

        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..20 {
            let mut shuffled = records.clone();
            shuffled.shuffle(&mut rng);
            assert_eq!(summarize_metrics(&shuffled), expected);
        }
    }

    #[test]
    fn test_missing_excluded() {
        let summaries = summarize_metrics(&records());
        let auc = summaries
            .iter()
            .find(|s| s.key == MetricKey::timed(Metric::Auc, 3, 1))
            .unwrap();
        // splits 4 and 8 are missing
        assert_eq!(auc.summary.n, 8);
        assert!(auc.summary.lower.is_some());
    }

    #[test]
    fn test_calibration_groups() {
        let record = |split, horizon, bin, predicted, observed| CalibrationRecord {
            split: SplitId(split),
            horizon,
            bin: CalibrationBin {
                bin,
                count: 10,
                mean_predicted: predicted,
                mean_observed: observed,
            },
        };
        let records = vec![
            record(2, 60, 0, 0.1, 0.2),
            record(1, 60, 0, 0.3, 0.2),
            record(1, 60, 1, 0.5, 0.5),
            record(1, 114, 0, 0.2, 0.1),
        ];
        let summaries = summarize_calibration(&records);
        assert_eq!(summaries.len(), 3);
        assert_eq!((summaries[0].horizon, summaries[0].bin), (60, 0));
        assert_eq!(summaries[0].predicted.n, 2);
        assert!((summaries[0].predicted.mean.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(summaries[0].observed.lower, summaries[0].observed.upper);
        assert_eq!(summaries[1].predicted.lower, None);
        assert_eq!(summaries[2].horizon, 114);
    }
}
