use crisk_model::{Status, Subject};
use crisk_stats::{binning::QuantileBins, survival::pseudo_values};
use serde::Serialize;

/// Predicted and observed cumulative incidence of one risk bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationBin {
    /// Zero-based bin index, in increasing predicted risk.
    pub bin: usize,
    pub count: usize,
    pub mean_predicted: f64,
    /// Mean pseudo-value of the Aalen-Johansen cumulative incidence.
    pub mean_observed: f64,
}

/// Calibration of predicted risks at `time`, in equal-frequency risk bins.
///
/// Bins are cut at the quantiles of `risks`; tied cut points merge bins, so
/// fewer than `bins` bins may come back. Observed risk is the mean jackknife
/// pseudo-value of the cumulative incidence of `cause` at `time`, computed on
/// the whole sample. Empty bins are omitted.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn calibration_bins(
    risks: &[f64],
    subjects: &[Subject],
    cause: Status,
    time: f64,
    bins: usize,
) -> Vec<CalibrationBin> {
    debug_assert_eq!(risks.len(), subjects.len());
    if subjects.is_empty() {
        return vec![];
    }

    let outcomes = subjects
        .iter()
        .map(|s| (s.time, s.status.code()))
        .collect::<Vec<_>>();
    let cuts = QuantileBins::new(risks, bins);
    if cuts.is_empty() {
        return vec![];
    }
    let observed = pseudo_values(&outcomes, cause.code(), time);

    let mut sums = vec![(0_usize, 0.0, 0.0); cuts.len()];
    for (&risk, pseudo) in risks.iter().zip(observed) {
        let entry = &mut sums[cuts.assign(risk)];
        entry.0 += 1;
        entry.1 += risk;
        entry.2 += pseudo;
    }

    sums.into_iter()
        .enumerate()
        .filter(|(_, (count, _, _))| *count > 0)
        .map(|(bin, (count, predicted, observed))| CalibrationBin {
            bin,
            count,
            mean_predicted: predicted / count as f64,
            mean_observed: observed / count as f64,
        })
        .collect()
}
