use crisk_model::{CompetingRiskModel, Status, Subject};
use serde::Serialize;

use crate::{
    CalibrationBin, IpcwCensoring, MarginalCensoring, brier_score, calibration_bins,
    time_dependent_auc, truncated_concordance,
};

/// AUC and Brier score of one model over an evaluation time grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTable {
    pub times: Vec<f64>,
    pub auc: Vec<Option<f64>>,
    pub brier: Vec<Option<f64>>,
}

/// Scores `model` on `subjects` at each of `times`.
///
/// The censoring distribution is estimated from `subjects`.
pub fn score<M>(model: &M, subjects: &[Subject], cause: Status, times: &[f64]) -> ScoreTable
where
    M: CompetingRiskModel + ?Sized,
{
    let censoring = IpcwCensoring::new(subjects);
    let predictions = model.predict_matrix(subjects, times);

    let mut auc = Vec::with_capacity(times.len());
    let mut brier = Vec::with_capacity(times.len());
    for (k, &time) in times.iter().enumerate() {
        let risks = predictions.iter().map(|row| row[k]).collect::<Vec<_>>();
        auc.push(time_dependent_auc(&risks, subjects, cause, time, &censoring));
        brier.push(brier_score(&risks, subjects, cause, time, &censoring));
    }

    ScoreTable {
        times: times.to_vec(),
        auc,
        brier,
    }
}

/// Truncated concordance of `model` on `subjects`, ranking by predicted risk
/// at `eval_time`.
pub fn concordance<M>(
    model: &M,
    subjects: &[Subject],
    eval_time: f64,
    cause: Status,
) -> Option<f64>
where
    M: CompetingRiskModel + ?Sized,
{
    let censoring = MarginalCensoring::new(subjects);
    let risks = subjects
        .iter()
        .map(|s| model.predict_cif(&s.covariates, &[eval_time])[0])
        .collect::<Vec<_>>();
    truncated_concordance(&risks, subjects, cause, eval_time, &censoring)
}

/// Quantile-binned calibration of `model` on `subjects` at `time`.
pub fn calibrate<M>(
    model: &M,
    subjects: &[Subject],
    time: f64,
    cause: Status,
    bins: usize,
) -> Vec<CalibrationBin>
where
    M: CompetingRiskModel + ?Sized,
{
    let risks = subjects
        .iter()
        .map(|s| model.predict_cif(&s.covariates, &[time])[0])
        .collect::<Vec<_>>();
    calibration_bins(&risks, subjects, cause, time, bins)
}
