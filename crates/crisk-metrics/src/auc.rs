use crisk_model::{Status, Subject};

use crate::IpcwCensoring;

/// Time-dependent AUC for one cause at `time`, with IPCW censoring correction.
///
/// Cases failed from `cause` by `time` and carry weight `1/G(T-)`. Controls are
/// either still event-free at `time` (weight `1/G(time)`) or had a competing
/// event by `time` (weight `1/G(T-)`). A case/control pair is concordant when
/// the case has the higher predicted risk; ties count one half.
///
/// Returns `None` without cases, without controls, or when a needed censoring
/// survival is zero.
///
/// ```
/// use crisk_metrics::{IpcwCensoring, time_dependent_auc};
/// use crisk_model::{Status, Subject};
///
/// let subjects = [(1.0, Status::Event), (2.0, Status::Competing), (5.0, Status::Censored)]
///     .map(|(time, status)| Subject { covariates: vec![], time, status });
/// let censoring = IpcwCensoring::new(&subjects);
/// let auc = time_dependent_auc(&[0.9, 0.2, 0.1], &subjects, Status::Event, 3.0, &censoring);
/// assert_eq!(auc, Some(1.0));
/// ```
#[must_use]
pub fn time_dependent_auc(
    risks: &[f64],
    subjects: &[Subject],
    cause: Status,
    time: f64,
    censoring: &IpcwCensoring,
) -> Option<f64> {
    debug_assert_eq!(risks.len(), subjects.len());

    let mut cases = vec![];
    let mut controls = vec![];
    for (subject, &risk) in subjects.iter().zip(risks) {
        if subject.time > time {
            controls.push((risk, censoring.survivor_weight(time)?));
        } else if subject.status.is_cause(cause) {
            cases.push((risk, censoring.event_weight(subject.time)?));
        } else if subject.status.is_competing(cause) {
            controls.push((risk, censoring.event_weight(subject.time)?));
        }
    }
    if cases.is_empty() || controls.is_empty() {
        return None;
    }

    let mut concordant = 0.0;
    for &(case_risk, case_weight) in &cases {
        for &(control_risk, control_weight) in &controls {
            let score = if case_risk > control_risk {
                1.0
            } else if case_risk == control_risk {
                0.5
            } else {
                0.0
            };
            concordant += case_weight * control_weight * score;
        }
    }
    let case_total = cases.iter().map(|c| c.1).sum::<f64>();
    let control_total = controls.iter().map(|c| c.1).sum::<f64>();
    Some(concordant / (case_total * control_total))
}
