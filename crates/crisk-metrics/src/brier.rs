use crisk_model::{Status, Subject};

use crate::IpcwCensoring;

/// IPCW Brier score of predicted cumulative incidence at `time`.
///
/// Subjects with an event of any cause by `time` are weighted `1/G(T-)`,
/// subjects still event-free at `time` are weighted `1/G(time)`, and subjects
/// censored before `time` get weight zero but still count in the denominator.
///
/// Returns `None` for an empty sample or when a needed censoring survival is
/// zero.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn brier_score(
    risks: &[f64],
    subjects: &[Subject],
    cause: Status,
    time: f64,
    censoring: &IpcwCensoring,
) -> Option<f64> {
    debug_assert_eq!(risks.len(), subjects.len());
    if subjects.is_empty() {
        return None;
    }

    let mut total = 0.0;
    for (subject, &risk) in subjects.iter().zip(risks) {
        let (weight, observed) = if subject.time > time {
            (censoring.survivor_weight(time)?, 0.0)
        } else if subject.status.is_censored() {
            continue;
        } else {
            let observed = if subject.had_cause_by(cause, time) {
                1.0
            } else {
                0.0
            };
            (censoring.event_weight(subject.time)?, observed)
        };
        total += weight * (observed - risk).powi(2);
    }
    Some(total / subjects.len() as f64)
}

/// Integrated Brier score: the average of unit-step Brier scores `1..=h`.
///
/// `path` holds the Brier scores at times `1, 2, ..., h`. The result is missing
/// if the path is empty or any score in it is missing.
///
/// ```
/// use crisk_metrics::integrated_brier;
///
/// assert_eq!(integrated_brier(&[Some(0.25), Some(0.5), Some(0.75)]), Some(0.5));
/// assert_eq!(integrated_brier(&[Some(0.1), None]), None);
/// assert_eq!(integrated_brier(&[]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn integrated_brier(path: &[Option<f64>]) -> Option<f64> {
    if path.is_empty() {
        return None;
    }
    let sum = path.iter().copied().sum::<Option<f64>>()?;
    Some(sum / path.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(time: f64, status: Status) -> Subject {
        Subject {
            covariates: vec![],
            time,
            status,
        }
    }

    #[test]
    fn test_uncensored_is_plain_brier() {
        let subjects = vec![
            subject(1.0, Status::Event),
            subject(2.0, Status::Competing),
            subject(5.0, Status::Event),
        ];
        let censoring = IpcwCensoring::new(&subjects);
        let score = brier_score(&[0.5, 0.5, 0.5], &subjects, Status::Event, 3.0, &censoring);
        assert!((score.unwrap() - 0.25).abs() < 1e-12);

        let perfect = brier_score(&[1.0, 0.0, 0.0], &subjects, Status::Event, 3.0, &censoring);
        assert_eq!(perfect, Some(0.0));
    }

    #[test]
    fn test_censored_weights() {
        let subjects = vec![
            subject(1.0, Status::Censored),
            subject(2.0, Status::Event),
            subject(4.0, Status::Event),
        ];
        let censoring = IpcwCensoring::new(&subjects);
        // G = 2/3 after t=1; the censored subject contributes zero.
        let score = brier_score(&[0.0, 0.0, 0.0], &subjects, Status::Event, 3.0, &censoring);
        assert!((score.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        let censoring = IpcwCensoring::new(&[]);
        assert_eq!(brier_score(&[], &[], Status::Event, 1.0, &censoring), None);
    }
}
