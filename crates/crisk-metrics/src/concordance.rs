use crisk_model::{Status, Subject};

use crate::MarginalCensoring;

/// Truncated concordance index for one cause, up to `horizon`.
///
/// Every subject `i` failing from `cause` by `horizon` is compared with
///
/// - each subject observed longer (`T_i < T_j`), weighted `1/(G(Ti-) G(Ti))`,
/// - each subject with a competing event at or before `T_i`, weighted
///   `1/(G(Ti-) G(Tj-))`.
///
/// A pair is concordant when `i` has the higher risk; tied risks count one half.
/// Returns `None` when there are no comparable pairs.
///
/// ```
/// use crisk_metrics::{MarginalCensoring, truncated_concordance};
/// use crisk_model::{Status, Subject};
///
/// let subjects = [(1.0, Status::Event), (3.0, Status::Event), (4.0, Status::Censored)]
///     .map(|(time, status)| Subject { covariates: vec![], time, status });
/// let censoring = MarginalCensoring::new(&subjects);
/// let c = truncated_concordance(&[0.8, 0.5, 0.1], &subjects, Status::Event, 5.0, &censoring);
/// assert_eq!(c, Some(1.0));
/// ```
#[must_use]
pub fn truncated_concordance(
    risks: &[f64],
    subjects: &[Subject],
    cause: Status,
    horizon: f64,
    censoring: &MarginalCensoring,
) -> Option<f64> {
    debug_assert_eq!(risks.len(), subjects.len());

    let mut concordant = 0.0;
    let mut comparable = 0.0;
    for (i, case) in subjects.iter().enumerate() {
        if !(case.time <= horizon && case.status.is_cause(cause)) {
            continue;
        }
        for (j, other) in subjects.iter().enumerate() {
            if i == j {
                continue;
            }
            let weight = if case.time < other.time {
                censoring.ordered_pair_weight(case.time)
            } else if other.status.is_competing(cause) {
                censoring.competing_pair_weight(case.time, other.time)
            } else {
                continue;
            };
            let Some(weight) = weight else {
                continue;
            };

            comparable += weight;
            if risks[i] > risks[j] {
                concordant += weight;
            } else if risks[i] == risks[j] {
                concordant += 0.5 * weight;
            }
        }
    }

    (comparable > 0.0).then(|| concordant / comparable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects(data: &[(f64, Status)]) -> Vec<Subject> {
        data.iter()
            .map(|&(time, status)| Subject {
                covariates: vec![],
                time,
                status,
            })
            .collect()
    }

    #[test]
    fn test_known_ranking() {
        let subjects = subjects(&[
            (1.0, Status::Event),
            (2.0, Status::Competing),
            (3.0, Status::Event),
            (4.0, Status::Censored),
            (6.0, Status::Event),
            (7.0, Status::Censored),
        ]);
        let censoring = MarginalCensoring::new(&subjects);
        // risk decreasing in event time ranks every comparable pair correctly
        let true_ranking = [0.9, 0.15, 0.7, 0.4, 0.2, 0.1];
        let c = truncated_concordance(&true_ranking, &subjects, Status::Event, 10.0, &censoring);
        assert_eq!(c, Some(1.0));

        let reversed = true_ranking.map(|r| 1.0 - r);
        let c = truncated_concordance(&reversed, &subjects, Status::Event, 10.0, &censoring);
        assert_eq!(c, Some(0.0));
    }

    #[test]
    fn test_truncation_and_competing_pairs() {
        let subjects = subjects(&[
            (1.0, Status::Competing),
            (2.0, Status::Event),
            (5.0, Status::Event),
        ]);
        let censoring = MarginalCensoring::new(&subjects);
        // only the event at 2 is a case by the horizon; it is compared with the
        // competing subject (earlier) and the later event
        let c = truncated_concordance(&[0.1, 0.5, 0.9], &subjects, Status::Event, 3.0, &censoring);
        assert_eq!(c, Some(0.5));
    }

    #[test]
    fn test_ties_and_missing() {
        let data = subjects(&[(1.0, Status::Event), (2.0, Status::Censored)]);
        let censoring = MarginalCensoring::new(&data);
        let c = truncated_concordance(&[0.3, 0.3], &data, Status::Event, 5.0, &censoring);
        assert_eq!(c, Some(0.5));

        let none = subjects(&[(1.0, Status::Censored), (2.0, Status::Competing)]);
        let censoring = MarginalCensoring::new(&none);
        assert_eq!(
            truncated_concordance(&[0.3, 0.4], &none, Status::Event, 5.0, &censoring),
            None
        );
    }
}
