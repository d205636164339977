//! Survival estimators for right-censored and competing-risks data.
//!
//! - [`KaplanMeierCurve`] estimates a survival function from `(time, is_censored)`
//!   pairs. Flipping the censoring flag ([`KaplanMeierCurve::censoring`]) gives the
//!   censoring distribution `G(t) = P(C > t)` used for inverse probability of
//!   censoring weighting.
//! - [`CumulativeIncidenceCurve`] is the Aalen-Johansen estimator of the
//!   cumulative incidence of one cause in the presence of competing causes.
//! - [`pseudo_values`] computes jackknife pseudo-observations of the cumulative
//!   incidence at a fixed time.
//!
//! Event codes follow the usual convention: `0` is censored, any positive code
//! is a cause.

/// Kaplan-Meier survival curve for survival analysis.
///
/// The curve stores parallel vectors representing the survival function at discrete time points:
/// - Time points where events occurred
/// - Survival probability at each time point
/// - Number of subjects at risk at each time point
/// - Number of events (non-censored observations) at each time point
#[derive(Debug, Clone)]
pub struct KaplanMeierCurve {
    /// Time points where events (non-censored observations) occurred.
    pub times: Vec<f64>,
    /// Survival probability just after each corresponding time point.
    pub survival_prob: Vec<f64>,
    /// Number of subjects at risk at each time point.
    pub at_risk: Vec<usize>,
    /// Number of events (non-censored observations) that occurred at each time point.
    pub events: Vec<usize>,
}

impl KaplanMeierCurve {
    /// Computes the Kaplan-Meier survival curve from survival data.
    ///
    /// # Arguments
    ///
    /// * `data` - `(time, is_censored)` pairs
    ///
    /// # Examples
    ///
    /// ```
    /// # use crisk_stats::survival::KaplanMeierCurve;
    /// let data = vec![(10.0, false), (20.0, true), (30.0, false)];
    /// let curve = KaplanMeierCurve::from_data(data);
    /// assert_eq!(curve.times, vec![10.0, 30.0]);
    /// assert_eq!(curve.survival_at(30.0), 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_data<I>(data: I) -> Self
    where
        I: IntoIterator<Item = (f64, bool)>,
    {
        let mut data = data.into_iter().collect::<Vec<_>>();
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times = vec![];
        let mut survival_prob = vec![];
        let mut at_risk_vec = vec![];
        let mut events_vec = vec![];

        let mut current_survival = 1.0;
        let total = data.len();

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].0;
            let at_risk = total - i;

            let mut event_count = 0;
            let mut j = i;
            while j < data.len() && data[j].0 == current_time {
                if !data[j].1 {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                current_survival *= 1.0 - (event_count as f64 / at_risk as f64);
                times.push(current_time);
                survival_prob.push(current_survival);
                at_risk_vec.push(at_risk);
                events_vec.push(event_count);
            }

            i = j;
        }

        Self {
            times,
            survival_prob,
            at_risk: at_risk_vec,
            events: events_vec,
        }
    }

    /// Estimates the censoring distribution `G(t) = P(C > t)`.
    ///
    /// Censored observations are the "events" of this curve and every observed
    /// event is treated as censoring.
    ///
    /// ```
    /// # use crisk_stats::survival::KaplanMeierCurve;
    /// let censoring = KaplanMeierCurve::censoring([(1.0, false), (2.0, true), (3.0, false)]);
    /// assert_eq!(censoring.survival_at(1.5), 1.0);
    /// assert_eq!(censoring.survival_at(2.0), 0.5);
    /// ```
    #[must_use]
    pub fn censoring<I>(data: I) -> Self
    where
        I: IntoIterator<Item = (f64, bool)>,
    {
        Self::from_data(
            data.into_iter()
                .map(|(time, is_censored)| (time, !is_censored)),
        )
    }

    /// Returns the survival probability at `time`, including events at `time`.
    ///
    /// The curve is a right-continuous step function: `1.0` before the first
    /// event and the last value after the last event.
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|t| *t <= time);
        if idx == 0 {
            1.0
        } else {
            self.survival_prob[idx - 1]
        }
    }

    /// Returns the left limit `S(time-)`, excluding events at `time`.
    #[must_use]
    pub fn survival_before(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|t| *t < time);
        if idx == 0 {
            1.0
        } else {
            self.survival_prob[idx - 1]
        }
    }
}

/// Aalen-Johansen cumulative incidence curve for one cause.
#[derive(Debug, Clone)]
pub struct CumulativeIncidenceCurve {
    /// Event times of the target cause.
    pub times: Vec<f64>,
    /// Cumulative incidence just after each corresponding time point.
    pub incidence: Vec<f64>,
}

impl CumulativeIncidenceCurve {
    /// Computes the cumulative incidence of `cause` from `(time, event code)` pairs.
    ///
    /// ```
    /// # use crisk_stats::survival::CumulativeIncidenceCurve;
    /// // one event of cause 1, one competing event, one censored
    /// let curve = CumulativeIncidenceCurve::from_data([(1.0, 1), (2.0, 2), (3.0, 0)], 1);
    /// assert!((curve.incidence_at(5.0) - 1.0 / 3.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_data<I>(data: I, cause: u8) -> Self
    where
        I: IntoIterator<Item = (f64, u8)>,
    {
        let mut data = data.into_iter().collect::<Vec<_>>();
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times = vec![];
        let mut incidence = vec![];
        walk_incidence(&data, None, cause, |time, cif, has_target| {
            if has_target {
                times.push(time);
                incidence.push(cif);
            }
            true
        });
        Self { times, incidence }
    }

    /// Returns the cumulative incidence at `time` (right-continuous).
    #[must_use]
    pub fn incidence_at(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|t| *t <= time);
        if idx == 0 {
            0.0
        } else {
            self.incidence[idx - 1]
        }
    }
}

/// Walks the Aalen-Johansen recursion over time-sorted data.
///
/// `visit` receives `(time, cumulative incidence after time, target event at
/// time)` for every distinct time and stops the walk by returning `false`.
/// The observation at index `skip` is left out.
#[expect(clippy::cast_precision_loss)]
fn walk_incidence<F>(sorted: &[(f64, u8)], skip: Option<usize>, cause: u8, mut visit: F)
where
    F: FnMut(f64, f64, bool) -> bool,
{
    let mut at_risk = sorted.len() - usize::from(skip.is_some());
    let mut survival = 1.0;
    let mut cif = 0.0;

    let mut i = 0;
    while i < sorted.len() {
        let time = sorted[i].0;
        let mut target = 0;
        let mut any = 0;
        let mut removed = 0;
        let mut j = i;
        while j < sorted.len() && sorted[j].0 == time {
            if Some(j) != skip {
                removed += 1;
                if sorted[j].1 == cause {
                    target += 1;
                }
                if sorted[j].1 != 0 {
                    any += 1;
                }
            }
            j += 1;
        }

        if at_risk > 0 && any > 0 {
            let n = at_risk as f64;
            cif += survival * target as f64 / n;
            survival *= 1.0 - any as f64 / n;
        }
        at_risk -= removed;

        if removed > 0 && !visit(time, cif, target > 0) {
            return;
        }
        i = j;
    }
}

fn incidence_at_sorted(sorted: &[(f64, u8)], skip: Option<usize>, cause: u8, time: f64) -> f64 {
    let mut value = 0.0;
    walk_incidence(sorted, skip, cause, |t, cif, _| {
        if t > time {
            return false;
        }
        value = cif;
        true
    });
    value
}

/// Jackknife pseudo-values of the cumulative incidence of `cause` at `time`.
///
/// For observation `i`: `n · F(time) - (n - 1) · F₋ᵢ(time)`, where `F₋ᵢ` is the
/// Aalen-Johansen estimate without observation `i`. The mean of the
/// pseudo-values equals `F(time)` up to rounding; individual values may fall
/// outside `[0, 1]`. The output is in input order.
///
/// ```
/// # use crisk_stats::survival::pseudo_values;
/// let data = [(1.0, 1), (2.0, 2), (3.0, 1), (4.0, 0)];
/// let pv = pseudo_values(&data, 1, 2.5);
/// // without censoring before 2.5 the pseudo-values are the event indicators
/// assert!((pv[0] - 1.0).abs() < 1e-12);
/// assert!(pv[1].abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pseudo_values(data: &[(f64, u8)], cause: u8, time: f64) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return vec![];
    }

    let mut order = (0..n).collect::<Vec<_>>();
    order.sort_by(|&a, &b| data[a].0.total_cmp(&data[b].0));
    let sorted = order.iter().map(|&i| data[i]).collect::<Vec<_>>();

    let full =
        CumulativeIncidenceCurve::from_data(sorted.iter().copied(), cause).incidence_at(time);
    let mut values = vec![0.0; n];
    for (position, &original) in order.iter().enumerate() {
        let without = if n == 1 {
            0.0
        } else {
            incidence_at_sorted(&sorted, Some(position), cause, time)
        };
        values[original] = n as f64 * full - (n - 1) as f64 * without;
    }
    values
}
