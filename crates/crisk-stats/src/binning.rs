//! Quantile binning for calibration analysis
//!
//! Values are grouped into equal-frequency bins whose edges are sample
//! quantiles. Unlike equal-width bins this keeps the number of subjects per bin
//! stable for skewed risk distributions.
//!
//! # Algorithm
//!
//! 1. Sort the values
//! 2. Compute the quantiles at `0, 1/q, 2/q, ..., 1` (linear interpolation
//!    between order statistics)
//! 3. Drop duplicate edges; tied values may therefore collapse bins and fewer
//!    than `q` bins can come out
//! 4. Assign each value to the bin `(edge[b], edge[b + 1]]`, with the first bin
//!    also closed on the left
//!
//! # Examples
//!
//! ```
//! use crisk_stats::binning::QuantileBins;
//!
//! let values = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
//! let bins = QuantileBins::new(&values, 4);
//! assert_eq!(bins.len(), 4);
//! assert_eq!(bins.assign(0.1), 0);
//! assert_eq!(bins.assign(0.8), 3);
//! ```

/// Equal-frequency bin edges derived from sample quantiles.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileBins {
    edges: Vec<f64>,
}

impl QuantileBins {
    /// Computes the bin edges for `bins` quantile bins.
    ///
    /// Non-finite values are ignored. An empty input or `bins == 0` yields no
    /// edges and [`Self::len`] is 0.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(values: &[f64], bins: usize) -> Self {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if sorted.is_empty() || bins == 0 {
            return Self { edges: vec![] };
        }
        sorted.sort_by(f64::total_cmp);

        let mut edges = (0..=bins)
            .map(|b| quantile_sorted(&sorted, b as f64 / bins as f64))
            .collect::<Vec<_>>();
        edges.dedup();
        Self { edges }
    }

    /// Number of bins (at least 1 for non-empty input).
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1).max(usize::from(!self.edges.is_empty()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the zero-based bin index of `value`.
    ///
    /// Values outside the edge range are clamped into the first or last bin.
    #[must_use]
    pub fn assign(&self, value: f64) -> usize {
        if self.edges.len() < 2 {
            return 0;
        }
        let upper_edges = &self.edges[1..];
        upper_edges
            .partition_point(|edge| *edge < value)
            .min(upper_edges.len() - 1)
    }
}

/// Quantile of sorted data with linear interpolation between order statistics.
///
/// `p` is a probability in `[0, 1]`; the result for `p = 0` is the minimum and
/// for `p = 1` the maximum. Returns `NaN` for empty input.
///
/// ```
/// use crisk_stats::binning::quantile_sorted;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile_sorted(&values, 0.5), 2.5);
/// assert_eq!(quantile_sorted(&values, 1.0), 4.0);
/// ```
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn quantile_sorted(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let h = (sorted_values.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - h.floor();
    sorted_values[lo] + frac * (sorted_values[hi] - sorted_values[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        let bins = QuantileBins::new(&[], 10);
        assert!(bins.is_empty());
        assert_eq!(bins.len(), 0);
    }

    #[test]
    fn test_equal_frequency() {
        let values = (1..=100).map(f64::from).collect::<Vec<_>>();
        let bins = QuantileBins::new(&values, 10);
        assert_eq!(bins.len(), 10);

        let mut counts = [0; 10];
        for v in &values {
            counts[bins.assign(*v)] += 1;
        }
        assert_eq!(counts, [10; 10]);
    }

    #[test]
    fn test_ties_collapse_bins() {
        let mut values = vec![0.1; 60];
        values.extend([0.2, 0.3, 0.4, 0.5]);
        let bins = QuantileBins::new(&values, 10);
        assert!(bins.len() < 10);
        // every tied value lands in the first bin
        assert_eq!(bins.assign(0.1), 0);
    }

    #[test]
    fn test_all_same_value() {
        let bins = QuantileBins::new(&[0.3; 20], 10);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins.assign(0.3), 0);
    }

    #[test]
    fn test_assignment_is_monotone() {
        let values = [0.05, 0.5, 0.12, 0.33, 0.9, 0.71, 0.2, 0.41];
        let bins = QuantileBins::new(&values, 3);
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let assigned = sorted.iter().map(|v| bins.assign(*v)).collect::<Vec<_>>();
        assert!(assigned.is_sorted());
        assert_eq!(assigned.first(), Some(&0));
        assert_eq!(assigned.last(), Some(&(bins.len() - 1)));
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(quantile_sorted(&values, 0.0), 10.0);
        assert_eq!(quantile_sorted(&values, 0.25), 15.0);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }
}
