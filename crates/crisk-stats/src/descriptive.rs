use serde::Serialize;

/// Two-sided 95% standard normal quantile.
pub const Z_95: f64 = 1.959_964;

/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency, dispersion,
/// and spread for a dataset of `f64` values.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use crisk_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let mid = sorted_values.len() / 2;
        let median = if sorted_values.len() % 2 == 0 {
            f64::midpoint(sorted_values[mid - 1], sorted_values[mid])
        } else {
            sorted_values[mid]
        };
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
        })
    }
}

/// Mean of a sample with a normal-approximation 95% confidence interval.
///
/// Missing samples (`None` or non-finite) are excluded from `n` and from every
/// moment. With no remaining samples every field is `None`; with one sample
/// only the mean is set. From two samples on, the bounds are
/// `mean ± 1.959964 · sd / √n` with the sample (`n - 1`) standard deviation.
///
/// # Examples
///
/// ```
/// # use crisk_stats::descriptive::MeanCi;
/// let single = MeanCi::from_samples([Some(0.8)]);
/// assert_eq!(single.mean, Some(0.8));
/// assert_eq!(single.lower, None);
///
/// let empty = MeanCi::from_samples([None, None]);
/// assert_eq!(empty.n, 0);
/// assert_eq!(empty.mean, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanCi {
    /// Number of non-missing samples.
    pub n: usize,
    pub mean: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl MeanCi {
    /// Summarizes samples, skipping missing entries.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let values = samples
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: None,
                lower: None,
                upper: None,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        if n == 1 {
            return Self {
                n,
                mean: Some(mean),
                lower: None,
                upper: None,
            };
        }

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let half_width = Z_95 * variance.sqrt() / (n as f64).sqrt();
        Self {
            n,
            mean: Some(mean),
            lower: Some(mean - half_width),
            upper: Some(mean + half_width),
        }
    }

    /// Summarizes a fully observed sample.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::from_samples(values.into_iter().map(Some))
    }
}
