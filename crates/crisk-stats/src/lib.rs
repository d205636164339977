//! Statistical building blocks for competing-risks model evaluation.
//!
//! This crate provides the estimators shared by the model, metric and
//! validation crates:
//!
//! - **Descriptive statistics**: Calculate mean, median, variance, standard deviation, etc.
//! - **Mean with confidence interval**: Normal-approximation interval over samples that may
//!   contain missing values
//! - **Quantile binning**: Equal-frequency bins with tie collapsing
//! - **Survival analysis**: Kaplan-Meier and Aalen-Johansen estimators for censored,
//!   competing-risks data, plus jackknife pseudo-values
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics and [`MeanCi`](descriptive::MeanCi)
//! - [`binning`]: Quantile cut points and bin assignment
//! - [`survival`]: Kaplan-Meier and cumulative incidence curves
//!
//! # Examples
//!
//! ## Computing a mean with a 95% confidence interval
//!
//! ```
//! use crisk_stats::descriptive::MeanCi;
//!
//! let summary = MeanCi::from_samples([Some(0.70), None, Some(0.74), Some(0.72)]);
//! assert_eq!(summary.n, 3);
//! assert!(summary.lower.unwrap() < summary.mean.unwrap());
//! ```
//!
//! ## Analyzing survival data
//!
//! ```
//! use crisk_stats::survival::KaplanMeierCurve;
//!
//! // Data: (time, is_censored)
//! let data = vec![
//!     (10.0, false), // Event occurred at time 10
//!     (20.0, true),  // Censored at time 20
//!     (30.0, false), // Event occurred at time 30
//! ];
//! let curve = KaplanMeierCurve::from_data(data);
//! assert!((curve.survival_at(15.0) - 2.0 / 3.0).abs() < 1e-12);
//! ```

pub mod binning;
pub mod descriptive;
pub mod survival;
