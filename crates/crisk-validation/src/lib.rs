//! Repeated stratified k-fold cross-validation of competing-risks models.
//!
//! This crate drives the evaluation loop: it partitions a dataset into folds
//! stratified by status, fits one model per split, scores each model on its
//! held-out fold and summarizes every metric across splits.
//!
//! # How a Run Works
//!
//! 1. **Plan** - [`FoldPlan::stratified`] builds `folds × repeats` splits
//! 2. **Train** - [`ModelTrainer`] fits a model on each split's training rows
//! 3. **Score** - [`RiskEvaluator`] and [`CalibrationEvaluator`] evaluate it on
//!    the held-out rows
//! 4. **Summarize** - [`summarize_metrics`] and [`summarize_calibration`]
//!    compute the mean and 95% confidence interval per key
//! 5. **Select** - [`select_best_split`] picks the split with the highest
//!    concordance at the largest horizon
//!
//! ```text
//! Dataset
//!     ↓ stratified by status
//! FoldPlan (split #1 .. #k·r)
//!     ↓ per split
//! ModelTrainer → RiskEvaluator / CalibrationEvaluator
//!     ↓ collected
//! RecordTables + ModelRegistry
//!     ↓ summarized
//! CvReport
//! ```
//!
//! [`CrossValidator`] ties these steps together. Splits run sequentially or,
//! with [`CvConfig::parallel`], on scoped worker threads; results are ordered
//! by split id either way, so both modes produce identical reports.
//!
//! # Example
//!
//! ```
//! use crisk_model::{Dataset, FineGrayFitter, simulate};
//! use crisk_validation::{CrossValidator, CvConfig};
//!
//! let config = CvConfig {
//!     folds: 3,
//!     repeats: 1,
//!     categorical: vec!["group".into()],
//!     continuous: vec!["x1".into(), "x2".into()],
//!     horizons: vec![30],
//!     calibration_horizons: vec![30],
//!     calibration_bins: 3,
//!     max_time: 120.0,
//!     ..CvConfig::default()
//! };
//! let records = simulate::simulate_records(&simulate::SimulationParams::default(), 1).unwrap();
//! let dataset = Dataset::from_records(&records, &config.predictors(), config.max_time).unwrap();
//!
//! let report = CrossValidator::new(FineGrayFitter::default(), config)
//!     .run(&dataset)
//!     .unwrap();
//! assert_eq!(report.registry.len(), 3);
//! assert!(report.best_model().is_some());
//! ```

pub use self::{
    aggregate::*, calibration::*, config::*, folds::*, orchestrator::*, records::*, risk::*,
    trainer::*,
};

mod aggregate;
mod calibration;
mod config;
mod folds;
mod orchestrator;
mod records;
mod risk;
mod trainer;
