//! Competing-risks data model and Fine-Gray regression.
//!
//! This crate holds everything the cross-validation loop treats as a
//! collaborator:
//!
//! - [`data`] - Subject status codes, raw input records, design encoding and the
//!   validated [`Dataset`]
//! - [`regression`] - The [`CompetingRiskModel`] / [`ModelFitter`] seam and the
//!   Fine-Gray subdistribution hazard implementation
//! - [`simulate`] - Seeded synthetic competing-risks data
//!
//! # Example
//!
//! ```
//! use crisk_model::{
//!     CompetingRiskModel as _, Dataset, FineGrayFitter, ModelFitter as _, ModelSpec,
//!     PredictorSet, Status,
//!     simulate::{SimulationParams, simulate_records},
//! };
//!
//! let records = simulate_records(&SimulationParams::default(), 7).unwrap();
//! let predictors = PredictorSet::new(vec!["group".into()], vec!["x1".into(), "x2".into()]);
//! let dataset = Dataset::from_records(&records, &predictors, 120.0).unwrap();
//!
//! let spec = ModelSpec::all_columns(dataset.design(), Status::Event);
//! let model = FineGrayFitter::default().fit(&spec, dataset.subjects()).unwrap();
//! let cif = model.predict_cif(&dataset.subjects()[0].covariates, &[12.0, 60.0]);
//! assert!(cif[0] <= cif[1]);
//! ```

pub use self::{data::*, regression::*};

pub mod data;
pub mod regression;
pub mod simulate;
