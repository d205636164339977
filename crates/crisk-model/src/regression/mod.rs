//! Competing-risks regression.
//!
//! [`ModelFitter`] turns a [`ModelSpec`] and a training sample into a fitted
//! [`CompetingRiskModel`], which predicts the cumulative incidence of the cause
//! of interest for a covariate vector. [`FineGrayFitter`] is the proportional
//! subdistribution hazards implementation used by the command line tool.

pub use self::{fine_gray::*, model::*};

mod fine_gray;
mod linalg;
mod model;
