//! Performance metrics for competing-risks predictions.
//!
//! Every metric scores predicted cumulative incidence of one cause against
//! observed `(time, status)` outcomes with right censoring and competing events:
//!
//! 1. **Discrimination** - [`time_dependent_auc`] and [`truncated_concordance`]
//! 2. **Overall accuracy** - [`brier_score`] and [`integrated_brier`]
//! 3. **Calibration** - [`calibration_bins`], binned predicted risk against mean
//!    pseudo-values
//!
//! Censoring is handled by inverse probability of censoring weights. AUC and
//! Brier use [`IpcwCensoring`]; concordance uses the pairwise
//! [`MarginalCensoring`].
//!
//! The model-level entry points [`score`], [`concordance`] and [`calibrate`]
//! take a fitted [`CompetingRiskModel`](crisk_model::CompetingRiskModel) and the
//! evaluation subjects.
//!
//! Undefined metrics (no cases, no controls, no comparable pairs, zero
//! censoring survival) are `None`, never zero.

pub use self::{auc::*, brier::*, calibration::*, censoring::*, concordance::*, score::*};

mod auc;
mod brier;
mod calibration;
mod censoring;
mod concordance;
mod score;
