//! Competing-risks input data.
//!
//! Raw rows arrive as [`Record`]s (column name → [`Cell`]) from whatever loader
//! the caller uses. [`Dataset::from_records`] validates them against the
//! configured [`PredictorSet`], builds the shared [`Design`] and produces the
//! immutable list of [`Subject`]s the cross-validation loop works on.
//!
//! ```text
//! Vec<Record> ──(PredictorSet, max_time)──▶ Dataset
//!                                           ├─ design: Design (encoded columns)
//!                                           └─ subjects: Vec<Subject>
//!                                               ├─ covariates: Vec<f64>
//!                                               ├─ time: f64 (capped)
//!                                               └─ status: Status
//! ```

pub use self::{dataset::*, design::*, record::*, status::*};

mod dataset;
mod design;
mod record;
mod status;
