use serde::Serialize;

use super::{
    Design, InvalidStatusError, PredictorSet, Record, STATUS_COLUMN, Status, TIME_COLUMN,
    design::lookup,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("dataset has no rows")]
    Empty,
    #[display("no predictors configured")]
    NoPredictors,
    #[display("predictor '{name}' is listed more than once")]
    DuplicatePredictor { name: String },
    #[display("row {row}: missing column '{column}'")]
    MissingColumn { row: usize, column: String },
    #[display("row {row}: column '{column}' must be numeric")]
    NotNumeric { row: usize, column: String },
    #[display("row {row}: column '{column}' must be finite")]
    NonFinite { row: usize, column: String },
    #[display("row {row}: time must be finite and non-negative, got {time}")]
    InvalidTime { row: usize, time: f64 },
    #[display("row {row}: status must be an integer code, got {value}")]
    NonIntegerStatus { row: usize, value: f64 },
    #[display("row {row}: {source}")]
    InvalidStatus {
        row: usize,
        source: InvalidStatusError,
    },
    #[display("maximum time must be positive and finite, got {max_time}")]
    InvalidMaxTime { max_time: f64 },
}

/// One subject: encoded covariates and observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub covariates: Vec<f64>,
    pub time: f64,
    pub status: Status,
}

impl Subject {
    /// Returns `true` if the subject had the `cause` event at or before `time`.
    #[must_use]
    pub fn had_cause_by(&self, cause: Status, time: f64) -> bool {
        self.time <= time && self.status.is_cause(cause)
    }
}

/// Validated, immutable competing-risks dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    design: Design,
    subjects: Vec<Subject>,
}

impl Dataset {
    /// Validates raw rows and encodes them into subjects.
    ///
    /// Every row must carry `time` (finite, non-negative), `status` (`0`, `1` or
    /// `2`) and every configured predictor. Times above `max_time` are capped
    /// to `max_time` and become censored there.
    pub fn from_records(
        records: &[Record],
        predictors: &PredictorSet,
        max_time: f64,
    ) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        if !(max_time.is_finite() && max_time > 0.0) {
            return Err(DatasetError::InvalidMaxTime { max_time });
        }
        predictors.validate()?;

        let design = Design::from_records(records, predictors)?;
        let mut capped = 0;
        let subjects = records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let (time, status) = read_outcome(record, row)?;
                let covariates = design.encode(record, row)?;
                if time > max_time {
                    capped += 1;
                    return Ok(Subject {
                        covariates,
                        time: max_time,
                        status: Status::Censored,
                    });
                }
                Ok(Subject {
                    covariates,
                    time,
                    status,
                })
            })
            .collect::<Result<Vec<_>, DatasetError>>()?;

        if capped > 0 {
            log::info!("censored {capped} subjects at the maximum time {max_time}");
        }
        log::debug!(
            "dataset: {} subjects, {} design columns",
            subjects.len(),
            design.len()
        );
        Ok(Self { design, subjects })
    }

    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Status of every subject, in row order.
    #[must_use]
    pub fn statuses(&self) -> Vec<Status> {
        self.subjects.iter().map(|s| s.status).collect()
    }

    /// Owned copies of the subjects at `indices`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Vec<Subject> {
        indices.iter().map(|&i| self.subjects[i].clone()).collect()
    }

    /// Counts of censored, event and competing subjects.
    #[must_use]
    pub fn status_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for subject in &self.subjects {
            counts[usize::from(subject.status.code())] += 1;
        }
        counts
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_outcome(record: &Record, row: usize) -> Result<(f64, Status), DatasetError> {
    let number = |column: &str| {
        lookup(record, row, column)?
            .as_number()
            .ok_or_else(|| DatasetError::NotNumeric {
                row,
                column: column.to_owned(),
            })
    };

    let time = number(TIME_COLUMN)?;
    if !(time.is_finite() && time >= 0.0) {
        return Err(DatasetError::InvalidTime { row, time });
    }

    let value = number(STATUS_COLUMN)?;
    if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
        return Err(DatasetError::NonIntegerStatus { row, value });
    }
    let status = Status::try_from(value as u8)
        .map_err(|source| DatasetError::InvalidStatus { row, source })?;

    Ok((time, status))
}
