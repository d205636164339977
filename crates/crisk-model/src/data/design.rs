use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Cell, DatasetError, Record};

/// Configured predictors, split by how they enter the design.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorSet {
    pub categorical: Vec<String>,
    pub continuous: Vec<String>,
}

impl PredictorSet {
    #[must_use]
    pub fn new(categorical: Vec<String>, continuous: Vec<String>) -> Self {
        Self {
            categorical,
            continuous,
        }
    }

    /// All predictor names, categorical first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .chain(&self.continuous)
            .map(String::as_str)
    }

    pub(crate) fn validate(&self) -> Result<(), DatasetError> {
        let mut seen = BTreeSet::new();
        for name in self.names() {
            if !seen.insert(name) {
                return Err(DatasetError::DuplicatePredictor {
                    name: name.to_owned(),
                });
            }
        }
        if seen.is_empty() {
            return Err(DatasetError::NoPredictors);
        }
        Ok(())
    }
}

/// How a design column is derived from its source predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// The predictor value itself.
    Continuous,
    /// `1.0` when the categorical predictor equals `level`, else `0.0`.
    Indicator { level: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignColumn {
    /// Column name, `{predictor}{level}` for indicators.
    pub name: String,
    /// Predictor the column is computed from.
    pub source: String,
    pub kind: ColumnKind,
}

/// Encoding of predictors into a numeric covariate vector.
///
/// Continuous predictors map to one column each. Categorical predictors use
/// treatment contrasts: levels are sorted, the first is the reference and each
/// remaining level gets an indicator column. Levels are taken from the whole
/// dataset, so every cross-validation split shares the same columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Design {
    columns: Vec<DesignColumn>,
}

impl Design {
    pub(crate) fn from_records(
        records: &[Record],
        predictors: &PredictorSet,
    ) -> Result<Self, DatasetError> {
        let mut columns = vec![];

        for name in &predictors.categorical {
            let mut levels = BTreeSet::new();
            for (row, record) in records.iter().enumerate() {
                let cell = lookup(record, row, name)?;
                levels.insert(cell.as_label());
            }
            if levels.len() < 2 {
                log::warn!("categorical predictor '{name}' has a single level and is dropped");
            }
            columns.extend(levels.into_iter().skip(1).map(|level| DesignColumn {
                name: format!("{name}{level}"),
                source: name.clone(),
                kind: ColumnKind::Indicator { level },
            }));
        }

        columns.extend(predictors.continuous.iter().map(|name| DesignColumn {
            name: name.clone(),
            source: name.clone(),
            kind: ColumnKind::Continuous,
        }));

        Ok(Self { columns })
    }

    /// Encodes one record; `row` is only used for error messages.
    pub(crate) fn encode(&self, record: &Record, row: usize) -> Result<Vec<f64>, DatasetError> {
        self.columns
            .iter()
            .map(|column| {
                let cell = lookup(record, row, &column.source)?;
                match &column.kind {
                    ColumnKind::Continuous => {
                        let value = cell.as_number().ok_or_else(|| DatasetError::NotNumeric {
                            row,
                            column: column.source.clone(),
                        })?;
                        if !value.is_finite() {
                            return Err(DatasetError::NonFinite {
                                row,
                                column: column.source.clone(),
                            });
                        }
                        Ok(value)
                    }
                    ColumnKind::Indicator { level } => {
                        Ok(if cell.as_label() == *level { 1.0 } else { 0.0 })
                    }
                }
            })
            .collect()
    }

    #[must_use]
    pub fn columns(&self) -> &[DesignColumn] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the design column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

pub(crate) fn lookup<'a>(
    record: &'a Record,
    row: usize,
    column: &str,
) -> Result<&'a Cell, DatasetError> {
    record.get(column).ok_or_else(|| DatasetError::MissingColumn {
        row,
        column: column.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stage: &str, age: f64) -> Record {
        Record::from([
            ("stage".to_owned(), Cell::from(stage)),
            ("age".to_owned(), Cell::from(age)),
        ])
    }

    #[test]
    fn test_treatment_contrasts() {
        let records = vec![record("II", 50.0), record("I", 61.0), record("III", 47.0)];
        let predictors = PredictorSet::new(vec!["stage".into()], vec!["age".into()]);
        let design = Design::from_records(&records, &predictors).unwrap();

        assert_eq!(
            design.names().collect::<Vec<_>>(),
            vec!["stageII", "stageIII", "age"]
        );
        assert_eq!(design.encode(&records[0], 0).unwrap(), vec![1.0, 0.0, 50.0]);
        assert_eq!(design.encode(&records[1], 1).unwrap(), vec![0.0, 0.0, 61.0]);
        assert_eq!(design.column_index("age"), Some(2));
    }

    #[test]
    fn test_missing_predictor_is_reported() {
        let records = vec![record("I", 50.0)];
        let predictors = PredictorSet::new(vec![], vec!["bmi".into()]);
        let design = Design::from_records(&records, &predictors).unwrap();
        let err = design.encode(&records[0], 0).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { row: 0, .. }));
    }

    #[test]
    fn test_duplicate_predictor() {
        let predictors = PredictorSet::new(vec!["stage".into()], vec!["stage".into()]);
        assert!(matches!(
            predictors.validate(),
            Err(DatasetError::DuplicatePredictor { .. })
        ));
    }
}
