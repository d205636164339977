use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the observed-time column.
pub const TIME_COLUMN: &str = "time";
/// Name of the status column (`0`, `1` or `2`).
pub const STATUS_COLUMN: &str = "status";

/// One input row: column name to cell value.
pub type Record = BTreeMap<String, Cell>;

/// A single cell of the input table.
///
/// Serialized untagged, so a JSON row such as
/// `{"time": 14, "status": 1, "stage": "II"}` deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Category label of the cell; numeric codes are formatted without a
    /// trailing `.0`.
    #[must_use]
    pub fn as_label(&self) -> String {
        match self {
            Self::Number(v) => format!("{v}"),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_row() {
        let row: Record =
            serde_json::from_str(r#"{"time": 14, "status": 1, "stage": "II"}"#).unwrap();
        assert_eq!(row[TIME_COLUMN], Cell::Number(14.0));
        assert_eq!(row["stage"].as_label(), "II");
        assert_eq!(row[STATUS_COLUMN].as_label(), "1");
        assert_eq!(row["stage"].as_number(), None);
    }
}
