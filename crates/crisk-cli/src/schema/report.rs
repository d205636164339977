use chrono::{DateTime, Utc};
use crisk_model::FineGrayModel;
use crisk_validation::{
    CalibrationRecord, CvConfig, CvReport, RecordTables, SplitId, SummaryTables,
};
use serde::Serialize;

/// Cross-validation report written by `crisk evaluate`
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Timestamp when the report was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Effective configuration after command-line overrides
    pub config: CvConfig,
    pub dataset: DatasetSummary,
    /// Model formula, e.g. `cause 1 ~ x1 + x2`
    pub model: String,
    /// Number of splits evaluated (`folds × repeats`)
    pub splits: usize,
    /// Mean and 95% CI of each metric across splits
    pub summaries: SummaryTables,
    pub best: Option<BestSplit>,
    /// Per-split records, present only with `--include-records`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordTables>,
}

/// Row counts of the evaluated dataset after time capping
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub censored: usize,
    pub events: usize,
    pub competing: usize,
}

/// The split selected by concordance at the largest horizon
#[derive(Debug, Clone, Serialize)]
pub struct BestSplit {
    pub split: SplitId,
    /// Human-readable split name, e.g. `Fold3.Rep2`
    pub name: String,
    pub horizon: u32,
    pub concordance: Option<f64>,
    pub model: FineGrayModel,
    /// Calibration bins of the best split at every calibration horizon
    pub calibration: Vec<CalibrationRecord>,
}

impl BestSplit {
    pub fn from_report(report: &CvReport<FineGrayModel>) -> Option<Self> {
        let id = report.best_split?;
        let entry = report.registry.get(id)?;
        let concordance = report
            .records
            .concordance
            .iter()
            .find(|r| r.split == id && r.key.horizon == Some(report.max_horizon))
            .and_then(|r| r.value);
        Some(Self {
            split: id,
            name: entry.split.name(),
            horizon: report.max_horizon,
            concordance,
            model: entry.model.clone(),
            calibration: report.best_calibration().copied().collect(),
        })
    }
}
