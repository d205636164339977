//! Cross-validation command
//!
//! Loads a dataset and a configuration, cross-validates a Fine-Gray model,
//! prints the summary tables and optionally saves a JSON report.

mod table;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use crisk_model::{Dataset, FineGrayFitter, FineGrayModel};
use crisk_validation::{CrossValidator, CvConfig, CvReport, Metric};

use crate::{
    schema::report::{BestSplit, DatasetSummary, EvaluationReport},
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct EvaluateArg {
    /// Path to the dataset JSON file (array of row objects)
    pub dataset: PathBuf,

    /// Configuration JSON file; missing fields take their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Random seed for fold assignment
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Number of repeats
    #[arg(long)]
    pub repeats: Option<usize>,

    /// Categorical predictor columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub categorical: Option<Vec<String>>,

    /// Continuous predictor columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub continuous: Option<Vec<String>>,

    /// Evaluation horizons (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub horizons: Option<Vec<u32>>,

    /// Number of calibration bins
    #[arg(long)]
    pub calibration_bins: Option<usize>,

    /// Calibration horizons (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub calibration_horizons: Option<Vec<u32>>,

    /// Observed times above this are censored
    #[arg(long)]
    pub max_time: Option<f64>,

    /// Status code of the cause of interest
    #[arg(long)]
    pub cause: Option<u8>,

    /// Run splits on worker threads
    #[arg(long)]
    pub parallel: bool,

    /// Maximum Newton-Raphson iterations per fit
    #[arg(long, default_value_t = FineGrayFitter::default().max_iter)]
    pub max_iter: usize,

    /// Output path for the JSON report
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Include per-split records in the report
    #[arg(long)]
    pub include_records: bool,
}

impl EvaluateArg {
    fn resolve_config(&self) -> anyhow::Result<CvConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("configuration", path)?,
            None => CvConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(folds) = self.folds {
            config.folds = folds;
        }
        if let Some(repeats) = self.repeats {
            config.repeats = repeats;
        }
        if let Some(categorical) = &self.categorical {
            config.categorical.clone_from(categorical);
        }
        if let Some(continuous) = &self.continuous {
            config.continuous.clone_from(continuous);
        }
        if let Some(horizons) = &self.horizons {
            config.horizons.clone_from(horizons);
        }
        if let Some(bins) = self.calibration_bins {
            config.calibration_bins = bins;
        }
        if let Some(horizons) = &self.calibration_horizons {
            config.calibration_horizons.clone_from(horizons);
        }
        if let Some(max_time) = self.max_time {
            config.max_time = max_time;
        }
        if let Some(cause) = self.cause {
            config.cause = cause;
        }
        config.parallel |= self.parallel;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let config = arg.resolve_config()?;
    let records = util::read_dataset_file(&arg.dataset)?;
    let dataset = Dataset::from_records(&records, &config.predictors(), config.max_time)
        .with_context(|| format!("Invalid dataset: {}", arg.dataset.display()))?;

    let fitter = FineGrayFitter {
        max_iter: arg.max_iter,
        ..FineGrayFitter::default()
    };
    let report = CrossValidator::new(fitter, config.clone())
        .run(&dataset)
        .context("Cross-validation failed")?;

    let [censored, events, competing] = dataset.status_counts();
    let dataset_summary = DatasetSummary {
        rows: dataset.len(),
        censored,
        events,
        competing,
    };
    print_report(&config, &dataset_summary, &report);

    if let Some(path) = &arg.output {
        let evaluation = EvaluationReport {
            generated_at: Utc::now(),
            config,
            dataset: dataset_summary,
            model: report.spec.to_string(),
            splits: report.plan.splits().len(),
            summaries: report.summaries.clone(),
            best: BestSplit::from_report(&report),
            records: arg.include_records.then(|| report.records.clone()),
        };
        Output::save_json(&evaluation, Some(path.clone()))?;
    }

    Ok(())
}

fn print_report(config: &CvConfig, dataset: &DatasetSummary, report: &CvReport<FineGrayModel>) {
    println!("Cross-Validation Report");
    println!("==========================================\n");
    println!("Model:    {}", report.spec);
    println!(
        "Dataset:  {} rows ({} censored, {} events, {} competing)",
        dataset.rows, dataset.censored, dataset.events, dataset.competing
    );
    println!(
        "Splits:   {} folds x {} repeats (seed {})",
        report.plan.folds(),
        report.plan.repeats(),
        config.seed
    );
    println!();

    let summaries = &report.summaries;
    table::print_horizon_table("Concordance (truncated C-index)", &summaries.concordance);
    let concordance = report
        .records
        .concordance
        .iter()
        .filter(|r| r.key.horizon == Some(report.max_horizon))
        .filter_map(|r| r.value)
        .collect::<Vec<_>>();
    table::print_spread(Metric::Concordance, report.max_horizon, &concordance);
    println!();

    table::print_horizon_table("Integrated Brier score", &summaries.ibs);
    println!();
    table::print_endpoint_table("Time-dependent AUC at horizon", &summaries.auc);
    println!();
    table::print_endpoint_table("Brier score at horizon", &summaries.brier);
    println!();
    table::print_incidence_table(&summaries.incidence, &config.sorted_horizons());
    println!();
    table::print_calibration_summary(&summaries.calibration);
    println!();

    let Some(id) = report.best_split else {
        println!("No split has a concordance at horizon {}", report.max_horizon);
        return;
    };
    let Some(entry) = report.registry.get(id) else {
        return;
    };
    println!(
        "Best split: {} ({id}), concordance at {}",
        entry.split.name(),
        report.max_horizon
    );
    let model = &entry.model;
    println!(
        "  {} iterations, converged: {}, log-likelihood {:.4}",
        model.iterations(),
        model.converged(),
        model.log_likelihood()
    );
    println!("  {:<20} {:>12} {:>12}", "Predictor", "Coef", "exp(Coef)");
    for (name, beta) in model.predictors().iter().zip(model.coefficients()) {
        println!("  {name:<20} {beta:>12.4} {:>12.4}", beta.exp());
    }
    println!();
    println!("Best split calibration");
    table::print_calibration_records(report.best_calibration());
}
