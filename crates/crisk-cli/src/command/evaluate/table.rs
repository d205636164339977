//! Summary table display
//!
//! Prints cross-split summaries in a fixed-width layout, one row per key.

use crisk_stats::descriptive::{DescriptiveStats, MeanCi};
use crisk_validation::{CalibrationRecord, CalibrationSummary, Metric, SummaryRecord};

const WIDTH: usize = 60;

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or("N/A".to_owned(), |v| format!("{v:.4}"))
}

fn print_header(label_col: &str) {
    println!(
        "  {:<16} {:>6} {:>10} {:>10} {:>10}",
        label_col, "N", "Mean", "Lower", "Upper"
    );
    println!("  {}", "-".repeat(WIDTH));
}

fn print_row(label: &str, summary: &MeanCi) {
    println!(
        "  {:<16} {:>6} {:>10} {:>10} {:>10}",
        label,
        summary.n,
        fmt_opt(summary.mean),
        fmt_opt(summary.lower),
        fmt_opt(summary.upper),
    );
}

/// Print per-horizon summaries (concordance, integrated Brier score)
pub(super) fn print_horizon_table(title: &str, rows: &[SummaryRecord]) {
    println!("{title}");
    print_header("Horizon");
    for row in rows {
        let label = row.key.horizon.map_or("-".to_owned(), |h| h.to_string());
        print_row(&label, &row.summary);
    }
}

/// Print AUC or Brier summaries at each horizon's end point
pub(super) fn print_endpoint_table(title: &str, rows: &[SummaryRecord]) {
    println!("{title}");
    print_header("Horizon");
    for row in rows.iter().filter(|r| r.key.time == r.key.horizon) {
        let label = row.key.horizon.map_or("-".to_owned(), |h| h.to_string());
        print_row(&label, &row.summary);
    }
}

/// Print mean predicted incidence at the given times
pub(super) fn print_incidence_table(rows: &[SummaryRecord], times: &[u32]) {
    println!("Mean predicted cumulative incidence");
    print_header("Time");
    for row in rows {
        if let Some(time) = row.key.time.filter(|t| times.contains(t)) {
            print_row(&time.to_string(), &row.summary);
        }
    }
}

/// Print the spread of per-split values of one metric
pub(super) fn print_spread(metric: Metric, horizon: u32, values: &[f64]) {
    match DescriptiveStats::new(values.iter().copied()) {
        Some(stats) => println!(
            "  {metric} at {horizon} across {} splits: min {:.4}, median {:.4}, max {:.4}, sd {:.4}",
            values.len(),
            stats.min,
            stats.median,
            stats.max,
            stats.std_dev,
        ),
        None => println!("  {metric} at {horizon}: no values"),
    }
}

/// Print pooled calibration per `(horizon, bin)`
pub(super) fn print_calibration_summary(rows: &[CalibrationSummary]) {
    println!("Calibration across splits");
    println!(
        "  {:<8} {:>4} {:>6} {:>10} {:>10} {:>10}",
        "Horizon", "Bin", "N", "Predicted", "Observed", "Gap"
    );
    println!("  {}", "-".repeat(WIDTH));
    for row in rows {
        let gap = row
            .observed
            .mean
            .zip(row.predicted.mean)
            .map(|(o, p)| o - p);
        println!(
            "  {:<8} {:>4} {:>6} {:>10} {:>10} {:>10}",
            row.horizon,
            row.bin,
            row.predicted.n,
            fmt_opt(row.predicted.mean),
            fmt_opt(row.observed.mean),
            fmt_opt(gap),
        );
    }
}

/// Print the best split's calibration bins
pub(super) fn print_calibration_records<'a, I>(records: I)
where
    I: IntoIterator<Item = &'a CalibrationRecord>,
{
    println!(
        "  {:<8} {:>4} {:>6} {:>10} {:>10}",
        "Horizon", "Bin", "Count", "Predicted", "Observed"
    );
    println!("  {}", "-".repeat(WIDTH));
    for record in records {
        println!(
            "  {:<8} {:>4} {:>6} {:>10.4} {:>10.4}",
            record.horizon,
            record.bin.bin,
            record.bin.count,
            record.bin.mean_predicted,
            record.bin.mean_observed,
        );
    }
}
