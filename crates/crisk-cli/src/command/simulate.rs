use std::path::PathBuf;

use anyhow::Context;
use crisk_model::{
    Dataset, PredictorSet,
    simulate::{self, SimulationParams},
};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of rows to generate
    #[arg(long, default_value_t = 100)]
    rows: usize,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Simulation parameters JSON file
    #[arg(long)]
    params: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        rows,
        seed,
        params,
        output,
    } = arg;

    let params = match params {
        Some(path) => util::read_json_file("simulation parameters", path)?,
        None => SimulationParams::default(),
    };
    let params = SimulationParams {
        rows: *rows,
        ..params
    };

    let records = simulate::simulate_records(&params, *seed)
        .with_context(|| format!("Failed to simulate {rows} rows"))?;

    let predictors = PredictorSet::new(vec!["group".into()], vec!["x1".into(), "x2".into()]);
    let dataset = Dataset::from_records(&records, &predictors, params.max_time)
        .context("Simulated records do not form a valid dataset")?;
    let [censored, events, competing] = dataset.status_counts();
    log::info!(
        "simulated {} rows: {censored} censored, {events} events, {competing} competing",
        dataset.len()
    );

    Output::save_json(&records, output.clone())?;
    Ok(())
}
