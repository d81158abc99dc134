use std::path::PathBuf;

use clap::Parser;
use trialgrid::{Scenario, init_logging, report, run_scenario};

#[derive(Parser, Debug)]
#[command(name = "trialgrid")]
#[command(about = "Reproducible parallel stockout risk and grid search simulations")]
struct Args {
    /// Path to the scenario YAML file
    scenario: PathBuf,

    /// Maximum units in flight (overrides the scenario)
    #[arg(short, long)]
    parallelism: Option<usize>,

    /// Base seed (overrides the scenario)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(parallelism) = args.parallelism {
        scenario.run.parallelism = Some(parallelism);
    }
    if let Some(seed) = args.seed {
        scenario.run.simulation = scenario.run.simulation.with_seed(seed);
    }
    tracing::info!(
        scenario = %args.scenario.display(),
        parallelism = ?scenario.run.parallelism,
        seed = scenario.run.simulation.base_seed(),
        "Loaded scenario"
    );

    let outcome = run_scenario(&scenario)?;
    print!("{}", report::render(&outcome)?);

    Ok(())
}
