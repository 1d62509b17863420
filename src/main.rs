//! titanic-knn: Titanic survival prediction CLI
//!
//! Parses arguments, sets up logging and runs the pipeline. Any data error
//! ends the process with a non-zero exit status.

use anyhow::{Context, Result};
use clap::Parser;
use titanic_knn::{logging, pipeline, Args};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = args.to_config();
    info!(input = %config.input.display(), seed = config.seed, "starting survival pipeline");

    let outcome = pipeline::run(&config)
        .with_context(|| format!("Survival pipeline failed for {}", config.input.display()))?;

    info!(
        passengers = outcome.n_passengers,
        train = outcome.n_train,
        test = outcome.n_test,
        scored_trials = outcome.scored_trials,
        heatmap = outcome.heatmap_written,
        "done"
    );

    Ok(())
}
