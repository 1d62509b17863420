//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::PipelineConfig;
use crate::scale::DegeneratePolicy;

/// Predict Titanic passenger survival with a grid-searched KNN classifier
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "tested.csv")]
    pub input: PathBuf,

    /// Output path for the confusion matrix heatmap
    #[arg(short, long, default_value = "confusion_matrix.png")]
    pub output: PathBuf,

    /// Seed for the train/test shuffle
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Fraction of rows held out for testing
    #[arg(long, default_value = "0.25")]
    pub test_size: f64,

    /// Number of cross-validation folds
    #[arg(long, default_value = "5")]
    pub folds: usize,

    /// Largest neighbour count tried by the grid search
    #[arg(long, default_value = "20")]
    pub max_neighbors: usize,

    /// Fail instead of warning when a feature is constant on the training rows
    #[arg(long)]
    pub strict_scaling: bool,

    /// Skip rendering the heatmap
    #[arg(long)]
    pub no_plot: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Convert the parsed flags into a pipeline configuration
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            input: self.input.clone(),
            output: (!self.no_plot).then(|| self.output.clone()),
            seed: self.seed,
            test_ratio: self.test_size,
            folds: self.folds,
            max_neighbors: self.max_neighbors,
            degenerate_policy: if self.strict_scaling {
                DegeneratePolicy::Strict
            } else {
                DegeneratePolicy::Lenient
            },
        }
    }
}
