//! End-to-end survival pipeline: load, preprocess, split, scale, tune,
//! evaluate and report.

use std::path::PathBuf;
use std::time::Instant;

use linfa::Dataset;
use tracing::{debug, info};

use crate::data::{load_passengers, preprocess};
use crate::error::{PipelineError, Result};
use crate::eval::{evaluate, Evaluation};
use crate::model::KnnConfig;
use crate::scale::{DegeneratePolicy, MinMaxScaler};
use crate::split::train_test_split;
use crate::tune::{tune_knn, ParamGrid};
use crate::viz;

/// Settings for a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Passenger CSV
    pub input: PathBuf,
    /// Heatmap destination; `None` skips rendering
    pub output: Option<PathBuf>,
    /// Seed for the train/test shuffle
    pub seed: u64,
    /// Fraction of rows held out for testing
    pub test_ratio: f64,
    /// Cross-validation folds
    pub folds: usize,
    /// Largest neighbour count in the grid
    pub max_neighbors: usize,
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("tested.csv"),
            output: Some(PathBuf::from("confusion_matrix.png")),
            seed: 42,
            test_ratio: 0.25,
            folds: 5,
            max_neighbors: 20,
            degenerate_policy: DegeneratePolicy::Lenient,
        }
    }
}

impl PipelineConfig {
    /// Reject out-of-range settings before any work is done
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(PipelineError::invalid_parameter(format!(
                "test size must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.folds < 2 {
            return Err(PipelineError::invalid_parameter(format!(
                "folds must be at least 2, got {}",
                self.folds
            )));
        }
        if self.max_neighbors == 0 {
            return Err(PipelineError::invalid_parameter("max neighbors must be at least 1"));
        }
        Ok(())
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub n_passengers: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub best_config: KnnConfig,
    /// Mean cross-validated accuracy of `best_config`
    pub cv_score: f64,
    /// Configurations that produced a cross-validation score
    pub scored_trials: usize,
    pub evaluation: Evaluation,
    /// Whether the heatmap was written
    pub heatmap_written: bool,
}

/// Run every stage in order and report the test metrics.
///
/// Data problems abort the run with an error; a failed heatmap render only
/// clears [`PipelineOutcome::heatmap_written`].
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    let start = Instant::now();

    let raw = load_passengers(&config.input)?;
    let table = preprocess(&raw)?;
    let split = train_test_split(&table, config.test_ratio, config.seed)?;

    let (scaler, train_records) =
        MinMaxScaler::fit_transform(&split.train.records, &table.feature_names, config.degenerate_policy)?;
    let test_records = scaler.transform(&split.test.records)?;
    debug!(min = ?scaler.data_min(), max = ?scaler.data_max(), "fitted min-max scaler");

    let train = Dataset::new(train_records, split.train.targets.clone());
    let test = Dataset::new(test_records, split.test.targets.clone());

    let grid = ParamGrid::default().with_max_neighbors(config.max_neighbors);
    let tuning = tune_knn(&train, &grid, config.folds)?;
    info!(config = %tuning.best_config, cv_accuracy = tuning.best_score, "selected model");

    let evaluation = evaluate(&tuning.model, &test)?;
    let heatmap_written = viz::report(&evaluation, config.output.as_deref());

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "pipeline complete");

    Ok(PipelineOutcome {
        n_passengers: table.len(),
        n_train: train.records.nrows(),
        n_test: test.records.nrows(),
        best_config: tuning.best_config,
        cv_score: tuning.best_score,
        scored_trials: tuning.scored_trials(),
        evaluation,
        heatmap_written,
    })
}
