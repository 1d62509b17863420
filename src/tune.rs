//! Exhaustive cross-validated hyperparameter search for the KNN classifier

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::Labelled;
use crate::error::{PipelineError, Result};
use crate::model::{KnnClassifier, KnnConfig, Metric, Weighting};

/// Search space for [`tune_knn`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGrid {
    pub metrics: Vec<Metric>,
    /// Inclusive upper bound; neighbour counts run from 1
    pub max_neighbors: usize,
    pub weightings: Vec<Weighting>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            metrics: Metric::ALL.to_vec(),
            max_neighbors: 20,
            weightings: Weighting::ALL.to_vec(),
        }
    }
}

impl ParamGrid {
    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors;
        self
    }

    /// All configurations, metric-major, then neighbour count, then weighting.
    pub fn configurations(&self) -> Vec<KnnConfig> {
        let mut configs = Vec::with_capacity(self.len());
        for &metric in &self.metrics {
            for n_neighbors in 1..=self.max_neighbors {
                for &weighting in &self.weightings {
                    configs.push(KnnConfig {
                        metric,
                        n_neighbors,
                        weighting,
                    });
                }
            }
        }
        configs
    }

    pub fn len(&self) -> usize {
        self.metrics.len() * self.max_neighbors * self.weightings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validation outcome for one configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub config: KnnConfig,
    /// Accuracy per fold; `None` when the configuration could not be scored
    pub fold_scores: Option<Vec<f64>>,
}

impl Trial {
    pub fn mean_score(&self) -> Option<f64> {
        self.fold_scores
            .as_ref()
            .filter(|scores| !scores.is_empty())
            .map(|scores| scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Result of the grid search
#[derive(Debug, Clone)]
pub struct TuningReport {
    /// Winning configuration fitted on the full training partition
    pub model: KnnClassifier,
    pub best_config: KnnConfig,
    pub best_score: f64,
    /// Every trial in enumeration order
    pub trials: Vec<Trial>,
}

impl TuningReport {
    /// Number of configurations that produced a score
    pub fn scored_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.fold_scores.is_some()).count()
    }
}

/// Score every configuration of `grid` by `folds`-fold cross-validated
/// accuracy on `train` and refit the best one on all of `train`.
///
/// Folds are contiguous and unstratified; the `n % folds` trailing rows
/// always stay on the training side. Trials run in parallel. Configurations
/// with more neighbours than a fold has training rows are skipped. Ties keep
/// the configuration enumerated first.
pub fn tune_knn(train: &Labelled, grid: &ParamGrid, folds: usize) -> Result<TuningReport> {
    if folds < 2 {
        return Err(PipelineError::invalid_parameter(format!(
            "cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    let n_samples = train.records.nrows();
    if n_samples < folds {
        return Err(PipelineError::insufficient_data(folds, n_samples));
    }
    if grid.is_empty() {
        return Err(PipelineError::invalid_parameter("parameter grid is empty"));
    }

    let start = Instant::now();
    let fold_sets = train.fold(folds);
    let configs = grid.configurations();

    let trials: Vec<Trial> = configs
        .into_par_iter()
        .map(|config| Trial {
            config,
            fold_scores: cross_validate(config, &fold_sets),
        })
        .collect();

    let mut best: Option<(KnnConfig, f64)> = None;
    for trial in &trials {
        match trial.mean_score() {
            Some(score) => {
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((trial.config, score));
                }
            }
            None => debug!(config = %trial.config, "configuration skipped"),
        }
    }

    let (best_config, best_score) = best.ok_or(PipelineError::NoViableConfiguration)?;
    let model = KnnClassifier::fit(best_config, train)?;

    info!(
        config = %best_config,
        score = best_score,
        trials = trials.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "grid search complete"
    );

    Ok(TuningReport {
        model,
        best_config,
        best_score,
        trials,
    })
}

/// Accuracy of `config` on each validation fold, or `None` if any fold fails.
fn cross_validate(
    config: KnnConfig,
    fold_sets: &[(Labelled, Labelled)],
) -> Option<Vec<f64>> {
    fold_sets
        .iter()
        .map(|(train, valid)| {
            KnnClassifier::fit(config, train)
                .and_then(|model| model.score(valid))
                .ok()
        })
        .collect()
}
