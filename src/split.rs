//! Seeded train/test partitioning

use linfa::Dataset;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::data::{FeatureTable, Labelled};
use crate::error::{PipelineError, Result};

/// Disjoint training and test partitions of a [`FeatureTable`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training rows and labels
    pub train: Labelled,
    /// Held-out rows and labels
    pub test: Labelled,
    /// Source row index of every training row
    pub train_indices: Vec<usize>,
    /// Source row index of every test row
    pub test_indices: Vec<usize>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(test_ratio * n)` of them.
///
/// No stratification is applied, so the label balance of each partition is
/// whatever the shuffle produces. The same table and seed always produce the
/// same partition.
pub fn train_test_split(table: &FeatureTable, test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PipelineError::invalid_parameter(format!(
            "test ratio must be in (0, 1), got {test_ratio}"
        )));
    }

    let n_samples = table.len();
    let n_test = (test_ratio * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(PipelineError::insufficient_data(2, n_samples));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    let train = subset(table, &train_indices);
    let test = subset(table, &test_indices);

    info!(train = train_indices.len(), test = test_indices.len(), seed, "split data");

    Ok(TrainTestSplit {
        train,
        test,
        train_indices,
        test_indices,
    })
}

fn subset(table: &FeatureTable, indices: &[usize]) -> Labelled {
    Dataset::new(
        table.features.select(Axis(0), indices),
        table.target.select(Axis(0), indices),
    )
}
