//! K-Nearest-Neighbors classifier built on linfa-nn neighbour indexes

use std::fmt;

use linfa::metrics::ToConfusionMatrix;
use linfa_nn::distance::{Distance, L1Dist, L2Dist, LpDist};
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use ndarray::{Array1, Array2};

use crate::data::Labelled;
use crate::error::{PipelineError, Result};

/// Distance metric used to find neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Euclidean,
    Manhattan,
    /// Minkowski distance with p = 2
    Minkowski,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Euclidean, Metric::Manhattan, Metric::Minkowski];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Minkowski => "minkowski",
        };
        f.write_str(name)
    }
}

/// How neighbour votes are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weighting {
    /// Every neighbour counts once
    Uniform,
    /// Neighbours count by inverse distance
    Distance,
}

impl Weighting {
    pub const ALL: [Weighting; 2] = [Weighting::Uniform, Weighting::Distance];
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weighting::Uniform => "uniform",
            Weighting::Distance => "distance",
        };
        f.write_str(name)
    }
}

/// One point of the hyperparameter grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnnConfig {
    pub metric: Metric,
    pub n_neighbors: usize,
    pub weighting: Weighting,
}

impl fmt::Display for KnnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metric={}, n_neighbors={}, weights={}",
            self.metric, self.n_neighbors, self.weighting
        )
    }
}

/// Fitted KNN classifier; keeps the training rows it votes with
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    pub config: KnnConfig,
    records: Array2<f64>,
    targets: Array1<usize>,
}

impl KnnClassifier {
    /// Fit on a labelled dataset.
    ///
    /// Fails when the dataset holds fewer rows than `n_neighbors`.
    pub fn fit(config: KnnConfig, dataset: &Labelled) -> Result<Self> {
        if config.n_neighbors == 0 {
            return Err(PipelineError::invalid_parameter("n_neighbors must be at least 1"));
        }

        let n_samples = dataset.records.nrows();
        if n_samples < config.n_neighbors {
            return Err(PipelineError::insufficient_data(config.n_neighbors, n_samples));
        }

        Ok(Self {
            config,
            records: dataset.records.clone(),
            targets: dataset.targets.clone(),
        })
    }

    /// Predict a label for every row of `records`.
    pub fn predict(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        if records.ncols() != self.records.ncols() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.records.ncols(),
                actual: records.ncols(),
            });
        }

        match self.config.metric {
            Metric::Euclidean => self.predict_with(records, L2Dist),
            Metric::Manhattan => self.predict_with(records, L1Dist),
            Metric::Minkowski => self.predict_with(records, LpDist::new(2.0)),
        }
    }

    /// Fraction of rows in `dataset` predicted correctly.
    pub fn score(&self, dataset: &Labelled) -> Result<f64> {
        let predictions = self.predict(&dataset.records)?;
        let cm = predictions.confusion_matrix(dataset)?;
        Ok(cm.accuracy() as f64)
    }

    fn predict_with<D: Distance<f64>>(&self, records: &Array2<f64>, dist: D) -> Result<Array1<usize>> {
        let index = CommonNearestNeighbour::LinearSearch.from_batch(&self.records, dist.clone())?;
        let n_classes = self.targets.iter().max().map_or(0, |&m| m + 1);

        let mut predictions = Vec::with_capacity(records.nrows());
        for row in records.rows() {
            let neighbours = index.k_nearest(row, self.config.n_neighbors)?;
            let mut votes = vec![0.0; n_classes];

            match self.config.weighting {
                Weighting::Uniform => {
                    for (_, idx) in &neighbours {
                        votes[self.targets[*idx]] += 1.0;
                    }
                }
                Weighting::Distance => {
                    let distances: Vec<f64> = neighbours
                        .iter()
                        .map(|(point, _)| dist.distance(row, point.view()))
                        .collect();
                    let exact = distances.iter().any(|&d| d == 0.0);

                    for ((_, idx), &d) in neighbours.iter().zip(distances.iter()) {
                        let weight = match (exact, d == 0.0) {
                            (true, true) => 1.0,
                            (true, false) => 0.0,
                            (false, _) => 1.0 / d,
                        };
                        votes[self.targets[*idx]] += weight;
                    }
                }
            }

            predictions.push(majority(&votes));
        }

        Ok(Array1::from(predictions))
    }
}

/// Label with the highest vote; ties go to the smallest label.
fn majority(votes: &[f64]) -> usize {
    let mut best = 0;
    for (label, &vote) in votes.iter().enumerate() {
        if vote > votes[best] {
            best = label;
        }
    }
    best
}
