//! Accuracy and confusion matrix on the held-out partition

use std::fmt;

use linfa::metrics::ToConfusionMatrix;
use ndarray::{Array1, Array2};

use crate::data::Labelled;
use crate::error::{PipelineError, Result};
use crate::model::KnnClassifier;

/// Label order used when the caller does not supply one
pub const BINARY_LABELS: [usize; 2] = [0, 1];

/// Counts of (actual, predicted) label pairs laid out for reporting.
///
/// Unlike linfa's matrix, the layout is fixed by the label list, so a class
/// absent from both actual and predicted labels still gets its row and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Label for each row/column index
    labels: Vec<usize>,
    /// `counts[[i, j]]`: rows with actual `labels[i]` predicted as `labels[j]`
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    /// Build over the binary labels in ascending order.
    pub fn new(actual: &Array1<usize>, predicted: &Array1<usize>) -> Result<Self> {
        Self::with_labels(actual, predicted, &BINARY_LABELS)
    }

    /// Build with a caller-chosen row/column label order.
    ///
    /// Pairs whose labels are not listed are ignored, matching the usual
    /// behaviour of an explicit label list.
    pub fn with_labels(actual: &Array1<usize>, predicted: &Array1<usize>, labels: &[usize]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }
        if labels.is_empty() {
            return Err(PipelineError::invalid_parameter("label list is empty"));
        }

        let position = |label: usize| labels.iter().position(|&l| l == label);
        let mut counts = Array2::zeros((labels.len(), labels.len()));
        for (&a, &p) in actual.iter().zip(predicted.iter()) {
            if let (Some(i), Some(j)) = (position(a), position(p)) {
                counts[[i, j]] += 1;
            }
        }

        Ok(Self {
            labels: labels.to_vec(),
            counts,
        })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    /// Count for an (actual, predicted) pair of labels
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        let i = self.labels.iter().position(|&l| l == actual);
        let j = self.labels.iter().position(|&l| l == predicted);
        match (i, j) {
            (Some(i), Some(j)) => self.counts[[i, j]],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Largest single cell, used to scale heatmap colours
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Bracketed layout: `[[a b]` / ` [c d]]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.max_count().to_string().len();
        let n_rows = self.counts.nrows();
        for (i, row) in self.counts.outer_iter().enumerate() {
            f.write_str(if i == 0 { "[[" } else { " [" })?;
            let cells: Vec<String> = row.iter().map(|c| format!("{:>width$}", c)).collect();
            f.write_str(&cells.join(" "))?;
            f.write_str(if i + 1 == n_rows { "]]" } else { "]\n" })?;
        }
        Ok(())
    }
}

/// Test-set metrics for a fitted classifier
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Fraction of test rows predicted correctly
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub predictions: Array1<usize>,
}

/// Predict `test` and compare with its labels.
pub fn evaluate(model: &KnnClassifier, test: &Labelled) -> Result<Evaluation> {
    let predictions = model.predict(&test.records)?;
    let accuracy = predictions.confusion_matrix(test)?.accuracy() as f64;
    let confusion = ConfusionMatrix::new(&test.targets, &predictions)?;

    Ok(Evaluation {
        accuracy,
        confusion,
        predictions,
    })
}
