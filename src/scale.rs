//! Min-max feature scaling fitted on training rows only

use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};
use tracing::warn;

use crate::error::{PipelineError, Result};

/// What to do when a training column has zero range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Treat the range as 1, so the column becomes `x - min`
    #[default]
    Lenient,
    /// Fail with [`PipelineError::DegenerateColumn`]
    Strict,
}

/// Per-column min-max scaler mapping the fitted range onto [0, 1]
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    inner: LinearScaler<f64>,
    data_min: Array1<f64>,
    data_max: Array1<f64>,
    /// Indices of zero-range columns
    degenerate: Vec<usize>,
}

impl MinMaxScaler {
    /// Fit a linfa min-max scaler on `records`, checking for constant columns first.
    ///
    /// `names` labels columns in error messages and may be empty.
    pub fn fit(records: &Array2<f64>, names: &[String], policy: DegeneratePolicy) -> Result<Self> {
        if records.nrows() == 0 {
            return Err(PipelineError::insufficient_data(1, 0));
        }

        let data_min = records.fold_axis(Axis(0), f64::INFINITY, |&acc, &x| acc.min(x));
        let data_max = records.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &x| acc.max(x));

        let mut degenerate = Vec::new();
        for (idx, (&min, &max)) in data_min.iter().zip(data_max.iter()).enumerate() {
            if max - min == 0.0 {
                let column = names.get(idx).cloned().unwrap_or_else(|| idx.to_string());
                if policy == DegeneratePolicy::Strict {
                    return Err(PipelineError::DegenerateColumn { column });
                }
                warn!(%column, "zero-range column, scaling by 1");
                degenerate.push(idx);
            }
        }

        let dataset = Dataset::new(records.clone(), Array1::<usize>::zeros(records.nrows()));
        let inner = LinearScaler::min_max().fit(&dataset)?;

        Ok(Self {
            inner,
            data_min,
            data_max,
            degenerate,
        })
    }

    /// Apply `(x - min) / (max - min)` using the fitted statistics.
    pub fn transform(&self, records: &Array2<f64>) -> Result<Array2<f64>> {
        let expected = self.data_max.len();
        if records.ncols() != expected {
            return Err(PipelineError::DimensionMismatch {
                expected,
                actual: records.ncols(),
            });
        }

        let mut scaled = self.inner.transform(records.clone());
        for &idx in &self.degenerate {
            let shifted = records.column(idx).mapv(|x| x - self.data_min[idx]);
            scaled.column_mut(idx).assign(&shifted);
        }
        Ok(scaled)
    }

    /// Fit on `records` and return them scaled.
    pub fn fit_transform(
        records: &Array2<f64>,
        names: &[String],
        policy: DegeneratePolicy,
    ) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(records, names, policy)?;
        let scaled = scaler.transform(records)?;
        Ok((scaler, scaled))
    }

    pub fn data_min(&self) -> &Array1<f64> {
        &self.data_min
    }

    pub fn data_max(&self) -> &Array1<f64> {
        &self.data_max
    }

    /// Indices of columns that had zero range when fitted
    pub fn degenerate_columns(&self) -> &[usize] {
        &self.degenerate
    }
}
