//! Error types for the survival pipeline.
//!
//! Data-integrity problems (unreadable input, missing columns, unexpected
//! categories) are fatal. Rendering problems are reported through
//! [`PipelineError::Plot`] and handled leniently by the reporter.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file is absent or unreadable.
    #[error("Cannot read input file {}: {source}", path.display())]
    MissingFile {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A column the pipeline depends on is not present.
    #[error("Missing required column: {column}")]
    Schema {
        /// Name of the absent column
        column: String,
    },

    /// A categorical column holds a value outside its known domain.
    #[error("Invalid value {value:?} in column {column}")]
    InvalidCategory {
        /// Column holding the value
        column: String,
        /// Offending value (`<null>` when missing)
        value: String,
    },

    /// A value is still missing after imputation.
    #[error("Missing value in column {column} at row {row}")]
    MissingValue {
        /// Column holding the null
        column: String,
        /// Zero-based row index
        row: usize,
    },

    /// A feature column has zero range on the training partition.
    #[error("Column {column} has zero range and cannot be min-max scaled")]
    DegenerateColumn {
        /// Name or index of the constant column
        column: String,
    },

    /// Matrix width does not match the fitted width.
    #[error("Dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch {
        /// Expected number of columns
        expected: usize,
        /// Actual number of columns
        actual: usize,
    },

    /// Not enough rows for the requested operation.
    #[error("Insufficient data: required {required}, actual {actual}")]
    InsufficientData {
        /// Minimum required rows
        required: usize,
        /// Rows available
        actual: usize,
    },

    /// A configuration value is out of range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the problem
        message: String,
    },

    /// Every grid configuration failed to produce a cross-validation score.
    #[error("No hyperparameter configuration could be scored on the training data")]
    NoViableConfiguration,

    /// Dataframe operation failed.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Nearest-neighbour query failed.
    #[error("Nearest neighbour query failed: {0}")]
    NearestNeighbour(#[from] linfa_nn::NnError),

    /// Nearest-neighbour index could not be built.
    #[error("Nearest neighbour index build failed: {0}")]
    IndexBuild(#[from] linfa_nn::BuildError),

    /// Metric computation in linfa failed.
    #[error("Linfa error: {0}")]
    Linfa(#[from] linfa::Error),

    /// Feature scaler could not be fitted.
    #[error("Scaling failed: {0}")]
    Preprocessing(#[from] linfa_preprocessing::PreprocessingError),

    /// Heatmap rendering failed.
    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

impl PipelineError {
    /// Create an InsufficientData error.
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an InvalidCategory error.
    pub fn invalid_category(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidCategory {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;
