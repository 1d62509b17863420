//! Passenger loading and feature engineering using Polars

use std::path::Path;

use linfa::Dataset;
use ndarray::{Array1, Array2, ArrayView1, Ix1};
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Columns the input CSV must provide.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "PassengerId",
    "Survived",
    "Pclass",
    "Name",
    "Sex",
    "Age",
    "SibSp",
    "Parch",
    "Ticket",
    "Fare",
    "Cabin",
    "Embarked",
];

/// Feature columns in the order they appear in [`FeatureTable::features`].
pub const FEATURE_NAMES: [&str; 6] = ["Pclass", "Sex", "FamilySize", "IsAlone", "FareBin", "AgeBin"];

/// Upper edges of the fixed age bins; anything above the last edge is the final bin.
pub const AGE_BIN_EDGES: [f64; 4] = [12.0, 20.0, 40.0, 60.0];

/// Number of equal-population fare bins.
pub const FARE_QUANTILE_BINS: usize = 4;

/// Feature rows with one survival label each
pub type Labelled = Dataset<f64, usize, Ix1>;

/// Fully preprocessed passenger data
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Names of the feature columns, matching `features` column order
    pub feature_names: Vec<String>,
    /// Feature matrix (n_passengers, 6); contains no missing values
    pub features: Array2<f64>,
    /// Survival label per passenger (0 or 1)
    pub target: Array1<usize>,
}

impl FeatureTable {
    /// Number of passengers
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the table holds no passengers
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// View a feature column by name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.features.column(idx))
    }
}

/// Load the passenger CSV into a DataFrame and verify its schema.
///
/// # Arguments
/// * `path` - Path to the CSV file; empty fields are read as nulls
///
/// # Errors
/// * `MissingFile` if the file cannot be opened
/// * `Schema` if any of [`REQUIRED_COLUMNS`] is absent
/// * `InsufficientData` if the file has no data rows
pub fn load_passengers(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    std::fs::File::open(path).map_err(|source| PipelineError::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    for column in REQUIRED_COLUMNS {
        if df.get_column_index(column).is_none() {
            return Err(PipelineError::Schema {
                column: column.to_string(),
            });
        }
    }

    if df.height() == 0 {
        return Err(PipelineError::insufficient_data(1, 0));
    }

    info!(rows = df.height(), path = %path.display(), "loaded passenger data");
    Ok(df)
}

/// Clean the raw passenger table and derive the model features.
///
/// The input frame is left untouched. Missing ages are filled with the
/// median age of the passenger's class, sex is encoded as male=1/female=0,
/// family size and an is-alone flag are derived, and fare and age are
/// replaced by bin indices.
pub fn preprocess(raw: &DataFrame) -> Result<FeatureTable> {
    validate_sex(raw)?;

    let df = raw
        .clone()
        .lazy()
        .with_columns([
            // Filled for completeness only; the column is not selected below
            col("Embarked").fill_null(lit("S")),
            col("Pclass").cast(DataType::Float64),
            col("Age").cast(DataType::Float64),
            col("Fare").cast(DataType::Float64),
            col("SibSp").cast(DataType::Float64),
            col("Parch").cast(DataType::Float64),
        ])
        .with_columns([
            col("Age")
                .fill_null(col("Age").median().over([col("Pclass")]))
                .fill_null(col("Age").median()),
            col("Fare").fill_null(col("Fare").median()),
            when(col("Sex").eq(lit("male")))
                .then(lit(1.0))
                .otherwise(lit(0.0))
                .alias("Sex"),
            (col("SibSp") + col("Parch")).alias("FamilySize"),
        ])
        .with_columns([col("FamilySize")
            .eq(lit(0.0))
            .cast(DataType::Float64)
            .alias("IsAlone")])
        .select([
            col("Survived"),
            col("Pclass"),
            col("Sex"),
            col("FamilySize"),
            col("IsAlone"),
            col("Fare"),
            col("Age"),
        ])
        .collect()?;

    let target = survival_labels(&df)?;
    let pclass = float_column(&df, "Pclass")?;
    let sex = float_column(&df, "Sex")?;
    let family_size = float_column(&df, "FamilySize")?;
    let is_alone = float_column(&df, "IsAlone")?;
    let fare = float_column(&df, "Fare")?;
    let age = float_column(&df, "Age")?;

    let fare_edges = fare_quantile_edges(&df)?;
    let fare_bin: Vec<f64> = fare
        .iter()
        .map(|&f| bin_by_edges(f, &fare_edges) as f64)
        .collect();
    let age_bin: Vec<f64> = age.iter().map(|&a| age_bin(a) as f64).collect();

    let columns = [pclass, sex, family_size, is_alone, fare_bin, age_bin];
    let features = Array2::from_shape_fn((df.height(), FEATURE_NAMES.len()), |(i, j)| columns[j][i]);

    debug!(edges = ?fare_edges, "fare quantile edges");
    info!(rows = features.nrows(), features = features.ncols(), "preprocessing complete");

    Ok(FeatureTable {
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        features,
        target,
    })
}

/// Map an age to its bin: (0,12] -> 0, (12,20] -> 1, (20,40] -> 2,
/// (40,60] -> 3, above 60 -> 4. Non-positive ages fall in the first bin.
pub fn age_bin(age: f64) -> usize {
    AGE_BIN_EDGES.partition_point(|&edge| edge < age)
}

/// Index of the right-closed bin holding `value`, with the lowest edge
/// included in the first bin. Values outside the edges are clamped.
pub fn bin_by_edges(value: f64, edges: &[f64]) -> usize {
    if edges.len() < 2 {
        return 0;
    }
    let position = edges.partition_point(|&edge| edge < value);
    position.clamp(1, edges.len() - 1) - 1
}

/// Linear-interpolated quantile edges splitting the fare column into
/// [`FARE_QUANTILE_BINS`] equal-population bins. Duplicate edges are
/// collapsed, which yields fewer bins.
fn fare_quantile_edges(df: &DataFrame) -> Result<Vec<f64>> {
    let fare = df.column("Fare")?.as_materialized_series().f64()?.clone();

    let mut edges = Vec::with_capacity(FARE_QUANTILE_BINS + 1);
    for i in 0..=FARE_QUANTILE_BINS {
        let q = i as f64 / FARE_QUANTILE_BINS as f64;
        let edge = fare
            .quantile(q, QuantileMethod::Linear)?
            .ok_or_else(|| PipelineError::MissingValue {
                column: "Fare".to_string(),
                row: 0,
            })?;
        edges.push(edge);
    }

    let before = edges.len();
    edges.dedup();
    if edges.len() < before {
        warn!(bins = edges.len().saturating_sub(1), "duplicate fare quantile edges collapsed");
    }

    Ok(edges)
}

/// Reject any sex value other than "male" or "female", including nulls.
fn validate_sex(df: &DataFrame) -> Result<()> {
    let sex = df
        .column("Sex")?
        .as_materialized_series()
        .cast(&DataType::String)?;

    for value in sex.str()?.into_iter() {
        match value {
            Some("male") | Some("female") => {}
            Some(other) => return Err(PipelineError::invalid_category("Sex", other)),
            None => return Err(PipelineError::invalid_category("Sex", "<null>")),
        }
    }

    Ok(())
}

/// Extract the survival labels, which must all be 0 or 1.
fn survival_labels(df: &DataFrame) -> Result<Array1<usize>> {
    float_column(df, "Survived")?
        .into_iter()
        .map(|value| {
            if value == 0.0 {
                Ok(0)
            } else if value == 1.0 {
                Ok(1)
            } else {
                Err(PipelineError::invalid_category("Survived", value.to_string()))
            }
        })
        .collect()
}

/// Extract a column as f64 values, failing on the first null.
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| PipelineError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}
