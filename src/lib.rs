//! titanic-knn: Titanic survival prediction with a K-Nearest-Neighbors classifier
//!
//! This library loads passenger data, engineers features, scales them on the
//! training partition, grid-searches KNN hyperparameters with cross-validation
//! and reports test accuracy alongside a confusion-matrix heatmap.

pub mod cli;
pub mod data;
pub mod error;
pub mod eval;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod scale;
pub mod split;
pub mod tune;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_passengers, preprocess, FeatureTable, Labelled};
pub use error::{PipelineError, Result};
pub use eval::{evaluate, ConfusionMatrix, Evaluation};
pub use model::{KnnClassifier, KnnConfig, Metric, Weighting};
pub use pipeline::{run, PipelineConfig, PipelineOutcome};
pub use scale::{DegeneratePolicy, MinMaxScaler};
pub use split::{train_test_split, TrainTestSplit};
pub use tune::{tune_knn, ParamGrid, TuningReport};
