pub mod config;
pub mod cv;
pub mod metrics;

// Re-export commonly used types
pub use config::{ExperimentConfig, RunMetadata, SplitterConfig};
pub use cv::{BlockingTimeSeriesSplit, CrossValidator, Fold, SampleSet, SplitError, Splits};
pub use metrics::{CrossValScores, FoldScores, Metric, Phase, RegressionScores};
