//! Regression scoring for cross-validated models.
//!
//! Provides:
//! - Per-fold RMSE, MAE, MAPE and R² for train and test predictions
//! - Mean / standard deviation summaries across folds
//! - Per-fold results tables with run metadata

pub mod regression;
pub mod summary;
pub mod table;

pub use regression::{score_regression_metrics, FoldScores, MetricsError, MetricsResult, RegressionScores};
pub use summary::{CrossValScores, Metric, MetricSummary, Phase};
pub use table::{results_table, CROSS_VALIDATION_NAME};
