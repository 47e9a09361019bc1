//! Results table construction.
//!
//! One row per fold. Run metadata is repeated on every row so tables from
//! different models and plants can be concatenated and compared.

use polars::prelude::*;

use super::summary::{CrossValScores, Metric, Phase};
use crate::config::{RunMetadata, SplitterConfig};

/// Cross-validation strategy label written to the table.
pub const CROSS_VALIDATION_NAME: &str = "Blocking Time Series Split";

/// Build the per-fold results table.
///
/// Columns: Category, Company, Plant, Features, Model, Cross Validation,
/// Cross Validation Params, any `extra` metadata, then `<METRIC> Train` /
/// `<METRIC> Test` for RMSE, MAE, MAPE and R2. Error metrics are stored as
/// magnitudes.
///
/// Fails if an `extra` key collides with a built-in column name.
pub fn results_table(
    run: &RunMetadata,
    splitter: &SplitterConfig,
    scores: &CrossValScores,
) -> PolarsResult<DataFrame> {
    let rows = scores.len();
    let repeat = |name: &str, value: &str| Series::new(name, vec![value.to_string(); rows]);

    let mut columns = vec![
        repeat("Category", run.category.as_str()),
        repeat("Company", run.company.as_str()),
        repeat("Plant", run.plant.as_str()),
        repeat("Features", run.features.as_str()),
        repeat("Model", run.model.as_str()),
        repeat("Cross Validation", CROSS_VALIDATION_NAME),
        repeat("Cross Validation Params", splitter.params_json().as_str()),
    ];

    for (key, value) in &run.extra {
        columns.push(repeat(key.as_str(), value.as_str()));
    }

    for metric in Metric::ALL {
        for phase in Phase::ALL {
            let name = format!("{} {}", metric.name(), phase.label());
            let values: Vec<f64> = scores
                .values(phase, metric)
                .into_iter()
                .map(|v| if metric.is_error() { v.abs() } else { v })
                .collect();
            columns.push(Series::new(name.as_str(), values));
        }
    }

    DataFrame::new(columns)
}
