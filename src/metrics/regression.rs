//! Regression error metrics.
//!
//! Scores one fold's train and test predictions:
//! - RMSE, MAE
//! - MAPE (as a fraction, not a percentage)
//! - R²

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Length mismatch: {expected} targets but {actual} predictions")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Scores for one set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
    pub r2: f64,
}

impl RegressionScores {
    /// Score predictions against true targets.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> MetricsResult<Self> {
        check_inputs(y_true, y_pred)?;

        Ok(Self {
            rmse: mean_squared_error(y_true, y_pred).sqrt(),
            mae: mean_absolute_error(y_true, y_pred),
            mape: mean_absolute_percentage_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        })
    }
}

/// Train and test scores of a single cross-validation fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldScores {
    pub train: RegressionScores,
    pub test: RegressionScores,
}

/// Score a fold's train and test predictions.
pub fn score_regression_metrics(
    y_train: &[f64],
    y_train_pred: &[f64],
    y_test: &[f64],
    y_test_pred: &[f64],
) -> MetricsResult<FoldScores> {
    Ok(FoldScores {
        train: RegressionScores::compute(y_train, y_train_pred)?,
        test: RegressionScores::compute(y_test, y_test_pred)?,
    })
}

fn check_inputs(y_true: &[f64], y_pred: &[f64]) -> MetricsResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MetricsError::EmptyInput("no samples to score"));
    }
    Ok(())
}

fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Relative error per sample, with the denominator floored at machine epsilon
/// so zero targets produce a large but finite error.
fn mean_absolute_percentage_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs() / t.abs().max(f64::EPSILON))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination.
///
/// Undefined (NaN) for fewer than two samples. A constant target scores 1.0
/// when predicted exactly and 0.0 otherwise.
fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.len() < 2 {
        return f64::NAN;
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}
