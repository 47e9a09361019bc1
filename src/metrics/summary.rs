//! Cross-validation score aggregation.
//!
//! Collects per-fold scores and reduces them to mean and standard deviation
//! per metric and phase.

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::regression::{FoldScores, RegressionScores};

/// Regression metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rmse,
    Mae,
    Mape,
    R2,
}

impl Metric {
    /// All metrics, in report order.
    pub const ALL: [Metric; 4] = [Metric::Rmse, Metric::Mae, Metric::Mape, Metric::R2];

    /// Scorer key, as used by cross-validation result maps.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Rmse => "neg_root_mean_squared_error",
            Self::Mae => "neg_mean_absolute_error",
            Self::Mape => "neg_mean_absolute_percentage_error",
            Self::R2 => "r2",
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rmse => "RMSE",
            Self::Mae => "MAE",
            Self::Mape => "MAPE",
            Self::R2 => "R2",
        }
    }

    /// Error metrics are reported as magnitudes; R2 keeps its sign.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::R2)
    }

    /// Parse a metric from its display name or scorer key.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.key() == s)
    }

    fn value(&self, scores: &RegressionScores) -> f64 {
        match self {
            Self::Rmse => scores.rmse,
            Self::Mae => scores.mae,
            Self::Mape => scores.mape,
            Self::R2 => scores.r2,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Train or test side of a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Train,
    Test,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Train, Phase::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }

    /// Column-style label, e.g. "Train".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Test => "Test",
        }
    }

    fn select<'a>(&self, fold: &'a FoldScores) -> &'a RegressionScores {
        match self {
            Self::Train => &fold.train,
            Self::Test => &fold.test,
        }
    }
}

/// Mean and population standard deviation of a metric across folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

/// Scores for every fold of a cross-validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossValScores {
    pub folds: Vec<FoldScores>,
}

impl CrossValScores {
    pub fn new(folds: Vec<FoldScores>) -> Self {
        Self { folds }
    }

    pub fn push(&mut self, fold: FoldScores) {
        self.folds.push(fold);
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Per-fold values of one metric, in fold order.
    pub fn values(&self, phase: Phase, metric: Metric) -> Vec<f64> {
        self.folds
            .iter()
            .map(|fold| metric.value(phase.select(fold)))
            .collect()
    }

    /// Mean and standard deviation (ddof = 0) over folds.
    ///
    /// Both are NaN when there are no folds.
    pub fn summary(&self, phase: Phase, metric: Metric) -> MetricSummary {
        let values = self.values(phase, metric);
        MetricSummary {
            mean: values.iter().mean(),
            std: values.iter().population_std_dev(),
        }
    }

    /// Text report of mean (std) per metric, train block first.
    pub fn report(&self, metrics: &[Metric]) -> String {
        let mut report = String::new();

        for phase in Phase::ALL {
            report.push_str("******\n");
            report.push_str(&format!("[{}]\n", phase.as_str().to_uppercase()));
            report.push_str("******\n");
            for metric in metrics {
                let summary = self.summary(phase, *metric);
                report.push_str(&format!(
                    "{}: {:.3} ({:.3})\n",
                    metric.name(),
                    summary.mean,
                    summary.std
                ));
            }
            report.push_str("\n======================\n\n");
        }

        report
    }
}

impl FromIterator<FoldScores> for CrossValScores {
    fn from_iter<I: IntoIterator<Item = FoldScores>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scores(rmse: f64, r2: f64) -> RegressionScores {
        RegressionScores {
            rmse,
            mae: rmse / 2.0,
            mape: rmse / 100.0,
            r2,
        }
    }

    fn sample() -> CrossValScores {
        vec![
            FoldScores {
                train: scores(1.0, 0.9),
                test: scores(2.0, 0.7),
            },
            FoldScores {
                train: scores(3.0, 0.8),
                test: scores(4.0, 0.5),
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!(Metric::parse("rmse"), Some(Metric::Rmse));
        assert_eq!(Metric::parse(" MAPE "), Some(Metric::Mape));
        assert_eq!(Metric::parse("r2"), Some(Metric::R2));
        assert_eq!(Metric::parse("neg_mean_absolute_error"), Some(Metric::Mae));
        assert_eq!(Metric::parse("mse"), None);
    }

    #[test]
    fn test_values_in_fold_order() {
        let cv = sample();
        assert_eq!(cv.values(Phase::Train, Metric::Rmse), vec![1.0, 3.0]);
        assert_eq!(cv.values(Phase::Test, Metric::R2), vec![0.7, 0.5]);
    }

    #[test]
    fn test_summary_population_std() {
        let cv = sample();
        let summary = cv.summary(Phase::Train, Metric::Rmse);

        assert_relative_eq!(summary.mean, 2.0, epsilon = 1e-12);
        assert_relative_eq!(summary.std, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summary_empty_is_nan() {
        let summary = CrossValScores::default().summary(Phase::Test, Metric::Mae);
        assert!(summary.mean.is_nan());
    }

    #[test]
    fn test_report_layout() {
        let report = sample().report(&[Metric::Rmse, Metric::R2]);

        let expected = "******\n[TRAIN]\n******\n\
                        RMSE: 2.000 (1.000)\n\
                        R2: 0.850 (0.050)\n\
                        \n======================\n\n\
                        ******\n[TEST]\n******\n\
                        RMSE: 3.000 (1.000)\n\
                        R2: 0.600 (0.100)\n\
                        \n======================\n\n";
        assert_eq!(report, expected);
    }
}
