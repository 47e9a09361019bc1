//! Cross-validation for ordered (time-series) data.
//!
//! The blocking splitter cuts the series into contiguous blocks and keeps
//! every test window strictly after its training window, separated by an
//! optional margin, so adjacent samples cannot leak between the two.

pub mod blocking;
pub mod dataset;

pub use blocking::{BlockingTimeSeriesSplit, CrossValidator, Fold, SplitError, SplitResult, Splits};
pub use dataset::SampleSet;
