//! Sample-count capability for splitter inputs.
//!
//! The splitter never looks at feature values; it only needs to know how
//! many ordered observations a dataset holds.

use polars::prelude::{DataFrame, Series};

/// Anything that can report its number of ordered samples.
pub trait SampleSet {
    /// Number of samples (rows) in the dataset.
    fn size(&self) -> usize;
}

impl<T> SampleSet for [T] {
    fn size(&self) -> usize {
        self.len()
    }
}

impl<T> SampleSet for Vec<T> {
    fn size(&self) -> usize {
        self.len()
    }
}

impl<T, const N: usize> SampleSet for [T; N] {
    fn size(&self) -> usize {
        N
    }
}

impl SampleSet for DataFrame {
    fn size(&self) -> usize {
        self.height()
    }
}

impl SampleSet for Series {
    fn size(&self) -> usize {
        self.len()
    }
}

impl<S: SampleSet + ?Sized> SampleSet for &S {
    fn size(&self) -> usize {
        (**self).size()
    }
}
