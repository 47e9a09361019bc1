//! Blocking time-series cross-validation.
//!
//! Splits an ordered dataset into `n_splits` contiguous, non-overlapping
//! blocks. Every block is cut into an earlier training window and a later
//! test window, with `margin` samples skipped in between:
//!
//! ```text
//! |<--------------------- block ---------------------->|
//! | train .............. | margin | test ............. |
//! ```
//!
//! Samples past `n_splits * (n / n_splits)` belong to no block and are never
//! returned.

use std::iter::FusedIterator;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::dataset::SampleSet;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type SplitResult<T> = Result<T, SplitError>;

/// A single train/test pair cut from one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    /// Fold number (0-indexed, equal to the block index).
    pub index: usize,
    /// Training window, half-open.
    pub train: Range<usize>,
    /// Test window, half-open. Empty when the margin swallows the block tail.
    pub test: Range<usize>,
}

impl Fold {
    /// Training indices in ascending order.
    pub fn train_indices(&self) -> Vec<usize> {
        self.train.clone().collect()
    }

    /// Test indices in ascending order.
    pub fn test_indices(&self) -> Vec<usize> {
        self.test.clone().collect()
    }

    /// Consume the fold into `(train_indices, test_indices)`.
    pub fn into_indices(self) -> (Vec<usize>, Vec<usize>) {
        (self.train.collect(), self.test.collect())
    }

    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    /// Indices skipped between the training and test windows.
    pub fn gap(&self) -> Range<usize> {
        self.train.end..self.test.start
    }
}

/// Interface shared with generic cross-validation consumers.
///
/// Labels and groups are part of the signature only so callers can treat
/// splitters uniformly; the blocking splitter ignores both.
pub trait CrossValidator {
    type Splits: Iterator<Item = Fold>;

    /// Number of folds `split` will yield.
    fn get_n_splits(
        &self,
        x: &dyn SampleSet,
        y: Option<&dyn SampleSet>,
        groups: Option<&dyn SampleSet>,
    ) -> usize;

    /// Generate the train/test folds for `x`.
    fn split(
        &self,
        x: &dyn SampleSet,
        y: Option<&dyn SampleSet>,
        groups: Option<&dyn SampleSet>,
    ) -> Self::Splits;
}

/// Blocking time-series splitter.
///
/// Immutable once built. Every call to [`split_len`](Self::split_len) (or
/// [`folds`](Self::folds)) returns a fresh iterator, so one splitter can be
/// shared across threads and iterated any number of times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingTimeSeriesSplit {
    n_splits: usize,
    train_size: f64,
    margin: usize,
}

impl BlockingTimeSeriesSplit {
    /// Create a splitter.
    ///
    /// `train_size` is the fraction of each block used for training and must
    /// lie in `(0, 1]`. `n_splits` must be at least 1.
    pub fn new(n_splits: usize, train_size: f64, margin: usize) -> SplitResult<Self> {
        if n_splits == 0 {
            return Err(SplitError::InvalidConfiguration(
                "n_splits must be at least 1".to_string(),
            ));
        }
        if !train_size.is_finite() || train_size <= 0.0 || train_size > 1.0 {
            return Err(SplitError::InvalidConfiguration(format!(
                "train_size must be in (0, 1], got {}",
                train_size
            )));
        }

        Ok(Self {
            n_splits,
            train_size,
            margin,
        })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn train_size(&self) -> f64 {
        self.train_size
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Size of each block for a dataset of `n_samples`.
    pub fn block_size(&self, n_samples: usize) -> usize {
        n_samples / self.n_splits
    }

    /// Folds for a dataset.
    pub fn folds<X: SampleSet + ?Sized>(&self, x: &X) -> Splits {
        self.split_len(x.size())
    }

    /// Folds for a dataset of `n_samples` ordered observations.
    pub fn split_len(&self, n_samples: usize) -> Splits {
        let block_size = self.block_size(n_samples);
        let train_len = self.train_len(block_size);

        let dropped = n_samples - block_size * self.n_splits;
        if dropped > 0 {
            debug!(
                "{} trailing samples excluded from all folds (n={}, n_splits={})",
                dropped, n_samples, self.n_splits
            );
        }
        debug!(
            "Blocking split: n={}, block_size={}, train_len={}, margin={}",
            n_samples, block_size, train_len, self.margin
        );

        Splits {
            block_size,
            train_len,
            margin: self.margin,
            front: 0,
            back: self.n_splits,
        }
    }

    /// The fold for a single block, or `None` if `index >= n_splits`.
    pub fn fold(&self, n_samples: usize, index: usize) -> Option<Fold> {
        if index >= self.n_splits {
            return None;
        }
        let block_size = self.block_size(n_samples);
        Some(make_fold(
            index,
            block_size,
            self.train_len(block_size),
            self.margin,
        ))
    }

    /// Training samples per block: `floor(train_size * block_size)`.
    fn train_len(&self, block_size: usize) -> usize {
        let len = (self.train_size * block_size as f64).floor() as usize;
        len.min(block_size)
    }
}

impl CrossValidator for BlockingTimeSeriesSplit {
    type Splits = Splits;

    fn get_n_splits(
        &self,
        _x: &dyn SampleSet,
        _y: Option<&dyn SampleSet>,
        _groups: Option<&dyn SampleSet>,
    ) -> usize {
        self.n_splits
    }

    fn split(
        &self,
        x: &dyn SampleSet,
        _y: Option<&dyn SampleSet>,
        _groups: Option<&dyn SampleSet>,
    ) -> Splits {
        self.split_len(x.size())
    }
}

fn make_fold(index: usize, block_size: usize, train_len: usize, margin: usize) -> Fold {
    let start = index * block_size;
    let stop = start + block_size;
    let split_point = start + train_len;
    let test_start = split_point.saturating_add(margin).min(stop);

    Fold {
        index,
        train: start..split_point,
        test: test_start..stop,
    }
}

/// Iterator over the folds of one split call.
///
/// Each fold is computed from its block index alone.
#[derive(Debug, Clone)]
pub struct Splits {
    block_size: usize,
    train_len: usize,
    margin: usize,
    front: usize,
    back: usize,
}

impl Iterator for Splits {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        if self.front >= self.back {
            return None;
        }
        let fold = make_fold(self.front, self.block_size, self.train_len, self.margin);
        self.front += 1;
        Some(fold)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Splits {
    fn next_back(&mut self) -> Option<Fold> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(make_fold(self.back, self.block_size, self.train_len, self.margin))
    }
}

impl ExactSizeIterator for Splits {}

impl FusedIterator for Splits {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(splits: Splits) -> Vec<(Vec<usize>, Vec<usize>)> {
        splits.map(Fold::into_indices).collect()
    }

    #[test]
    fn test_five_folds_no_margin() {
        let splitter = BlockingTimeSeriesSplit::new(5, 0.8, 0).unwrap();
        let folds = pairs(splitter.split_len(10));

        assert_eq!(folds.len(), 5);
        for (i, (train, test)) in folds.iter().enumerate() {
            assert_eq!(train, &vec![2 * i]);
            assert_eq!(test, &vec![2 * i + 1]);
        }
    }

    #[test]
    fn test_margin_empties_test_window() {
        let splitter = BlockingTimeSeriesSplit::new(5, 0.8, 1).unwrap();
        let folds: Vec<Fold> = splitter.split_len(10).collect();

        assert_eq!(folds.len(), 5);
        assert_eq!(folds[0].train_indices(), vec![0]);
        assert!(folds[0].test_indices().is_empty());
        assert_eq!(folds[0].test, 2..2);
        assert_eq!(folds[4].train_indices(), vec![8]);
        assert!(folds[4].test.is_empty());
    }

    #[test]
    fn test_remainder_is_dropped() {
        let splitter = BlockingTimeSeriesSplit::new(4, 1.0, 0).unwrap();
        let folds: Vec<Fold> = splitter.split_len(9).collect();

        assert_eq!(splitter.block_size(9), 2);
        assert_eq!(folds[0].train_indices(), vec![0, 1]);
        assert!(folds[0].test_indices().is_empty());
        assert_eq!(folds[3].train, 6..8);

        let covered: Vec<usize> = folds
            .iter()
            .flat_map(|f| f.train_indices().into_iter().chain(f.test_indices()))
            .collect();
        assert!(!covered.contains(&8));
    }

    #[test]
    fn test_empty_dataset_yields_empty_folds() {
        let splitter = BlockingTimeSeriesSplit::new(3, 0.5, 0).unwrap();
        let folds: Vec<Fold> = splitter.split_len(0).collect();

        assert_eq!(folds.len(), 3);
        for fold in &folds {
            assert!(fold.train.is_empty());
            assert!(fold.test.is_empty());
        }
    }

    #[test]
    fn test_more_folds_than_samples() {
        let splitter = BlockingTimeSeriesSplit::new(8, 0.7, 2).unwrap();
        let folds: Vec<Fold> = splitter.split_len(5).collect();

        assert_eq!(folds.len(), 8);
        assert!(folds.iter().all(|f| f.train_len() == 0 && f.test_len() == 0));
    }

    #[test]
    fn test_zero_folds_rejected() {
        let err = BlockingTimeSeriesSplit::new(0, 0.8, 0).unwrap_err();
        assert!(matches!(err, SplitError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("n_splits"));
    }

    #[test]
    fn test_train_size_out_of_range_rejected() {
        for bad in [0.0, -0.2, 1.01, f64::NAN, f64::INFINITY] {
            assert!(
                BlockingTimeSeriesSplit::new(5, bad, 0).is_err(),
                "train_size {} should be rejected",
                bad
            );
        }
        assert!(BlockingTimeSeriesSplit::new(5, 1.0, 0).is_ok());
    }

    #[test]
    fn test_small_fraction_gives_empty_train() {
        let splitter = BlockingTimeSeriesSplit::new(2, 0.1, 0).unwrap();
        let fold = splitter.fold(10, 1).unwrap();

        assert_eq!(fold.train, 5..5);
        assert_eq!(fold.test_indices(), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_gap_matches_margin() {
        let splitter = BlockingTimeSeriesSplit::new(4, 0.5, 3).unwrap();
        let fold = splitter.fold(100, 2).unwrap();

        assert_eq!(fold.train, 50..62);
        assert_eq!(fold.gap(), 62..65);
        assert_eq!(fold.test, 65..75);
    }

    #[test]
    fn test_fold_out_of_range() {
        let splitter = BlockingTimeSeriesSplit::new(3, 0.8, 0).unwrap();
        assert!(splitter.fold(30, 3).is_none());
    }

    #[test]
    fn test_split_is_restartable() {
        let splitter = BlockingTimeSeriesSplit::new(6, 0.75, 2).unwrap();

        let mut partial = splitter.split_len(250);
        partial.next();
        partial.next();
        drop(partial);

        let first: Vec<Fold> = splitter.split_len(250).collect();
        let second: Vec<Fold> = splitter.split_len(250).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_exact_size_and_reverse() {
        let splitter = BlockingTimeSeriesSplit::new(4, 0.8, 0).unwrap();
        let mut splits = splitter.split_len(40);

        assert_eq!(splits.len(), 4);
        splits.next();
        assert_eq!(splits.len(), 3);

        let reversed: Vec<usize> = splitter.split_len(40).rev().map(|f| f.index).collect();
        assert_eq!(reversed, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_cross_validator_interface() {
        let splitter = BlockingTimeSeriesSplit::new(5, 0.8, 0).unwrap();
        let x = vec![[0.0_f64; 3]; 23];
        let y = vec![0.0_f64; 23];

        assert_eq!(splitter.get_n_splits(&x, Some(&y), None), 5);
        assert_eq!(splitter.get_n_splits(&Vec::<f64>::new(), None, None), 5);

        let via_trait: Vec<Fold> = CrossValidator::split(&splitter, &x, Some(&y), None).collect();
        let direct: Vec<Fold> = splitter.folds(&x).collect();
        assert_eq!(via_trait, direct);
    }

    #[test]
    fn test_shared_across_threads() {
        use rayon::prelude::*;

        let splitter = BlockingTimeSeriesSplit::new(7, 0.6, 1).unwrap();
        let expected: Vec<Fold> = splitter.split_len(1000).collect();

        let all_equal = (0..64)
            .into_par_iter()
            .map(|_| splitter.split_len(1000).collect::<Vec<_>>())
            .all(|folds| folds == expected);
        assert!(all_equal);
    }

    #[test]
    fn test_fold_serializes_ranges() {
        let fold = Fold {
            index: 0,
            train: 0..4,
            test: 5..6,
        };
        let json = serde_json::to_string(&fold).unwrap();
        let parsed: Fold = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fold);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_splitter() -> impl Strategy<Value = BlockingTimeSeriesSplit> {
            (1usize..=20, 0.01f64..=1.0, 0usize..=10).prop_map(|(k, f, m)| {
                BlockingTimeSeriesSplit::new(k, f, m).expect("strategy yields valid configs")
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn prop_yields_n_splits(splitter in arb_splitter(), n in 0usize..500) {
                prop_assert_eq!(splitter.split_len(n).count(), splitter.n_splits());
            }

            #[test]
            fn prop_train_precedes_test(splitter in arb_splitter(), n in 0usize..500) {
                for fold in splitter.split_len(n) {
                    prop_assert!(fold.train.start <= fold.train.end);
                    prop_assert!(fold.test.start <= fold.test.end);
                    prop_assert!(fold.train.end <= fold.test.start);
                    if !fold.test.is_empty() {
                        prop_assert_eq!(fold.gap().len(), splitter.margin());
                    }
                }
            }

            #[test]
            fn prop_blocks_stay_in_bounds(splitter in arb_splitter(), n in 0usize..500) {
                let folds: Vec<Fold> = splitter.split_len(n).collect();
                for fold in &folds {
                    prop_assert!(fold.test.end <= n);
                    prop_assert!(fold.train.end <= n);
                }
                for pair in folds.windows(2) {
                    let prev_stop = pair[0].test.end.max(pair[0].train.end);
                    prop_assert!(prev_stop <= pair[1].train.start);
                }
            }

            #[test]
            fn prop_split_is_deterministic(splitter in arb_splitter(), n in 0usize..500) {
                let first: Vec<Fold> = splitter.split_len(n).collect();
                let second: Vec<Fold> = splitter.split_len(n).collect();
                prop_assert_eq!(first, second);
            }
        }
    }
}
