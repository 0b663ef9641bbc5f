//! Seeded train/test partitioning

use anyhow::Result;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Name of the column carrying each row's position in the raw file.
/// The processing stage drops it along with the other extraneous columns.
pub const INDEX_COLUMN: &str = "Unnamed: 0";

/// Row counts `(n_train, n_test)` for `n` rows at the given train ratio.
///
/// The test size is rounded up, so 100 rows at 0.8 give 80/20 and 101 rows
/// give 80/21.
pub fn split_sizes(n: usize, train_ratio: f64) -> (usize, usize) {
    // Tolerance absorbs representation error in `1 - ratio`
    let n_test = (((1.0 - train_ratio) * n as f64) - 1e-9).ceil().max(0.0) as usize;
    let n_test = n_test.min(n);
    (n - n_test, n_test)
}

/// Shuffle rows with a fixed seed and cut them into train and test tables.
///
/// Both tables get a leading [`INDEX_COLUMN`] holding the raw row position.
/// The same input, ratio and seed always give the same partition.
pub fn train_test_split(
    df: &DataFrame,
    train_ratio: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        anyhow::bail!(
            "Train ratio must be between 0 and 1 (exclusive), got {}",
            train_ratio
        );
    }

    let n = df.height();
    let (n_train, n_test) = split_sizes(n, train_ratio);
    if n_train == 0 || n_test == 0 {
        anyhow::bail!(
            "Splitting {} row(s) at ratio {} leaves an empty partition ({} train, {} test)",
            n,
            train_ratio,
            n_train,
            n_test
        );
    }

    let mut permutation: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let indexed = df.with_row_index(INDEX_COLUMN.into(), None)?;

    let test_idx = IdxCa::from_vec("idx".into(), permutation[..n_test].to_vec());
    let train_idx = IdxCa::from_vec("idx".into(), permutation[n_test..].to_vec());

    let train = indexed.take(&train_idx)?;
    let test = indexed.take(&test_idx)?;
    Ok((train, test))
}
