//! Class balancing by synthetic minority oversampling (SMOTE)
//!
//! Every class below the majority count receives synthetic rows until all
//! classes have the same count. A synthetic row lies on the segment between a
//! randomly chosen class member and one of its nearest same-class neighbours.

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::matrix::FeatureMatrix;
use super::target::class_labels;

/// Neighbours considered per seed row
pub const K_NEIGHBORS: usize = 5;

/// Oversample minority classes of `target` up to the majority count.
///
/// Feature columns keep their order and dtype (integer columns are truncated
/// back after interpolation); the target column is moved to the end. Original
/// rows come first, synthetic rows follow grouped by class.
pub fn balance_classes(df: &DataFrame, target: &str, seed: u64) -> Result<DataFrame> {
    let labels = class_labels(df, target)?;
    if labels.classes.len() < 2 {
        anyhow::bail!(
            "Target column '{}' has {} class(es); balancing needs at least 2",
            target,
            labels.classes.len()
        );
    }

    let matrix = FeatureMatrix::from_frame(df, target)?;
    let counts = labels.counts();
    let majority = counts.iter().copied().max().unwrap_or(0);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut synthetic: Vec<Vec<f64>> = vec![Vec::new(); matrix.n_features()];
    let mut source_rows: Vec<IdxSize> = Vec::new();

    for (class, &count) in counts.iter().enumerate() {
        let needed = majority - count;
        if needed == 0 {
            continue;
        }
        if count < 2 {
            anyhow::bail!(
                "Class '{}' has a single row; at least 2 are needed to interpolate",
                labels.classes[class]
            );
        }

        let members: Vec<usize> = labels
            .y
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == class)
            .map(|(row, _)| row)
            .collect();
        let k = K_NEIGHBORS.min(count - 1);
        let neighbors = nearest_neighbors(&matrix, &members, k);

        for _ in 0..needed {
            let seed_pos = rng.gen_range(0..members.len());
            let neighbor_pos = neighbors[seed_pos][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();

            let a = members[seed_pos];
            let b = members[neighbor_pos];
            for (feature, out) in synthetic.iter_mut().enumerate() {
                let va = matrix.value(a, feature);
                let vb = matrix.value(b, feature);
                out.push(va + gap * (vb - va));
            }
            source_rows.push(a as IdxSize);
        }

        info!(
            "Class '{}': {} original row(s), {} synthetic row(s) added",
            labels.classes[class], count, needed
        );
    }

    let mut columns: Vec<Column> = Vec::with_capacity(matrix.n_features() + 1);
    for (feature, name) in matrix.names.iter().enumerate() {
        let mut values = matrix.column(feature).to_vec();
        values.extend_from_slice(&synthetic[feature]);
        let series = Series::new(name.as_str().into(), values)
            .cast(&matrix.dtypes[feature])
            .with_context(|| format!("Failed to restore dtype of column '{}'", name))?;
        columns.push(series.into());
    }

    let mut take: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    take.extend_from_slice(&source_rows);
    let indices = IdxCa::from_vec("idx".into(), take);
    let target_col = df.column(target)?.take(&indices)?;
    columns.push(target_col);

    let balanced = DataFrame::new(columns)?;
    info!(
        "Balanced '{}': {} rows -> {} rows",
        target,
        df.height(),
        balanced.height()
    );
    Ok(balanced)
}

/// For each member, positions (within `members`) of its `k` nearest members
/// by Euclidean distance, excluding itself. Ties resolve to the lower position.
fn nearest_neighbors(matrix: &FeatureMatrix, members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .iter()
        .enumerate()
        .map(|(i, &row)| {
            let mut candidates: Vec<(f64, usize)> = members
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, &other)| (matrix.squared_distance(row, other), j))
                .collect();

            let by_distance = |a: &(f64, usize), b: &(f64, usize)| {
                a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
            };
            if candidates.len() > k {
                candidates.select_nth_unstable_by(k - 1, by_distance);
                candidates.truncate(k);
            }
            candidates.sort_by(by_distance);
            candidates.into_iter().map(|(_, j)| j).collect()
        })
        .collect()
}
