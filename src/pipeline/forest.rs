//! Random forest of CART classification trees
//!
//! Used for ranking features by mean decrease in impurity and as the default
//! model of the training stage. Trees are grown on bootstrap samples with
//! `sqrt(n_features)` candidate features per node and Gini impurity.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::matrix::FeatureMatrix;
use crate::config::ForestParams;

/// Values closer than this are treated as equal when searching for splits
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Gini impurity for multi-class counts: `1 - sum(p_k^2)`
fn gini_impurity(counts: &[f64], total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|&c| (c / total) * (c / total)).sum::<f64>()
}

/// A node of a fitted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Class probabilities of the training samples that reached this leaf
    Leaf { distribution: Vec<f64> },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A single fitted classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Class probabilities for one row of feature values
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Grows one tree and accumulates its impurity decreases per feature
struct TreeBuilder<'a> {
    x: &'a FeatureMatrix,
    y: &'a [usize],
    n_classes: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, samples: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &s in samples {
            counts[self.y[s]] += 1.0;
        }
        counts
    }

    /// Build the subtree for `samples`, returning its node index
    fn build(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len() as f64;
        let counts = self.class_counts(samples);
        let impurity = gini_impurity(&counts, n);

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        let split = if samples.len() < self.min_samples_split || impurity <= 0.0 || depth_reached {
            None
        } else {
            self.find_split(samples, &counts, impurity)
        };

        let Some(split) = split else {
            let distribution = counts.iter().map(|&c| c / n).collect();
            self.nodes.push(Node::Leaf { distribution });
            return self.nodes.len() - 1;
        };

        self.importances[split.feature] += n * split.gain;

        let mid = partition(samples, |s| {
            self.x.value(s, split.feature) <= split.threshold
        });

        let index = self.nodes.len();
        self.nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });

        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    /// Search up to `max_features` non-constant features in random order
    fn find_split(
        &mut self,
        samples: &[usize],
        parent_counts: &[f64],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.x.n_features()).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

        for feature in features {
            if visited >= self.max_features {
                break;
            }

            pairs.clear();
            pairs.extend(samples.iter().map(|&s| (self.x.value(s, feature), self.y[s])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = (pairs[0].0, pairs[pairs.len() - 1].0);
            if last - first <= FEATURE_THRESHOLD {
                continue;
            }
            visited += 1;

            if let Some((threshold, gain)) = best_threshold(&pairs, parent_counts, parent_impurity)
            {
                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Best threshold on value-sorted `(value, class)` pairs, with its impurity
/// decrease. Never splits between equal values.
fn best_threshold(
    sorted_pairs: &[(f64, usize)],
    parent_counts: &[f64],
    parent_impurity: f64,
) -> Option<(f64, f64)> {
    let n = sorted_pairs.len();
    let total = n as f64;
    let mut left_counts = vec![0.0; parent_counts.len()];
    let mut right_counts = parent_counts.to_vec();

    let mut best: Option<(f64, f64)> = None;

    for i in 0..n - 1 {
        let (value, class) = sorted_pairs[i];
        left_counts[class] += 1.0;
        right_counts[class] -= 1.0;

        let next = sorted_pairs[i + 1].0;
        if next <= value + FEATURE_THRESHOLD {
            continue;
        }

        let left_total = (i + 1) as f64;
        let right_total = total - left_total;
        let child_impurity = (left_total * gini_impurity(&left_counts, left_total)
            + right_total * gini_impurity(&right_counts, right_total))
            / total;
        let gain = parent_impurity - child_impurity;

        if best.map_or(true, |(_, g)| gain > g) {
            let mut threshold = value / 2.0 + next / 2.0;
            if threshold >= next || !threshold.is_finite() {
                threshold = value;
            }
            best = Some((threshold, gain));
        }
    }

    best
}

/// Reorder `samples` so that entries satisfying `goes_left` come first;
/// returns how many did
fn partition(samples: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..samples.len() {
        if goes_left(samples[i]) {
            samples.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

/// Ensemble of bootstrap-trained trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on `x` with class indices `y` (each `< classes.len()`)
    pub fn fit(
        x: &FeatureMatrix,
        y: &[usize],
        classes: Vec<String>,
        params: &ForestParams,
    ) -> Result<Self> {
        let n_rows = x.n_rows();
        let n_features = x.n_features();

        if n_rows == 0 {
            anyhow::bail!("Cannot fit a forest on an empty table");
        }
        if n_features == 0 {
            anyhow::bail!("Cannot fit a forest without feature columns");
        }
        if y.len() != n_rows {
            anyhow::bail!(
                "Label count {} does not match row count {}",
                y.len(),
                n_rows
            );
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= classes.len()) {
            anyhow::bail!("Class index {} out of range for {} classes", bad, classes.len());
        }

        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(params.random_state);
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importances = vec![0.0; n_features];

        for _ in 0..params.n_estimators {
            let tree_seed: u64 = rng.gen();
            let mut tree_rng = StdRng::seed_from_u64(tree_seed);
            let mut samples: Vec<usize> = (0..n_rows).map(|_| tree_rng.gen_range(0..n_rows)).collect();

            let mut builder = TreeBuilder {
                x,
                y,
                n_classes: classes.len(),
                max_features,
                max_depth: params.max_depth,
                min_samples_split: params.min_samples_split,
                rng: tree_rng,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.build(&mut samples, 0);

            let tree_total: f64 = builder.importances.iter().sum();
            if tree_total > 0.0 {
                for (acc, value) in importances.iter_mut().zip(&builder.importances) {
                    *acc += value / tree_total;
                }
            }
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Ok(Self {
            feature_names: x.names.clone(),
            classes,
            trees,
            importances,
        })
    }

    /// Normalised mean decrease in impurity per feature (sums to 1 unless
    /// no tree could split)
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Averaged class probabilities across trees
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let count = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= count);
        proba
    }

    /// Most probable class index (lowest index on ties)
    pub fn predict(&self, row: &[f64]) -> usize {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (class, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = class;
            }
        }
        best
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
