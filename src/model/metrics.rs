//! Classification metrics for the held-out evaluation

use serde::{Deserialize, Serialize};

/// Accuracy plus macro-averaged precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// `confusion_matrix[actual][predicted]`
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl ClassificationMetrics {
    /// Score predictions against true class indices (both `< n_classes`).
    ///
    /// A class with no predictions contributes precision 0; a class absent
    /// from the truth contributes recall 0. Empty input scores 0 everywhere.
    pub fn compute(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        let mut confusion = vec![vec![0usize; n_classes]; n_classes];
        for (&actual, &predicted) in y_true.iter().zip(y_pred) {
            confusion[actual][predicted] += 1;
        }

        let total = y_true.len().min(y_pred.len());
        let correct: usize = (0..n_classes).map(|c| confusion[c][c]).sum();
        let accuracy = ratio(correct, total);

        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        let mut f1_sum = 0.0;
        for class in 0..n_classes {
            let tp = confusion[class][class];
            let predicted: usize = confusion.iter().map(|row| row[class]).sum();
            let actual: usize = confusion[class].iter().sum();

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, actual);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            precision_sum += precision;
            recall_sum += recall;
            f1_sum += f1;
        }

        let classes = n_classes.max(1) as f64;
        Self {
            accuracy,
            precision: precision_sum / classes,
            recall: recall_sum / classes,
            f1_score: f1_sum / classes,
            confusion_matrix: confusion,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
