//! Held-out evaluation: accuracy and a per-class classification report.

use std::fmt;

/// Precision/recall/F1 for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Accuracy plus per-class metrics over a held-out split.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<(String, ClassMetrics)>,
}

/// Computes a binary classification report for jam (1) vs no-jam (0) labels.
pub fn classification_report(y_true: &[i32], y_pred: &[i32]) -> ClassificationReport {
    let n_samples = y_true.len();
    if n_samples == 0 {
        return ClassificationReport {
            accuracy: 0.0,
            classes: Vec::new(),
        };
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    let accuracy = correct as f64 / n_samples as f64;

    let mut classes = Vec::new();
    for (class, label) in [(0, "no_jam"), (1, "jam")] {
        let tp = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| **t == class && **p == class)
            .count();
        let fp = y_pred
            .iter()
            .zip(y_true.iter())
            .filter(|(p, t)| **p == class && **t != class)
            .count();
        let fn_count = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| **t == class && **p != class)
            .count();

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let support = y_true.iter().filter(|&&t| t == class).count();

        classes.push((
            label.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1_score,
                support,
            },
        ));
    }

    ClassificationReport { accuracy, classes }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        let total: usize = self.classes.iter().map(|(_, m)| m.support).sum();
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, total
        )
    }
}
