//! Per-column feature standardization.
//!
//! Fit parameters are retained so the interactive predictor can apply the
//! exact transform the model was trained with.

use ndarray::Array2;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Zero-mean, unit-variance scaling per column. Constant columns pass
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let mut means = Vec::with_capacity(x.ncols());
        let mut stds = Vec::with_capacity(x.ncols());

        for col in x.columns() {
            let values: Vec<f64> = col.iter().copied().collect();
            let m = mean(&values);
            let sd = stddev(&values, m);
            means.push(m);
            stds.push(if sd == 0.0 { 1.0 } else { sd });
        }

        Self { means, stds }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.means[j]) / self.stds[j];
            }
        }
        out
    }

    /// Applies the fitted transform to a single raw feature vector.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, value)| (value - self.means[j]) / self.stds[j])
            .collect()
    }
}
