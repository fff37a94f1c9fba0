//! Per-road logistic regression: standardize, split, fit, evaluate.

use crate::trainer::report::{ClassificationReport, classification_report};
use crate::trainer::scaler::StandardScaler;
use crate::trainer::types::FeatureTable;
use ndarray::Array2;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::LogisticRegression;
use smartcore::model_selection::train_test_split;
use tracing::warn;

/// Fixed split seed so training runs are reproducible.
pub const TRAIN_TEST_SEED: u64 = 123;
const TEST_FRACTION: f32 = 0.2;

/// A fitted jam classifier for one target road, with the standardization
/// parameters it was trained under.
pub struct RoadModel {
    pub road: String,
    pub feature_names: Vec<String>,
    pub accuracy: f64,
    pub report: ClassificationReport,
    scaler: StandardScaler,
    model: LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>,
}

/// Outcome of a single raw-feature prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct JamPrediction {
    pub jam: bool,
    pub p_jam: f64,
    pub p_clear: f64,
}

fn to_dense_matrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}

/// Trains a standardized logistic regression for one road.
///
/// Returns `None` for every recoverable skip condition: an empty feature
/// table, or a fit/predict failure (e.g. only one class present in the
/// data). The caller moves on to the next road.
pub fn train_road_model(road: &str, table: &FeatureTable) -> Option<RoadModel> {
    if table.is_empty() {
        warn!(road, "No overlapping feature data, skipping road");
        return None;
    }

    let scaler = StandardScaler::fit(&table.x);
    let x = to_dense_matrix(&scaler.transform(&table.x));

    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &table.y, TEST_FRACTION, true, Some(TRAIN_TEST_SEED));

    let model = match LogisticRegression::fit(&x_train, &y_train, Default::default()) {
        Ok(model) => model,
        Err(e) => {
            warn!(road, error = %e, "Logistic regression fit failed, skipping road");
            return None;
        }
    };

    let y_pred = match model.predict(&x_test) {
        Ok(pred) => pred,
        Err(e) => {
            warn!(road, error = %e, "Held-out prediction failed, skipping road");
            return None;
        }
    };

    let report = classification_report(&y_test, &y_pred);

    Some(RoadModel {
        road: road.to_string(),
        feature_names: table.feature_names.clone(),
        accuracy: report.accuracy,
        report,
        scaler,
        model,
    })
}

impl RoadModel {
    /// Intercept and per-feature coefficients of the fitted model.
    fn weights(&self) -> (f64, Vec<f64>) {
        let intercept = *self.model.intercept().get((0, 0));

        let coef = self.model.coefficients();
        let n = self.feature_names.len();
        // Binary models store a single coefficient row; tolerate either
        // orientation.
        let coefs = if coef.shape().0 == 1 {
            (0..n).map(|j| *coef.get((0, j))).collect()
        } else {
            (0..n).map(|j| *coef.get((j, 0))).collect()
        };

        (intercept, coefs)
    }

    /// The fitted linear decision boundary as a readable equation.
    pub fn decision_boundary(&self) -> String {
        let (intercept, coefs) = self.weights();

        let mut equation =
            format!("log(P(traffic_jam) / (1 - P(traffic_jam))) = {intercept:.4}");
        for (coef, feature) in coefs.iter().zip(&self.feature_names) {
            equation.push_str(&format!(" + ({coef:.4}) * {feature}"));
        }
        equation
    }

    /// Classifies one raw (unscaled) feature vector.
    ///
    /// Applies the stored standardization, then the logistic link on the
    /// fitted linear score.
    pub fn predict_one(&self, raw_features: &[f64]) -> JamPrediction {
        let scaled = self.scaler.transform_row(raw_features);
        let (intercept, coefs) = self.weights();

        let score: f64 = intercept
            + coefs
                .iter()
                .zip(&scaled)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        let p_jam = 1.0 / (1.0 + (-score).exp());

        JamPrediction {
            jam: p_jam >= 0.5,
            p_jam,
            p_clear: 1.0 - p_jam,
        }
    }
}
