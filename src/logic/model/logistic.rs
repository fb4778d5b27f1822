//! Multinomial logistic regression (softmax), full-batch gradient descent
//! with L2 penalty. Features are expected to be standardized.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::classifier::{check_attribution_input, check_training_input, ensure_finite, AttributionError, Classifier};
use super::types::{ClassProbabilities, N_CLASSES};
use crate::error::TrainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,

    /// (N_CLASSES x n_features)
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.5,
            max_iter: 1000,
            tolerance: 1e-6,
            weights: Array2::zeros((N_CLASSES, 0)),
            bias: Array1::zeros(N_CLASSES),
        }
    }
}

impl LogisticRegression {
    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    fn logits(&self, x: &[f64]) -> [f64; N_CLASSES] {
        let mut out = [0.0; N_CLASSES];
        for (k, o) in out.iter_mut().enumerate() {
            *o = self.bias[k]
                + self.weights.row(k).iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
        }
        out
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError> {
        check_training_input(x, y)?;

        let (n, d) = x.dim();
        let mut targets = Array2::<f64>::zeros((n, N_CLASSES));
        for (i, &label) in y.iter().enumerate() {
            if label < N_CLASSES {
                targets[[i, label]] = 1.0;
            }
        }

        let lambda = 1.0 / (self.c.max(1e-12) * n as f64);
        let mut weights = Array2::<f64>::zeros((N_CLASSES, d));
        let mut bias = Array1::<f64>::zeros(N_CLASSES);

        let mut iterations = 0;
        for _ in 0..self.max_iter {
            iterations += 1;

            let mut probs = x.dot(&weights.t()) + &bias;
            for mut row in probs.rows_mut() {
                let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                row.mapv_inplace(|v| (v - max).exp());
                let sum = row.sum();
                row.mapv_inplace(|v| v / sum);
            }

            let residual = probs - &targets;
            let grad_w = residual.t().dot(x) / n as f64 + &weights * lambda;
            let grad_b = residual.sum_axis(Axis(0)) / n as f64;

            weights = weights - &grad_w * self.learning_rate;
            bias = bias - &grad_b * self.learning_rate;

            let grad_norm = grad_w.iter().chain(grad_b.iter()).map(|g| g * g).sum::<f64>().sqrt();
            if !grad_norm.is_finite() {
                return Err(TrainError::Diverged(self.name()));
            }
            if grad_norm < self.tolerance {
                break;
            }
        }

        log::debug!("LogisticRegression stopped after {} iterations", iterations);

        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn predict_proba(&self, x: &[f64]) -> Option<ClassProbabilities> {
        if self.n_features() == 0 || x.len() != self.n_features() {
            return None;
        }
        ClassProbabilities::softmax(self.logits(x))
    }

    /// w_cj * x_j on the class logit; features are centered by the scaler,
    /// so this is the exact linear attribution against the training mean.
    fn contributions(&self, x: &[f64], class: usize) -> Result<Vec<f64>, AttributionError> {
        check_attribution_input(x, self.n_features(), class)?;
        ensure_finite(
            self.weights
                .row(class)
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [-2.0, 0.1], [-1.8, -0.2], [-2.2, 0.0],
            [0.0, 2.0], [0.1, 1.8], [-0.1, 2.2],
            [2.0, -0.1], [1.9, 0.2], [2.1, 0.0],
        ];
        (x, vec![0, 0, 0, 1, 1, 1, 2, 2, 2])
    }

    #[test]
    fn test_fit_separable() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict_proba(&[-2.0, 0.0]).unwrap().argmax().index(), 0);
        assert_eq!(model.predict_proba(&[0.0, 2.0]).unwrap().argmax().index(), 1);
        assert_eq!(model.predict_proba(&[2.0, 0.0]).unwrap().argmax().index(), 2);
    }

    #[test]
    fn test_contributions_match_logit() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();

        let row = [1.5, -0.5];
        let contrib = model.contributions(&row, 2).unwrap();
        let logit = model.logits(&row)[2];
        let total: f64 = contrib.iter().sum::<f64>() + model.bias[2];
        assert!((total - logit).abs() < 1e-9);
        assert!(contrib[0] > 0.0);
    }

    #[test]
    fn test_divergence_names_family() {
        let (x, y) = separable();
        let mut model = LogisticRegression { learning_rate: f64::MAX, ..Default::default() };
        assert!(matches!(
            model.fit(&(x * 1e6), &y),
            Err(TrainError::Diverged("LogisticRegression"))
        ));
    }

    #[test]
    fn test_wrong_width() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert!(model.predict_proba(&[1.0]).is_none());
        assert!(matches!(
            model.contributions(&[1.0], 0),
            Err(AttributionError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }
}
