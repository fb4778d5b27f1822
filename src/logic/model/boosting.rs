//! Gradient boosting with multinomial deviance.
//!
//! One regression tree per class per round fitted on `y - p`; leaves take a
//! single Newton step scaled by (K-1)/K. Scores start at the log class prior.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::classifier::{check_attribution_input, check_training_input, ensure_finite, AttributionError, Classifier};
use super::tree::{DecisionTree, Target, TreeParams};
use super::types::{ClassProbabilities, N_CLASSES};
use crate::error::TrainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Row fraction drawn per round (1.0 = deterministic full batch)
    pub subsample: f64,
    pub seed: u64,

    pub n_features: usize,
    pub init: [f64; N_CLASSES],
    /// rounds x classes
    pub trees: Vec<Vec<DecisionTree>>,
}

impl GradientBoosting {
    pub fn new(seed: u64) -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed,
            n_features: 0,
            init: [0.0; N_CLASSES],
            trees: Vec::new(),
        }
    }

    fn raw_scores(&self, x: &[f64]) -> [f64; N_CLASSES] {
        let mut scores = self.init;
        for round in &self.trees {
            for (k, tree) in round.iter().enumerate().take(N_CLASSES) {
                if let Some(v) = tree.predict(x).first() {
                    scores[k] += self.learning_rate * v;
                }
            }
        }
        scores
    }
}

fn softmax_row(scores: &[f64]) -> [f64; N_CLASSES] {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out = [0.0; N_CLASSES];
    for (o, s) in out.iter_mut().zip(scores) {
        *o = (s - max).exp();
    }
    let sum: f64 = out.iter().sum();
    out.iter_mut().for_each(|o| *o /= sum);
    out
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &'static str {
        "GradientBoosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError> {
        check_training_input(x, y)?;

        let (n, d) = x.dim();
        let mut counts = [0.0f64; N_CLASSES];
        for &label in y {
            if let Some(c) = counts.get_mut(label) {
                *c += 1.0;
            }
        }
        let mut init = [0.0f64; N_CLASSES];
        for (i, c) in init.iter_mut().zip(counts) {
            // Absent classes get a large negative prior instead of -inf
            *i = (c.max(1e-3) / n as f64).ln();
        }

        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
        };
        let shrink = (N_CLASSES as f64 - 1.0) / N_CLASSES as f64;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut f = Array2::<f64>::zeros((n, N_CLASSES));
        for mut row in f.rows_mut() {
            row.iter_mut().zip(init).for_each(|(v, i)| *v = i);
        }

        let all_rows: Vec<usize> = (0..n).collect();
        let mut trees = Vec::with_capacity(self.n_rounds);

        for _ in 0..self.n_rounds {
            let probs: Vec<[f64; N_CLASSES]> = f
                .rows()
                .into_iter()
                .map(|r| softmax_row(&r.to_vec()))
                .collect();

            let rows = if self.subsample < 1.0 {
                let m = ((n as f64 * self.subsample).round() as usize).clamp(1, n);
                sample(&mut rng, n, m).into_vec()
            } else {
                all_rows.clone()
            };

            let mut round = Vec::with_capacity(N_CLASSES);
            for k in 0..N_CLASSES {
                let residuals: Vec<f64> = (0..n)
                    .map(|i| {
                        let truth = if y[i] == k { 1.0 } else { 0.0 };
                        truth - probs[i][k]
                    })
                    .collect();
                let hessians: Vec<f64> =
                    residuals.iter().map(|r| r.abs() * (1.0 - r.abs())).collect();
                let target = Target::Gradient { residuals: &residuals, hessians: &hessians, shrink };

                let tree = DecisionTree::fit(x, &target, &rows, &params, &mut rng);
                for i in 0..n {
                    if let Some(v) = tree.predict(&x.row(i).to_vec()).first() {
                        f[[i, k]] += self.learning_rate * v;
                    }
                }
                round.push(tree);
            }
            trees.push(round);
        }

        if f.iter().any(|v| !v.is_finite()) {
            return Err(TrainError::Diverged(self.name()));
        }

        self.init = init;
        self.trees = trees;
        self.n_features = d;

        log::debug!("GradientBoosting fitted {} rounds on {} rows", self.trees.len(), n);
        Ok(())
    }

    fn predict_proba(&self, x: &[f64]) -> Option<ClassProbabilities> {
        if self.trees.is_empty() || x.len() != self.n_features {
            return None;
        }
        ClassProbabilities::softmax(self.raw_scores(x))
    }

    /// Path attribution on the class's raw (logit) score
    fn contributions(&self, x: &[f64], class: usize) -> Result<Vec<f64>, AttributionError> {
        let fitted = if self.trees.is_empty() { 0 } else { self.n_features };
        check_attribution_input(x, fitted, class)?;

        let mut out = vec![0.0; self.n_features];
        for round in &self.trees {
            if let Some(tree) = round.get(class) {
                tree.accumulate_contributions(x, 0, self.learning_rate, &mut out);
            }
        }
        ensure_finite(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn data() -> (Array2<f64>, Vec<usize>) {
        let x = array![
            [0.0, 1.0], [0.3, 0.8], [0.1, 1.2], [0.2, 0.9],
            [3.0, 0.0], [3.2, 0.1], [2.9, -0.1], [3.1, 0.2],
            [6.0, -1.0], [6.2, -0.9], [5.9, -1.1], [6.1, -1.0],
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2])
    }

    #[test]
    fn test_boosting_fits_training_data() {
        let (x, y) = data();
        let mut model = GradientBoosting::new(42);
        model.n_rounds = 30;
        model.fit(&x, &y).unwrap();

        for (i, &label) in y.iter().enumerate() {
            let row = x.row(i).to_vec();
            assert_eq!(model.predict_proba(&row).unwrap().argmax().index(), label);
        }
    }

    #[test]
    fn test_init_is_log_prior() {
        let (x, y) = data();
        let mut model = GradientBoosting::new(0);
        model.n_rounds = 1;
        model.fit(&x, &y).unwrap();
        for v in model.init {
            assert!((v - (1.0f64 / 3.0).ln()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contributions_reconstruct_score() {
        let (x, y) = data();
        let mut model = GradientBoosting::new(1);
        model.n_rounds = 10;
        model.fit(&x, &y).unwrap();

        let row = [5.5, -0.8];
        let contrib = model.contributions(&row, 2).unwrap();
        let base = model.init[2]
            + model
                .trees
                .iter()
                .map(|r| model.learning_rate * r[2].root_value(0))
                .sum::<f64>();
        let score = model.raw_scores(&row)[2];
        assert!((base + contrib.iter().sum::<f64>() - score).abs() < 1e-9);
    }
}
