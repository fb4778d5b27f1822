//! Random forest: bootstrap-bagged gini trees with sqrt feature subsampling.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::classifier::{check_attribution_input, check_training_input, ensure_finite, AttributionError, Classifier};
use super::tree::{DecisionTree, Target, TreeParams};
use super::types::{ClassProbabilities, N_CLASSES};
use crate::error::TrainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,

    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(seed: u64) -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_leaf: 1,
            seed,
            n_features: 0,
            trees: Vec::new(),
        }
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), TrainError> {
        check_training_input(x, y)?;

        let (n, d) = x.dim();
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            min_samples_leaf: self.min_samples_leaf,
            max_features: Some(((d as f64).sqrt().round() as usize).max(1)),
        };
        let target = Target::Classes { labels: y, n_classes: N_CLASSES };
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.trees = (0..self.n_trees.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, &target, &bootstrap, &params, &mut rng)
            })
            .collect();
        self.n_features = d;

        log::debug!("RandomForest fitted {} trees on {} rows", self.trees.len(), n);
        Ok(())
    }

    fn predict_proba(&self, x: &[f64]) -> Option<ClassProbabilities> {
        if self.trees.is_empty() || x.len() != self.n_features {
            return None;
        }
        let mut scores = [0.0; N_CLASSES];
        for tree in &self.trees {
            for (s, v) in scores.iter_mut().zip(tree.predict(x)) {
                *s += v;
            }
        }
        ClassProbabilities::from_scores(scores)
    }

    /// Mean path attribution over trees on the class probability
    fn contributions(&self, x: &[f64], class: usize) -> Result<Vec<f64>, AttributionError> {
        let fitted = if self.trees.is_empty() { 0 } else { self.n_features };
        check_attribution_input(x, fitted, class)?;

        let mut out = vec![0.0; self.n_features];
        let scale = 1.0 / self.trees.len() as f64;
        for tree in &self.trees {
            tree.accumulate_contributions(x, class, scale, &mut out);
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
            [0.0, 0.1], [0.2, 0.0], [0.1, 0.2], [0.3, 0.1],
            [5.0, 0.0], [5.2, 0.1], [4.9, 0.2], [5.1, 0.0],
            [10.0, 0.1], [10.2, 0.0], [9.9, 0.2], [10.1, 0.1],
        ];
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2])
    }

    #[test]
    fn test_forest_separates_classes() {
        let (x, y) = data();
        let mut forest = RandomForest::new(42);
        forest.n_trees = 25;
        forest.fit(&x, &y).unwrap();

        let p = forest.predict_proba(&[10.0, 0.1]).unwrap();
        assert_eq!(p.argmax().index(), 2);
        let sum: f64 = p.as_array().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = data();
        let mut a = RandomForest::new(7);
        let mut b = RandomForest::new(7);
        a.n_trees = 10;
        b.n_trees = 10;
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&[4.0, 0.1]), b.predict_proba(&[4.0, 0.1]));
    }

    #[test]
    fn test_contributions_reconstruct_probability() {
        let (x, y) = data();
        let mut forest = RandomForest::new(3);
        forest.n_trees = 10;
        forest.fit(&x, &y).unwrap();

        let row = [9.0, 0.1];
        let contrib = forest.contributions(&row, 2).unwrap();
        let base: f64 =
            forest.trees.iter().map(|t| t.root_value(2)).sum::<f64>() / forest.trees.len() as f64;
        let p = forest.predict_proba(&row).unwrap().at_risk();
        assert!((base + contrib.iter().sum::<f64>() - p).abs() < 1e-9);
    }
}
