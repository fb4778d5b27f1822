//! CART decision tree shared by the forest and boosting families
//!
//! Classification trees split on gini and store class frequencies in every
//! node; gradient trees split on squared error of the residuals and store a
//! Newton step in every node. Internal node values make path attribution
//! (sum of value changes along the decision path) exact.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Split feature (None for leaves)
    pub feature: Option<usize>,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    /// Class distribution (classification) or single output (gradient)
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// What the tree is fitted against
pub enum Target<'a> {
    Classes { labels: &'a [usize], n_classes: usize },
    /// Residuals/hessians of one boosting output; `shrink` scales the Newton step
    Gradient { residuals: &'a [f64], hessians: &'a [f64], shrink: f64 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn fit(
        x: &Array2<f64>,
        target: &Target<'_>,
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder { x, target, params, rng, nodes: Vec::new() };
        builder.build(samples.to_vec(), 0);
        Self { nodes: builder.nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf value vector reached by `x`
    pub fn predict(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        while let Some(node) = self.nodes.get(idx) {
            match node.feature {
                Some(f) => idx = if x[f] <= node.threshold { node.left } else { node.right },
                None => return &node.value,
            }
        }
        &[]
    }

    /// Adds `scale * (child - parent)` of `output` to the split feature for
    /// every split on the decision path.
    pub fn accumulate_contributions(&self, x: &[f64], output: usize, scale: f64, out: &mut [f64]) {
        let mut idx = 0;
        while let Some(node) = self.nodes.get(idx) {
            let Some(f) = node.feature else { break };
            let next = if x[f] <= node.threshold { node.left } else { node.right };
            let (Some(child), Some(parent)) = (
                self.nodes.get(next).and_then(|n| n.value.get(output)),
                node.value.get(output),
            ) else {
                break;
            };
            out[f] += scale * (child - parent);
            idx = next;
        }
    }

    /// Output of the root node (the path-attribution baseline)
    pub fn root_value(&self, output: usize) -> f64 {
        self.nodes
            .first()
            .and_then(|n| n.value.get(output))
            .copied()
            .unwrap_or(0.0)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

struct Builder<'a, 'b> {
    x: &'a Array2<f64>,
    target: &'a Target<'b>,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<TreeNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Builder<'_, '_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: None,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: self.node_value(&samples),
        });

        let can_split = depth < self.params.max_depth
            && samples.len() >= self.params.min_samples_split.max(2)
            && samples.len() >= 2 * self.params.min_samples_leaf.max(1);

        if can_split {
            if let Some(split) = self.best_split(&samples) {
                let left = self.build(split.left, depth + 1);
                let right = self.build(split.right, depth + 1);
                let node = &mut self.nodes[idx];
                node.feature = Some(split.feature);
                node.threshold = split.threshold;
                node.left = left;
                node.right = right;
            }
        }

        idx
    }

    fn node_value(&self, samples: &[usize]) -> Vec<f64> {
        match self.target {
            Target::Classes { labels, n_classes } => {
                let mut counts = vec![0.0; *n_classes];
                for &i in samples {
                    if let Some(c) = counts.get_mut(labels[i]) {
                        *c += 1.0;
                    }
                }
                let n = samples.len().max(1) as f64;
                counts.iter_mut().for_each(|c| *c /= n);
                counts
            }
            Target::Gradient { residuals, hessians, shrink } => {
                let sum_r: f64 = samples.iter().map(|&i| residuals[i]).sum();
                let sum_h: f64 = samples.iter().map(|&i| hessians[i]).sum();
                let step = if sum_h.abs() < 1e-12 { 0.0 } else { shrink * sum_r / sum_h };
                vec![step]
            }
        }
    }

    /// Higher is better: Σ c²/n for gini, (Σr)²/n for squared error.
    fn score(&self, stats: &[f64], n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        match self.target {
            Target::Classes { .. } => stats.iter().map(|c| c * c).sum::<f64>() / n as f64,
            Target::Gradient { .. } => stats[0] * stats[0] / n as f64,
        }
    }

    fn add_stats(&self, stats: &mut [f64], sample: usize, sign: f64) {
        match self.target {
            Target::Classes { labels, .. } => {
                if let Some(c) = stats.get_mut(labels[sample]) {
                    *c += sign;
                }
            }
            Target::Gradient { residuals, .. } => stats[0] += sign * residuals[sample],
        }
    }

    fn empty_stats(&self) -> Vec<f64> {
        match self.target {
            Target::Classes { n_classes, .. } => vec![0.0; *n_classes],
            Target::Gradient { .. } => vec![0.0],
        }
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let n_features = self.x.ncols();
        let features: Vec<usize> = match self.params.max_features {
            Some(m) if m > 0 && m < n_features => sample(&mut *self.rng, n_features, m).into_vec(),
            _ => (0..n_features).collect(),
        };

        let mut total = self.empty_stats();
        for &i in samples {
            self.add_stats(&mut total, i, 1.0);
        }
        let parent_score = self.score(&total, samples.len());
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<(f64, usize, f64)> = None;
        let mut sorted = samples.to_vec();

        for &f in &features {
            sorted.sort_by(|&a, &b| {
                self.x[[a, f]]
                    .partial_cmp(&self.x[[b, f]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left = self.empty_stats();
            let mut right = total.clone();

            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                self.add_stats(&mut left, i, 1.0);
                self.add_stats(&mut right, i, -1.0);

                let n_left = pos + 1;
                let n_right = sorted.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let here = self.x[[i, f]];
                let next = self.x[[sorted[pos + 1], f]];
                if next <= here {
                    continue;
                }

                let gain = self.score(&left, n_left) + self.score(&right, n_right) - parent_score;
                if gain > 1e-12 && best.map_or(true, |(g, _, _)| gain > g) {
                    best = Some((gain, f, (here + next) / 2.0));
                }
            }
        }

        let (_, feature, threshold) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().partition(|&&i| self.x[[i, feature]] <= threshold);

        Some(Split { feature, threshold, left, right })
    }
}
