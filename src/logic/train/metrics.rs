//! Held-out evaluation metrics
//!
//! Confusion matrix, per-class precision/recall/F1, macro-F1 and
//! one-vs-rest macro ROC-AUC. Recorded values are rounded to 4 decimals.

use serde::{Deserialize, Serialize};

use ndarray::Array2;

use crate::logic::model::{ClassProbabilities, Classifier, RiskCategory, N_CLASSES};

/// Round to 4 decimals, the precision metrics are recorded with
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

// ============================================================================
// CONFUSION MATRIX
// ============================================================================

/// `matrix[true][predicted]` counts over {High, Medium, At Risk}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix(pub [[usize; N_CLASSES]; N_CLASSES]);

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
        let mut m = [[0; N_CLASSES]; N_CLASSES];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t < N_CLASSES && p < N_CLASSES {
                m[t][p] += 1;
            }
        }
        Self(m)
    }

    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.0[class][class]
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..N_CLASSES).filter(|&i| i != class).map(|i| self.0[i][class]).sum()
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..N_CLASSES).filter(|&j| j != class).map(|j| self.0[class][j]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (0..N_CLASSES).map(|c| self.true_positives(c)).sum::<usize>() as f64 / total as f64
    }

    /// 0 when nothing was predicted as `class`
    pub fn precision(&self, class: usize) -> f64 {
        let tp = self.true_positives(class);
        let denom = tp + self.false_positives(class);
        if denom == 0 { 0.0 } else { tp as f64 / denom as f64 }
    }

    /// 0 when `class` has no true samples
    pub fn recall(&self, class: usize) -> f64 {
        let tp = self.true_positives(class);
        let denom = tp + self.false_negatives(class);
        if denom == 0 { 0.0 } else { tp as f64 / denom as f64 }
    }

    pub fn f1(&self, class: usize) -> f64 {
        let (p, r) = (self.precision(class), self.recall(class));
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn macro_f1(&self) -> f64 {
        (0..N_CLASSES).map(|c| self.f1(c)).sum::<f64>() / N_CLASSES as f64
    }
}

// ============================================================================
// ROC-AUC
// ============================================================================

/// Binary AUC via the rank-sum statistic (ties get average ranks).
/// `None` when either side has no samples.
fn binary_auc(scores: &[f64], positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = ranks.iter().zip(positive).filter(|(_, p)| **p).map(|(r, _)| r).sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

/// One-vs-rest macro ROC-AUC. Any unusable probability row, or a class
/// missing from `y_true`, degrades the metric to 0.
pub fn roc_auc_ovr_macro(probs: &[Option<ClassProbabilities>], y_true: &[usize]) -> f64 {
    if probs.is_empty() || probs.len() != y_true.len() {
        return 0.0;
    }
    let Some(rows): Option<Vec<&ClassProbabilities>> = probs.iter().map(Option::as_ref).collect() else {
        log::warn!("Unusable probability output, ROC-AUC recorded as 0");
        return 0.0;
    };

    let mut total = 0.0;
    for class in 0..N_CLASSES {
        let scores: Vec<f64> = rows.iter().map(|p| p.as_array()[class]).collect();
        let positive: Vec<bool> = y_true.iter().map(|&y| y == class).collect();
        match binary_auc(&scores, &positive) {
            Some(auc) => total += auc,
            None => {
                log::warn!("ROC-AUC undefined for class {}, recorded as 0", class);
                return 0.0;
            }
        }
    }
    total / N_CLASSES as f64
}

// ============================================================================
// MODEL METRICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub roc_auc: f64,
    pub f1_at_risk: f64,
    pub precision_at_risk: f64,
    pub recall_at_risk: f64,
    pub macro_f1: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl ModelMetrics {
    pub fn compute(y_true: &[usize], probs: &[Option<ClassProbabilities>]) -> Self {
        // Rows without usable output count as a "High" prediction
        let y_pred: Vec<usize> = probs
            .iter()
            .map(|p| p.map(|p| p.argmax().index()).unwrap_or(0))
            .collect();
        let cm = ConfusionMatrix::from_predictions(y_true, &y_pred);
        let at_risk = RiskCategory::AtRisk.index();

        Self {
            accuracy: round4(cm.accuracy()),
            roc_auc: round4(roc_auc_ovr_macro(probs, y_true)),
            f1_at_risk: round4(cm.f1(at_risk)),
            precision_at_risk: round4(cm.precision(at_risk)),
            recall_at_risk: round4(cm.recall(at_risk)),
            macro_f1: round4(cm.macro_f1()),
            confusion_matrix: cm,
        }
    }

    /// Evaluate a fitted model on a held-out design matrix
    pub fn evaluate<C: Classifier + ?Sized>(model: &C, x: &Array2<f64>, y_true: &[usize]) -> Self {
        let probs: Vec<Option<ClassProbabilities>> =
            x.rows().into_iter().map(|row| model.predict_proba(&row.to_vec())).collect();
        Self::compute(y_true, &probs)
    }
}
