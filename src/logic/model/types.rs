//! Model Types
//!
//! Core types for risk classification.
//! No logic beyond small helpers - data structures only.

use serde::{Deserialize, Serialize};

/// Number of risk classes
pub const N_CLASSES: usize = 3;

// ============================================================================
// RISK CATEGORY
// ============================================================================

/// Performance/risk classes; the discriminant is the model's class index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    High,
    Medium,
    #[serde(rename = "At Risk")]
    AtRisk,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; N_CLASSES] =
        [RiskCategory::High, RiskCategory::Medium, RiskCategory::AtRisk];

    pub fn index(&self) -> usize {
        match self {
            RiskCategory::High => 0,
            RiskCategory::Medium => 1,
            RiskCategory::AtRisk => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::High => "High",
            RiskCategory::Medium => "Medium",
            RiskCategory::AtRisk => "At Risk",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == label.trim())
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASS PROBABILITIES
// ============================================================================

/// Distribution over {High, Medium, At Risk}; always sums to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities([f64; N_CLASSES]);

impl ClassProbabilities {
    /// Normalize non-negative scores; `None` if unusable (non-finite, all zero)
    pub fn from_scores(scores: [f64; N_CLASSES]) -> Option<Self> {
        if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return None;
        }
        let total: f64 = scores.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let mut probs = scores;
        for p in probs.iter_mut() {
            *p = (*p / total).clamp(0.0, 1.0);
        }
        Some(Self(probs))
    }

    /// Numerically stable softmax over raw class scores
    pub fn softmax(logits: [f64; N_CLASSES]) -> Option<Self> {
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return None;
        }
        let mut exp = [0.0; N_CLASSES];
        for (e, l) in exp.iter_mut().zip(logits) {
            *e = (l - max).exp();
        }
        Self::from_scores(exp)
    }

    pub fn get(&self, category: RiskCategory) -> f64 {
        self.0[category.index()]
    }

    pub fn as_array(&self) -> &[f64; N_CLASSES] {
        &self.0
    }

    /// Predicted class; ties resolve to the lower index
    pub fn argmax(&self) -> RiskCategory {
        let mut best = 0;
        for i in 1..N_CLASSES {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        RiskCategory::ALL[best]
    }

    /// Mass on the predicted class
    pub fn confidence(&self) -> f64 {
        self.get(self.argmax())
    }

    /// Mass on "At Risk", whichever class wins
    pub fn at_risk(&self) -> f64 {
        self.get(RiskCategory::AtRisk)
    }
}
