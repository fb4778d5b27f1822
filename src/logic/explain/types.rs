use serde::{Deserialize, Serialize};

use crate::constants::{IMPACT_HIGH_SHARE, IMPACT_MEDIUM_SHARE};

/// Severity of one feature's share of the total attribution mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn from_share(share: f64) -> Self {
        if share >= IMPACT_HIGH_SHARE {
            Impact::High
        } else if share >= IMPACT_MEDIUM_SHARE {
            Impact::Medium
        } else {
            Impact::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "HIGH",
            Impact::Medium => "MEDIUM",
            Impact::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub impact: Impact,
    /// Pre-encoding value from the record (0 when absent or non-numeric)
    pub value: f64,
    pub contribution: f64,
}
