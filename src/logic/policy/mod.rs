//! Policy Module
//!
//! Maps a scored student to recommended interventions. Rule based, no model.
//!
//! ## Structure
//! - `types`: Recommendation
//! - `rules`: ordered rule table
//! - `engine`: recommend() with the monitoring fallback

pub mod types;
pub mod rules;
pub mod engine;

pub use types::Recommendation;
pub use rules::{apply_rules, InterventionRule, RULES};
pub use engine::recommend;
