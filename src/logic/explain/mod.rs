//! Explain Module - attribution ranking
//!
//! Turns a model's per-feature contributions into the top factors shown
//! with an assessment.

pub mod types;
pub mod engine;

pub use types::{Impact, TopFactor};
pub use engine::rank;
