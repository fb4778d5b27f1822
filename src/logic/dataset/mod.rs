//! Dataset Module - labeled training data
//!
//! JSONL in and out (one flat record per line) plus a seeded synthetic
//! cohort generator for bootstrapping a first champion.

pub mod record;
pub mod writer;
pub mod synth;


pub use record::LabeledRecord;
pub use writer::{append_jsonl, read_jsonl, read_jsonl_rows, write_jsonl};
pub use synth::{generate, DEFAULT_COHORT_SIZE};
