//! Logic Module - scoring pipeline & training lifecycle
//!
//! - `features/` - record schema, FeatureOrder, encoder
//! - `model/`    - candidate classifiers, inference engine
//! - `explain/`  - attribution ranking
//! - `policy/`   - intervention rules
//! - `train/`    - split, metrics, champion selection
//! - `registry/` - versioned champion record + bundles
//! - `dataset/`  - JSONL I/O, synthetic cohort
//! - `drift`     - quality floors
//! - `service`   - Scorer / ChampionSlot

pub mod features;
pub mod model;
pub mod explain;
pub mod policy;
pub mod train;
pub mod registry;
pub mod dataset;
pub mod drift;
pub mod service;
