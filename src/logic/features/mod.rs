//! Features Module - Record schema and vector encoding
//!
//! - `layout`  - field schema, FeatureOrder, layout hash
//! - `record`  - typed FeatureRecord + completeness/range checks
//! - `encoder` - CategoryEncoding, StandardScaler, FeatureEncoder

pub mod layout;
pub mod record;
pub mod encoder;


// Re-export common types
pub use layout::{FeatureOrder, FieldKind, FEATURE_COUNT, FEATURE_VERSION};
pub use record::{FeatureRecord, RawValue};
pub use encoder::{CategoryEncoding, EncodedVector, FeatureEncoder, StandardScaler};
