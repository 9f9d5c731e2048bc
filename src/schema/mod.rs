//! Schema module for Quiver.
//!
//! Field declarations, the per-index schema with its storage flags and
//! statistics, immutable schema snapshots and index-creation observers.

pub mod cache;
pub mod field;
pub mod observer;
pub mod spec;

pub use cache::IndexSpecCache;
pub use field::{FieldId, FieldMask, FieldOptions, FieldSpec, FieldType};
pub use observer::{ObserverId, register_on_create, unregister_on_create};
pub use spec::{FieldEncoding, IndexFlags, IndexSpec, IndexStats, MAX_FIELDS};
