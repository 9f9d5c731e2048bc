//! # Quiver
//!
//! An embeddable in-memory secondary index and full-text query engine.
//!
//! ## Features
//!
//! - Text, tag, numeric and geo fields in one schema
//! - Compact delta-encoded posting lists
//! - Token, prefix, phonetic and synonym matching
//! - Boolean query trees compiled into lazy pull iterators
//! - Concurrent search while documents are being ingested

pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::config::IndexConfig;
    pub use crate::document::{Document, FieldValue};
    pub use crate::error::{QuiverError, Result};
    pub use crate::index::{DistanceUnit, DocId, GeoPoint, Index, IndexBuilder, NumericRange};
    pub use crate::query::{QueryNode, ResultsIterator, ValueProvider};
    pub use crate::schema::{FieldOptions, FieldType};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
