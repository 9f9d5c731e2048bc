//! Index module for Quiver.
//!
//! Posting lists and their record codec, per-field term dictionaries,
//! tag, numeric and geo stores, the document table, and the [`Index`]
//! that ties them together.

pub mod dictionary;
pub mod doc_table;
pub mod geo;
#[allow(clippy::module_inception)]
pub mod index;
pub mod inverted;
pub mod numeric;
pub mod posting;
pub mod store;
pub mod tag;

// Re-export commonly used types
pub use dictionary::{PrefixExpansion, TermDictionary, TermLookup};
pub use doc_table::{DocId, DocTable, DocumentMetadata};
pub use geo::{DistanceUnit, GeoIndex, GeoPoint};
pub use index::{FieldInfo, Index, IndexBuilder, IndexInfo};
pub use inverted::{InvertedIndex, PostingHandle};
pub use numeric::{NumericIndex, NumericRange};
pub use posting::{Posting, PostingLayout};
pub use store::{FieldStore, FieldStores};
pub use tag::{TagIndex, split_tags};
