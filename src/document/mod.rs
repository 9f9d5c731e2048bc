//! Document module.
//!
//! Documents are keyed collections of field values handed to
//! [`crate::index::Index::add_document`].

#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

pub use document::Document;
pub use field_value::FieldValue;
