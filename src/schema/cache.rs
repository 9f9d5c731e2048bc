//! Immutable schema snapshots handed to readers.

use crate::schema::field::{FieldId, FieldSpec, FieldType};
use crate::schema::spec::FieldEncoding;

/// A copy of the field list taken at one schema version.
///
/// Compiled queries resolve every field reference through the snapshot they
/// captured, so a field added or reconfigured afterwards never changes what
/// an in-flight query means. Shared as `Arc<IndexSpecCache>`; it is dropped
/// with its last holder.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpecCache {
    fields: Vec<FieldSpec>,
    encoding: FieldEncoding,
    version: u64,
}

impl IndexSpecCache {
    pub(crate) fn new(fields: Vec<FieldSpec>, encoding: FieldEncoding, version: u64) -> Self {
        IndexSpecCache {
            fields,
            encoding,
            version,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field encoding in force when the snapshot was taken.
    pub fn encoding(&self) -> FieldEncoding {
        self.encoding
    }

    /// Schema version the snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Case-insensitive lookup.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name_matches(name))
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.get(usize::from(id))
    }

    /// Text fields that take part in full-text matching.
    pub fn searchable_text_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_searchable_text())
    }

    pub fn fields_of_type(&self, field_type: FieldType) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.field_type() == field_type)
    }
}
