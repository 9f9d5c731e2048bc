//! Documents submitted for indexing.

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;
use crate::index::geo::GeoPoint;

/// A document to be committed into an index.
///
/// Identified by an opaque byte key. Fields are kept in the order they were
/// added, duplicates included; the index rejects a document naming the same
/// field twice when it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    key: Vec<u8>,
    score: f32,
    fields: Vec<(String, FieldValue)>,
    replace: bool,
}

impl Document {
    /// Create an empty document.
    pub fn new<K: Into<Vec<u8>>>(key: K, score: f32) -> Self {
        Document {
            key: key.into(),
            score,
            fields: Vec::new(),
            replace: false,
        }
    }

    /// Add a field value in place.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Add a text value. Also used for tag lists.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add a numeric value.
    pub fn add_numeric<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.add_field(name, FieldValue::Numeric(value));
        self
    }

    /// Add a point.
    pub fn add_geo<S: Into<String>>(mut self, name: S, point: GeoPoint) -> Self {
        self.add_field(name, FieldValue::Geo(point));
        self
    }

    /// Replace any existing document with the same key on commit.
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn replace(&self) -> bool {
        self.replace
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// First value of the named field, compared case-insensitively.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let doc = Document::new("doc1", 1.0)
            .add_text("title", "some test to index")
            .add_numeric("price", 20.0)
            .with_replace(true);

        assert_eq!(doc.key(), b"doc1");
        assert_eq!(doc.len(), 2);
        assert!(doc.replace());
        assert_eq!(doc.get_field("TITLE").and_then(FieldValue::as_text), Some("some test to index"));
        assert!(doc.get_field("missing").is_none());
    }
}
