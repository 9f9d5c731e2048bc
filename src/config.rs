//! Index configuration.
//!
//! [`IndexConfig`] decides, once and for all at index creation, how rich the
//! posting records are and how field identity is encoded in them. It can be
//! built in code or loaded from JSON:
//!
//! ```
//! use quiver::config::IndexConfig;
//!
//! let config = IndexConfig::from_json(r#"{ "store_byte_offsets": false, "min_prefix_len": 3 }"#)
//!     .unwrap();
//! assert!(config.store_freqs);
//! assert!(!config.store_byte_offsets);
//! assert_eq!(config.min_prefix_len, 3);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QuiverError, Result};
use crate::schema::spec::IndexFlags;

/// Configuration for a single index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Store the in-document frequency of each term occurrence.
    pub store_freqs: bool,

    /// Store token positions, enabling positional features such as
    /// highlighting.
    pub store_term_offsets: bool,

    /// Store which field each occurrence came from.
    pub store_field_flags: bool,

    /// Store the byte offset of each token in the source text.
    pub store_byte_offsets: bool,

    /// Encode field identity as a dense index instead of a mask bit.
    ///
    /// Fixed at creation. An index created compact migrates to wide only if
    /// it grows past the mask width before any record has been written.
    pub wide_schema: bool,

    /// Custom stopword list. `None` keeps the built-in English list, an
    /// empty list disables stopword filtering.
    pub stopwords: Option<Vec<String>>,

    /// Shortest prefix accepted by prefix queries.
    pub min_prefix_len: usize,

    /// Cap on the number of terms a single prefix may expand to.
    pub max_prefix_expansions: Option<usize>,

    /// Initial capacity, in bytes, of every new posting-list buffer.
    pub initial_buffer_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            store_freqs: true,
            store_term_offsets: true,
            store_field_flags: true,
            store_byte_offsets: true,
            wide_schema: false,
            stopwords: None,
            min_prefix_len: 2,
            max_prefix_expansions: None,
            initial_buffer_capacity: 6,
        }
    }
}

impl IndexConfig {
    /// Parse a configuration from a JSON document. Missing keys keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Configuration whose postings carry document ids only.
    pub fn doc_ids_only() -> Self {
        IndexConfig {
            store_freqs: false,
            store_term_offsets: false,
            store_field_flags: false,
            store_byte_offsets: false,
            ..Default::default()
        }
    }

    /// Check the configuration for values no index can work with.
    pub fn validate(&self) -> Result<()> {
        if self.min_prefix_len == 0 {
            return Err(QuiverError::invalid_config("min_prefix_len must be at least 1"));
        }
        if self.max_prefix_expansions == Some(0) {
            return Err(QuiverError::invalid_config(
                "max_prefix_expansions must be positive when set",
            ));
        }
        Ok(())
    }

    /// The storage flags an index created from this configuration starts with.
    pub fn storage_flags(&self) -> IndexFlags {
        let mut flags = IndexFlags::empty();
        flags.set(IndexFlags::STORE_FREQS, self.store_freqs);
        flags.set(IndexFlags::STORE_TERM_OFFSETS, self.store_term_offsets);
        flags.set(IndexFlags::STORE_FIELD_FLAGS, self.store_field_flags);
        flags.set(IndexFlags::STORE_BYTE_OFFSETS, self.store_byte_offsets);
        flags.set(IndexFlags::WIDE_SCHEMA, self.wide_schema);
        flags.set(IndexFlags::HAS_CUSTOM_STOPWORDS, self.stopwords.is_some());
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = IndexConfig::default().storage_flags();
        assert_eq!(flags, IndexFlags::DEFAULT);
        assert!(flags.supports_highlight());
    }

    #[test]
    fn test_doc_ids_only() {
        let flags = IndexConfig::doc_ids_only().storage_flags();
        assert!(flags.storage().is_empty());
    }

    #[test]
    fn test_validate() {
        let config = IndexConfig {
            min_prefix_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(IndexConfig::from_json(r#"{ "max_prefix_expansions": 0 }"#).is_err());
        assert!(IndexConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{ "wide_schema": true, "stopwords": ["foo"] }"#).unwrap();

        let config = IndexConfig::load(&path).unwrap();
        assert!(config.wide_schema);
        assert_eq!(config.stopwords, Some(vec!["foo".to_string()]));

        let flags = config.storage_flags();
        assert!(flags.contains(IndexFlags::WIDE_SCHEMA));
        assert!(flags.contains(IndexFlags::HAS_CUSTOM_STOPWORDS));
    }
}
