//! The index schema: declared fields, storage flags and running statistics.

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::analysis::{StopWordList, SynonymMap};
use crate::config::IndexConfig;
use crate::error::{QuiverError, Result};
use crate::schema::cache::IndexSpecCache;
use crate::schema::field::{
    FIELD_MASK_BITS, FieldId, FieldMask, FieldOptions, FieldSpec, FieldType,
};

/// Hard ceiling on the number of fields in one index.
pub const MAX_FIELDS: usize = 1024;

bitflags! {
    /// Index-wide flags. The storage subset decides the layout of every
    /// posting record and cannot change once records exist.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IndexFlags: u32 {
        const STORE_TERM_OFFSETS = 0x01;
        const STORE_FIELD_FLAGS = 0x02;
        const HAS_CUSTOM_STOPWORDS = 0x08;
        const STORE_FREQS = 0x10;
        const STORE_NUMERIC = 0x20;
        const STORE_BYTE_OFFSETS = 0x40;
        const WIDE_SCHEMA = 0x80;
        const HAS_SYNONYMS = 0x100;
        /// Some field has phonetic matching on. A cache for quick checks.
        const HAS_PHONETIC = 0x400;

        const DEFAULT = Self::STORE_FREQS.bits()
            | Self::STORE_TERM_OFFSETS.bits()
            | Self::STORE_FIELD_FLAGS.bits()
            | Self::STORE_BYTE_OFFSETS.bits();

        const STORAGE_MASK = Self::STORE_FREQS.bits()
            | Self::STORE_FIELD_FLAGS.bits()
            | Self::STORE_TERM_OFFSETS.bits()
            | Self::STORE_NUMERIC.bits()
            | Self::STORE_BYTE_OFFSETS.bits()
            | Self::WIDE_SCHEMA.bits();
    }
}

impl IndexFlags {
    /// Only the flags that affect posting record layout.
    pub fn storage(self) -> IndexFlags {
        self & IndexFlags::STORAGE_MASK
    }

    /// Highlighting needs both token positions and byte offsets.
    pub fn supports_highlight(self) -> bool {
        self.contains(IndexFlags::STORE_TERM_OFFSETS | IndexFlags::STORE_BYTE_OFFSETS)
    }
}

/// How a posting record names the field an occurrence came from.
///
/// Decided when the index is created and carried with it; never inferred
/// from the current field count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldEncoding {
    /// The field's bit, `1 << id`.
    Compact,
    /// The field's dense id.
    Wide,
}

impl FieldEncoding {
    /// The value stored in a record for field `id`.
    pub fn encode(self, id: FieldId) -> Result<u64> {
        match self {
            FieldEncoding::Compact if usize::from(id) >= FIELD_MASK_BITS => Err(
                QuiverError::schema(format!("Field id {id} does not fit the compact encoding")),
            ),
            FieldEncoding::Compact => Ok(1u64 << id),
            FieldEncoding::Wide => Ok(u64::from(id)),
        }
    }

    /// The field id a stored value names. A compact value must have exactly
    /// one bit set.
    pub fn decode(self, stored: u64) -> Result<FieldId> {
        let id = match self {
            FieldEncoding::Compact if stored.count_ones() == 1 => u64::from(stored.trailing_zeros()),
            FieldEncoding::Compact => {
                return Err(QuiverError::decode(format!(
                    "Compact field attribution {stored:#x} does not name a single field"
                )));
            }
            FieldEncoding::Wide => stored,
        };
        FieldId::try_from(id)
            .map_err(|_| QuiverError::decode(format!("Field id {id} out of range")))
    }
}

/// Running counters maintained during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Live (not dropped) documents.
    pub num_documents: usize,
    /// Distinct terms across all text fields.
    pub num_terms: usize,
    /// Posting records written.
    pub num_records: usize,
    /// Bytes of valid posting data.
    pub inverted_size: usize,
    /// Bytes allocated for posting data.
    pub inverted_cap: usize,
    /// Bytes of term text held by the dictionaries.
    pub terms_size: usize,
}

/// The live schema of one index.
#[derive(Debug)]
pub struct IndexSpec {
    name: String,
    fields: Vec<FieldSpec>,
    flags: IndexFlags,
    encoding: FieldEncoding,
    pub(crate) stats: IndexStats,
    stopwords: StopWordList,
    synonyms: SynonymMap,
    sortables: usize,
    schema_version: u64,
    cache: Mutex<Option<Arc<IndexSpecCache>>>,
}

impl IndexSpec {
    /// Create an empty schema from `config`.
    pub fn new<S: Into<String>>(name: S, config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let stopwords = match &config.stopwords {
            Some(words) => StopWordList::from_words(words),
            None => StopWordList::new(),
        };
        let encoding = if config.wide_schema {
            FieldEncoding::Wide
        } else {
            FieldEncoding::Compact
        };

        Ok(IndexSpec {
            name: name.into(),
            fields: Vec::new(),
            flags: config.storage_flags(),
            encoding,
            stats: IndexStats::default(),
            stopwords,
            synonyms: SynonymMap::new(),
            sortables: 0,
            schema_version: 0,
            cache: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn flags(&self) -> IndexFlags {
        self.flags
    }

    pub fn field_encoding(&self) -> FieldEncoding {
        self.encoding
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn stopwords(&self) -> &StopWordList {
        &self.stopwords
    }

    pub fn synonyms(&self) -> &SynonymMap {
        &self.synonyms
    }

    /// Bumped on every schema change.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Declare a new field and return its id.
    ///
    /// Names are unique case-insensitively. A compact index that outgrows
    /// the field mask switches to the wide encoding, but only while no
    /// posting record has been written under the compact one.
    pub fn create_field(&mut self, name: &str, field_type: FieldType) -> Result<FieldId> {
        if name.is_empty() {
            return Err(QuiverError::schema("Field name cannot be empty"));
        }
        if self.field(name).is_some() {
            return Err(QuiverError::DuplicateField(name.to_string()));
        }
        if self.fields.len() >= MAX_FIELDS {
            return Err(QuiverError::MaxFieldsExceeded(MAX_FIELDS));
        }

        let id = self.fields.len() as FieldId;
        if self.encoding == FieldEncoding::Compact && usize::from(id) >= FIELD_MASK_BITS {
            if self.stats.num_records > 0 {
                return Err(QuiverError::schema(format!(
                    "Index '{}' already holds compact-encoded records and cannot grow past {} fields",
                    self.name, FIELD_MASK_BITS
                )));
            }
            log::info!(
                "index '{}' switching to wide field encoding at field {id}",
                self.name
            );
            self.encoding = FieldEncoding::Wide;
            self.flags.insert(IndexFlags::WIDE_SCHEMA);
        }

        self.fields.push(FieldSpec::new(name, field_type, id));
        if field_type == FieldType::Numeric {
            self.flags.insert(IndexFlags::STORE_NUMERIC);
        }
        log::debug!("index '{}': created {field_type} field '{name}' ({id})", self.name);
        self.schema_changed();
        Ok(id)
    }

    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name_matches(name))
    }

    /// Case-sensitive field lookup.
    pub fn field_case(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.get(usize::from(id))
    }

    /// The field owning the lowest bit set in `bit`.
    pub fn field_by_bit(&self, bit: FieldMask) -> Option<&FieldSpec> {
        if bit == 0 {
            return None;
        }
        self.field_by_id(bit.trailing_zeros() as FieldId)
    }

    /// The mask bit of a text field, or 0 if the field is missing, is not
    /// text, or has no bit.
    pub fn field_bit(&self, name: &str) -> FieldMask {
        self.field(name)
            .filter(|f| f.is_text())
            .and_then(FieldSpec::bit)
            .unwrap_or(0)
    }

    /// All fields of one type, in declaration order.
    pub fn fields_of_type(&self, field_type: FieldType) -> Vec<&FieldSpec> {
        self.fields
            .iter()
            .filter(|f| f.field_type() == field_type)
            .collect()
    }

    /// Whether any field in `mask` has phonetic matching on.
    pub fn check_phonetic_enabled(&self, mask: FieldMask) -> bool {
        if !self.flags.contains(IndexFlags::HAS_PHONETIC) {
            return false;
        }
        self.fields
            .iter()
            .any(|f| f.is_phonetic() && f.bit().is_some_and(|bit| mask & bit != 0))
    }

    /// Sorting-table slot of a sortable field.
    pub fn sorting_index(&self, name: &str) -> Option<usize> {
        self.field(name).and_then(FieldSpec::sort_slot)
    }

    /// Number of sortable fields.
    pub fn num_sortables(&self) -> usize {
        self.sortables
    }

    /// Replace the options of a field.
    pub fn set_field_options(&mut self, name: &str, options: FieldOptions) -> Result<()> {
        let index = self.field_index(name)?;
        let field = &mut self.fields[index];
        field.set_options(options)?;
        if options.contains(FieldOptions::SORTABLE) && field.sort_slot().is_none() {
            field.set_sort_slot(self.sortables);
            self.sortables += 1;
        }

        let has_phonetic = self.fields.iter().any(FieldSpec::is_phonetic);
        self.flags.set(IndexFlags::HAS_PHONETIC, has_phonetic);
        self.schema_changed();
        Ok(())
    }

    /// Turn one option of a field on or off.
    pub fn toggle_field_option(&mut self, name: &str, option: FieldOptions, on: bool) -> Result<()> {
        let mut options = self.field(name).ok_or_else(|| QuiverError::unknown_field(name))?.options();
        options.set(option, on);
        self.set_field_options(name, options)
    }

    pub fn set_field_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        let index = self.field_index(name)?;
        self.fields[index].set_weight(weight)?;
        self.schema_changed();
        Ok(())
    }

    pub fn set_tag_separator(&mut self, name: &str, separator: char) -> Result<()> {
        let index = self.field_index(name)?;
        self.fields[index].set_tag_separator(separator)?;
        self.schema_changed();
        Ok(())
    }

    /// Add a synonym group.
    pub fn add_synonyms<I, S>(&mut self, terms: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.flags.insert(IndexFlags::HAS_SYNONYMS);
        self.synonyms.add_group(terms)
    }

    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(term)
    }

    /// The current immutable snapshot of the field list.
    ///
    /// Built on first request after a schema change and shared until the
    /// next one; holders keep their snapshot alive regardless.
    pub fn spec_cache(&self) -> Arc<IndexSpecCache> {
        let mut cache = self.cache.lock();
        if let Some(cache) = cache.as_ref() {
            return Arc::clone(cache);
        }
        let built = Arc::new(self.build_spec_cache());
        *cache = Some(Arc::clone(&built));
        built
    }

    /// A fresh snapshot, bypassing the shared one.
    pub fn build_spec_cache(&self) -> IndexSpecCache {
        IndexSpecCache::new(self.fields.clone(), self.encoding, self.schema_version)
    }

    fn field_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name_matches(name))
            .ok_or_else(|| QuiverError::unknown_field(name))
    }

    fn schema_changed(&mut self) {
        self.schema_version += 1;
        *self.cache.get_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> IndexSpec {
        IndexSpec::new("idx", &IndexConfig::default()).unwrap()
    }

    #[test]
    fn test_create_fields_in_order() {
        let mut spec = spec();
        assert_eq!(spec.create_field("title", FieldType::Text).unwrap(), 0);
        assert_eq!(spec.create_field("price", FieldType::Numeric).unwrap(), 1);
        assert_eq!(spec.create_field("tags", FieldType::Tag).unwrap(), 2);

        assert!(spec.flags().contains(IndexFlags::STORE_NUMERIC));
        assert_eq!(spec.fields_of_type(FieldType::Text).len(), 1);
        assert_eq!(spec.schema_version(), 3);
    }

    #[test]
    fn test_duplicate_field_is_case_insensitive() {
        let mut spec = spec();
        spec.create_field("Title", FieldType::Text).unwrap();
        assert!(matches!(
            spec.create_field("TITLE", FieldType::Tag),
            Err(QuiverError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_lookup_variants() {
        let mut spec = spec();
        spec.create_field("Title", FieldType::Text).unwrap();
        spec.create_field("body", FieldType::Text).unwrap();
        spec.create_field("price", FieldType::Numeric).unwrap();

        assert!(spec.field("title").is_some());
        assert!(spec.field_case("title").is_none());
        assert!(spec.field_case("Title").is_some());

        assert_eq!(spec.field_bit("body"), 0b10);
        assert_eq!(spec.field_bit("price"), 0);
        assert_eq!(spec.field_bit("missing"), 0);
        assert_eq!(spec.field_by_bit(0b10).map(FieldSpec::name), Some("body"));
        assert!(spec.field_by_bit(0).is_none());
    }

    #[test]
    fn test_max_fields() {
        let config = IndexConfig {
            wide_schema: true,
            ..Default::default()
        };
        let mut spec = IndexSpec::new("idx", &config).unwrap();
        for i in 0..MAX_FIELDS {
            spec.create_field(&format!("f{i}"), FieldType::Tag).unwrap();
        }
        assert!(matches!(
            spec.create_field("one_more", FieldType::Tag),
            Err(QuiverError::MaxFieldsExceeded(MAX_FIELDS))
        ));
    }

    #[test]
    fn test_compact_migrates_to_wide_before_records() {
        let mut spec = spec();
        for i in 0..FIELD_MASK_BITS {
            spec.create_field(&format!("f{i}"), FieldType::Text).unwrap();
        }
        assert_eq!(spec.field_encoding(), FieldEncoding::Compact);

        spec.create_field("overflow", FieldType::Text).unwrap();
        assert_eq!(spec.field_encoding(), FieldEncoding::Wide);
        assert!(spec.flags().contains(IndexFlags::WIDE_SCHEMA));
    }

    #[test]
    fn test_compact_refuses_to_migrate_with_records() {
        let mut spec = spec();
        for i in 0..FIELD_MASK_BITS {
            spec.create_field(&format!("f{i}"), FieldType::Text).unwrap();
        }
        spec.stats.num_records = 1;

        let err = spec.create_field("overflow", FieldType::Text).unwrap_err();
        assert!(err.is_schema_error());
        assert_eq!(spec.field_encoding(), FieldEncoding::Compact);
    }

    #[test]
    fn test_field_encoding() {
        assert_eq!(FieldEncoding::Compact.encode(3).unwrap(), 8);
        assert!(FieldEncoding::Compact.encode(64).is_err());
        assert_eq!(FieldEncoding::Wide.encode(300).unwrap(), 300);

        // The same stored value means different fields under each encoding.
        assert_eq!(FieldEncoding::Compact.decode(8).unwrap(), 3);
        assert!(FieldEncoding::Compact.decode(0b101).is_err());
        assert!(FieldEncoding::Compact.decode(0).is_err());
        assert_eq!(FieldEncoding::Wide.decode(8).unwrap(), 8);
        assert!(FieldEncoding::Wide.decode(1 << 20).is_err());
    }

    #[test]
    fn test_phonetic_check() {
        let mut spec = spec();
        spec.create_field("a", FieldType::Text).unwrap();
        spec.create_field("b", FieldType::Text).unwrap();
        assert!(!spec.check_phonetic_enabled(0b11));

        spec.toggle_field_option("a", FieldOptions::PHONETIC, true).unwrap();
        assert!(spec.flags().contains(IndexFlags::HAS_PHONETIC));
        assert!(spec.check_phonetic_enabled(0b01));
        assert!(!spec.check_phonetic_enabled(0b10));

        spec.toggle_field_option("a", FieldOptions::PHONETIC, false).unwrap();
        assert!(!spec.flags().contains(IndexFlags::HAS_PHONETIC));
    }

    #[test]
    fn test_sortable_slots() {
        let mut spec = spec();
        spec.create_field("title", FieldType::Text).unwrap();
        spec.create_field("price", FieldType::Numeric).unwrap();

        spec.toggle_field_option("price", FieldOptions::SORTABLE, true).unwrap();
        spec.toggle_field_option("title", FieldOptions::SORTABLE, true).unwrap();
        assert_eq!(spec.sorting_index("price"), Some(0));
        assert_eq!(spec.sorting_index("title"), Some(1));
        assert_eq!(spec.num_sortables(), 2);
    }

    #[test]
    fn test_spec_cache_is_shared_until_change() {
        let mut spec = spec();
        spec.create_field("title", FieldType::Text).unwrap();

        let first = spec.spec_cache();
        let second = spec.spec_cache();
        assert!(Arc::ptr_eq(&first, &second));

        spec.create_field("body", FieldType::Text).unwrap();
        let third = spec.spec_cache();
        assert!(!Arc::ptr_eq(&first, &third));

        // Older holders keep seeing the schema they captured.
        assert_eq!(first.len(), 1);
        assert_eq!(third.len(), 2);
    }
}
