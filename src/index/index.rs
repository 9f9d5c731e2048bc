//! The index: schema, field stores and document table behind one handle.
//!
//! ```
//! use quiver::config::IndexConfig;
//! use quiver::document::Document;
//! use quiver::index::Index;
//! use quiver::query::QueryNode;
//!
//! let index = Index::create("books", IndexConfig::default()).unwrap();
//! index.create_text_field("title").unwrap();
//! index
//!     .add_document(Document::new("doc1", 1.0).add_text("title", "some test to index"))
//!     .unwrap();
//!
//! let mut results = index.search(&QueryNode::prefix("title", "in")).unwrap().unwrap();
//! assert_eq!(results.next_key().unwrap(), Some(b"doc1".to_vec()));
//! assert_eq!(results.next_key().unwrap(), None);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::{PhoneticEncoder, SeparatorTokenizer, Soundex, Tokenizer};
use crate::config::IndexConfig;
use crate::document::{Document, FieldValue};
use crate::error::{QuiverError, Result};
use crate::index::dictionary::{TermDictionary, TermLookup};
use crate::index::doc_table::{DocId, DocTable};
use crate::index::geo::{GeoIndex, GeoPoint};
use crate::index::numeric::NumericIndex;
use crate::index::posting::{Posting, PostingLayout};
use crate::index::store::FieldStores;
use crate::index::tag::TagIndex;
use crate::query::compiler::QueryCompiler;
use crate::query::lazy::ValueProvider;
use crate::query::node::QueryNode;
use crate::query::results::ResultsIterator;
use crate::schema::cache::IndexSpecCache;
use crate::schema::field::{FieldId, FieldOptions, FieldSpec, FieldType};
use crate::schema::observer;
use crate::schema::spec::{FieldEncoding, IndexSpec, IndexStats};

/// A field value checked against its field and ready to index.
#[derive(Debug)]
enum Prepared {
    Text(String),
    Numeric(f64),
    Geo(GeoPoint),
}

impl Prepared {
    fn sort_value(&self) -> FieldValue {
        match self {
            Prepared::Text(text) => FieldValue::Text(text.clone()),
            Prepared::Numeric(value) => FieldValue::Numeric(*value),
            Prepared::Geo(point) => FieldValue::Geo(*point),
        }
    }
}

/// A snapshot of index metadata and statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    pub field_encoding: FieldEncoding,
    pub flags: u32,
    pub schema_version: u64,
    pub max_doc_id: DocId,
    pub stats: IndexStats,
}

/// One field in [`IndexInfo`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
    pub id: FieldId,
    pub sortable: bool,
    pub indexed: bool,
    pub phonetic: bool,
    pub weight: f64,
}

impl From<&FieldSpec> for FieldInfo {
    fn from(field: &FieldSpec) -> Self {
        FieldInfo {
            name: field.name().to_string(),
            field_type: field.field_type(),
            id: field.id(),
            sortable: field.is_sortable(),
            indexed: field.is_indexed(),
            phonetic: field.is_phonetic(),
            weight: field.weight(),
        }
    }
}

/// Builder for [`Index`] with non-default collaborators.
pub struct IndexBuilder {
    name: String,
    config: IndexConfig,
    tokenizer: Arc<dyn Tokenizer>,
    phonetic: Arc<dyn PhoneticEncoder>,
    provider: Option<Arc<dyn ValueProvider>>,
}

impl IndexBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        IndexBuilder {
            name: name.into(),
            config: IndexConfig::default(),
            tokenizer: Arc::new(SeparatorTokenizer::new()),
            phonetic: Arc::new(Soundex),
            provider: None,
        }
    }

    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn phonetic_encoder(mut self, encoder: Arc<dyn PhoneticEncoder>) -> Self {
        self.phonetic = encoder;
        self
    }

    pub fn value_provider(mut self, provider: Arc<dyn ValueProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Create the index and run the creation observers.
    pub fn build(self) -> Result<Index> {
        let spec = IndexSpec::new(self.name, &self.config)?;
        log::debug!(
            "creating index '{}' with flags {:?}",
            spec.name(),
            spec.flags()
        );
        observer::notify_created(&spec);

        Ok(Index {
            spec: RwLock::new(spec),
            stores: RwLock::new(FieldStores::new()),
            docs: Arc::new(RwLock::new(DocTable::new())),
            config: self.config,
            tokenizer: self.tokenizer,
            phonetic: self.phonetic,
            provider: self.provider,
        })
    }
}

/// An in-memory index.
///
/// Safe to share between threads. Ingestion is serialized; searches run
/// concurrently with each other and with ingestion. Locks are always taken
/// in the order schema, stores, documents.
pub struct Index {
    spec: RwLock<IndexSpec>,
    stores: RwLock<FieldStores>,
    docs: Arc<RwLock<DocTable>>,
    config: IndexConfig,
    tokenizer: Arc<dyn Tokenizer>,
    phonetic: Arc<dyn PhoneticEncoder>,
    provider: Option<Arc<dyn ValueProvider>>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("spec", &*self.spec.read())
            .field("config", &self.config)
            .field("has_value_provider", &self.provider.is_some())
            .finish()
    }
}

impl Index {
    /// Create an index with the default tokenizer and phonetic encoder.
    pub fn create<S: Into<String>>(name: S, config: IndexConfig) -> Result<Self> {
        IndexBuilder::new(name).config(config).build()
    }

    pub fn builder<S: Into<String>>(name: S) -> IndexBuilder {
        IndexBuilder::new(name)
    }

    /// Consult `provider` for the values of unindexed fields.
    pub fn with_value_provider(mut self, provider: Arc<dyn ValueProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn name(&self) -> String {
        self.spec.read().name().to_string()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Run `f` against the live schema.
    pub fn with_spec<R>(&self, f: impl FnOnce(&IndexSpec) -> R) -> R {
        f(&self.spec.read())
    }

    pub fn create_field(&self, name: &str, field_type: FieldType) -> Result<FieldId> {
        self.spec.write().create_field(name, field_type)
    }

    pub fn create_text_field(&self, name: &str) -> Result<FieldId> {
        self.create_field(name, FieldType::Text)
    }

    pub fn create_numeric_field(&self, name: &str) -> Result<FieldId> {
        self.create_field(name, FieldType::Numeric)
    }

    pub fn create_tag_field(&self, name: &str) -> Result<FieldId> {
        self.create_field(name, FieldType::Tag)
    }

    pub fn create_geo_field(&self, name: &str) -> Result<FieldId> {
        self.create_field(name, FieldType::Geo)
    }

    pub fn set_field_options(&self, name: &str, options: FieldOptions) -> Result<()> {
        self.spec.write().set_field_options(name, options)
    }

    pub fn set_text_weight(&self, name: &str, weight: f64) -> Result<()> {
        self.spec.write().set_field_weight(name, weight)
    }

    pub fn set_tag_separator(&self, name: &str, separator: char) -> Result<()> {
        self.spec.write().set_tag_separator(name, separator)
    }

    /// Turn phonetic matching on or off for a text field.
    pub fn set_phonetic(&self, name: &str, on: bool) -> Result<()> {
        self.spec
            .write()
            .toggle_field_option(name, FieldOptions::PHONETIC, on)
    }

    pub fn set_sortable(&self, name: &str, on: bool) -> Result<()> {
        self.spec
            .write()
            .toggle_field_option(name, FieldOptions::SORTABLE, on)
    }

    /// Add a group of interchangeable terms. Returns the group id.
    pub fn add_synonyms<I, S>(&self, terms: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.spec.write().add_synonyms(terms)
    }

    /// The current schema snapshot.
    pub fn spec_cache(&self) -> Arc<IndexSpecCache> {
        self.spec.read().spec_cache()
    }

    /// Commit a document and return its id.
    ///
    /// Every field value is checked before anything is written. A key that
    /// is already present is an error unless the document asks to replace
    /// it.
    pub fn add_document(&self, doc: Document) -> Result<DocId> {
        let mut spec = self.spec.write();
        let mut stores = self.stores.write();
        let mut docs = self.docs.write();

        let prepared = self.prepare(&spec, &doc)?;

        let mut replaced = None;
        if docs.contains_key(doc.key()) {
            if !doc.replace() {
                return Err(QuiverError::document(format!(
                    "Document '{}' already exists",
                    String::from_utf8_lossy(doc.key())
                )));
            }
            replaced = docs.remove_by_key(doc.key());
            spec.stats.num_documents -= 1;
        }

        let mut sort_values = vec![None; spec.num_sortables()];
        for (field, value) in &prepared {
            if let Some(slot) = field.sort_slot() {
                sort_values[slot] = Some(value.sort_value());
            }
        }

        let doc_id = docs.insert(doc.key().to_vec(), doc.score(), sort_values);
        spec.stats.num_documents += 1;

        for (field, value) in &prepared {
            if !field.is_indexed() {
                continue;
            }
            if let Err(e) = self.index_value(&mut spec, &mut stores, doc_id, field, value) {
                // Records already written for `doc_id` stay behind as dead
                // postings and keep counting toward the storage stats.
                docs.remove_by_key(doc.key());
                spec.stats.num_documents -= 1;
                if let Some(old) = replaced {
                    if docs.restore(old) {
                        spec.stats.num_documents += 1;
                    }
                }
                return Err(e);
            }
        }

        if let Some(old) = replaced {
            log::debug!(
                "replaced document '{}' ({} -> {doc_id})",
                String::from_utf8_lossy(doc.key()),
                old.id
            );
        }
        log::debug!(
            "committed document '{}' as {doc_id}",
            String::from_utf8_lossy(doc.key())
        );
        Ok(doc_id)
    }

    /// Resolve and check every field of `doc` against the schema.
    fn prepare(&self, spec: &IndexSpec, doc: &Document) -> Result<Vec<(FieldSpec, Prepared)>> {
        let mut seen: AHashMap<FieldId, usize> = AHashMap::with_capacity(doc.len());
        let mut prepared = Vec::with_capacity(doc.len());

        for (i, (name, value)) in doc.fields().iter().enumerate() {
            let field = spec
                .field(name)
                .ok_or_else(|| QuiverError::unknown_field(name.as_str()))?;
            if let Some(first) = seen.insert(field.id(), i) {
                return Err(QuiverError::document(format!(
                    "Field '{}' appears twice in document (entries {first} and {i})",
                    field.name()
                )));
            }

            let value = match field.field_type() {
                FieldType::Text | FieldType::Tag => match value {
                    FieldValue::Text(text) => Prepared::Text(text.clone()),
                    other => {
                        return Err(QuiverError::field(format!(
                            "Field '{}' expects text, got {}",
                            field.name(),
                            other.type_name()
                        )));
                    }
                },
                FieldType::Numeric => match value.as_numeric() {
                    Some(number) if !number.is_nan() => Prepared::Numeric(number),
                    _ => {
                        return Err(QuiverError::field(format!(
                            "Field '{}' expects a number, got {value:?}",
                            field.name()
                        )));
                    }
                },
                FieldType::Geo => match value.to_geo()? {
                    Some(point) => Prepared::Geo(point),
                    None => {
                        return Err(QuiverError::field(format!(
                            "Field '{}' expects a point, got {}",
                            field.name(),
                            value.type_name()
                        )));
                    }
                },
            };
            prepared.push((field.clone(), value));
        }
        Ok(prepared)
    }

    fn index_value(
        &self,
        spec: &mut IndexSpec,
        stores: &mut FieldStores,
        doc_id: DocId,
        field: &FieldSpec,
        value: &Prepared,
    ) -> Result<()> {
        let capacity = self.config.initial_buffer_capacity;
        match (field.field_type(), value) {
            (FieldType::Text, Prepared::Text(text)) => {
                self.index_text(spec, stores, doc_id, field, text)
            }
            (FieldType::Tag, Prepared::Text(raw)) => {
                let tags = stores.tags_mut(field.id(), || TagIndex::new(capacity))?;
                let before = tags.values().num_terms();
                let indexed = tags.index(doc_id, raw, field.tag_separator())?;
                let stats = &mut spec.stats;
                stats.num_records += indexed.records;
                stats.inverted_size += indexed.bytes;
                stats.inverted_cap += indexed.capacity_growth
                    + (tags.values().num_terms() - before) * capacity;
                Ok(())
            }
            (FieldType::Numeric, Prepared::Numeric(number)) => {
                stores
                    .numeric_mut(field.id(), NumericIndex::new)?
                    .insert(doc_id, *number)?;
                spec.stats.num_records += 1;
                Ok(())
            }
            (FieldType::Geo, Prepared::Geo(point)) => {
                stores.geo_mut(field.id(), GeoIndex::new)?.insert(doc_id, *point);
                spec.stats.num_records += 1;
                Ok(())
            }
            (field_type, _) => Err(QuiverError::index(format!(
                "Cannot index a {field_type} field from {value:?}"
            ))),
        }
    }

    fn index_text(
        &self,
        spec: &mut IndexSpec,
        stores: &mut FieldStores,
        doc_id: DocId,
        field: &FieldSpec,
        text: &str,
    ) -> Result<()> {
        let mut postings: BTreeMap<String, Posting> = BTreeMap::new();
        for token in self.tokenizer.tokenize(text) {
            if spec.is_stopword(&token.text) {
                continue;
            }
            postings
                .entry(token.text)
                .or_insert_with(|| Posting {
                    doc_id,
                    frequency: 0,
                    field: Some(field.id()),
                    ..Default::default()
                })
                .add_occurrence(token.position, token.byte_offset);
        }
        if postings.is_empty() {
            return Ok(());
        }

        let layout = PostingLayout::new(spec.flags(), spec.field_encoding());
        let capacity = self.config.initial_buffer_capacity;
        let dict = stores.text_mut(field.id(), || TermDictionary::new(layout, capacity))?;

        for (term, posting) in postings {
            let (handle, created) = dict.get_or_create(&term, Some(self.phonetic.as_ref()));
            let mut list = handle.write();
            let before = list.capacity();
            let written = list.add_posting(&posting)?;

            let stats = &mut spec.stats;
            if created {
                stats.num_terms += 1;
                stats.terms_size += term.len();
                stats.inverted_cap += before;
            }
            stats.inverted_cap += list.capacity() - before;
            stats.inverted_size += written;
            stats.num_records += 1;
        }
        Ok(())
    }

    /// Drop the document stored under `key`. Returns false if there was
    /// none.
    ///
    /// Its postings stay in place; queries compiled before or after the
    /// drop skip it.
    pub fn drop_document<K: AsRef<[u8]>>(&self, key: K) -> bool {
        let mut spec = self.spec.write();
        let removed = self.docs.write().remove_by_key(key.as_ref());
        match removed {
            Some(meta) => {
                spec.stats.num_documents -= 1;
                log::debug!(
                    "dropped document '{}' ({})",
                    String::from_utf8_lossy(&meta.key),
                    meta.id
                );
                true
            }
            None => false,
        }
    }

    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.docs.read().contains_key(key.as_ref())
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> usize {
        self.docs.read().len()
    }

    /// Document key for an id, if the document is live.
    pub fn key_of(&self, id: DocId) -> Option<Vec<u8>> {
        self.docs.read().get(id).map(|meta| meta.key.clone())
    }

    /// The stored value of a sortable field for a document.
    pub fn sort_value<K: AsRef<[u8]>>(&self, key: K, field: &str) -> Option<FieldValue> {
        let slot = self.spec.read().sorting_index(field)?;
        let docs = self.docs.read();
        docs.get_by_key(key.as_ref())?
            .sort_values
            .get(slot)
            .cloned()
            .flatten()
    }

    /// Compile `query` into a results iterator, or `None` when nothing can
    /// match.
    pub fn search(&self, query: &QueryNode) -> Result<Option<ResultsIterator>> {
        let spec = self.spec.read();
        let schema = spec.spec_cache();
        let stores = self.stores.read();
        let max_doc_id = self.docs.read().max_doc_id();

        let compiler = QueryCompiler {
            schema: &schema,
            spec: &spec,
            stores: &stores,
            docs: &self.docs,
            max_doc_id,
            config: &self.config,
            tokenizer: &self.tokenizer,
            phonetic: self.phonetic.as_ref(),
            provider: self.provider.as_ref(),
        };
        let root = compiler.compile(query)?;
        log::debug!(
            "compiled {query} on '{}': {}",
            spec.name(),
            root.as_ref().map_or("no iterator".to_string(), |r| r.kind().to_string())
        );
        Ok(root.map(|root| ResultsIterator::new(root, Arc::clone(&self.docs), Arc::clone(&schema))))
    }

    /// Release spare capacity in every posting list. Returns the bytes
    /// released.
    ///
    /// Takes the stores exclusively, so it waits for in-progress
    /// ingestion; open iterators keep working because they never read past
    /// the data they saw when opened.
    pub fn compact(&self) -> usize {
        let mut spec = self.spec.write();
        let stores = self.stores.write();
        let released: usize = stores
            .posting_lists()
            .iter()
            .map(|list| list.write().compact())
            .sum();
        spec.stats.inverted_cap -= released;
        log::debug!("compacted '{}', released {released} bytes", spec.name());
        released
    }

    /// Metadata and statistics.
    pub fn info(&self) -> IndexInfo {
        let spec = self.spec.read();
        let max_doc_id = self.docs.read().max_doc_id();
        IndexInfo {
            name: spec.name().to_string(),
            fields: spec.fields().iter().map(FieldInfo::from).collect(),
            field_encoding: spec.field_encoding(),
            flags: spec.flags().bits(),
            schema_version: spec.schema_version(),
            max_doc_id,
            stats: spec.stats(),
        }
    }
}
