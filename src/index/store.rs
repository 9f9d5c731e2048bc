//! Per-field value stores.

use ahash::AHashMap;

use crate::error::{QuiverError, Result};
use crate::index::dictionary::TermDictionary;
use crate::index::geo::GeoIndex;
use crate::index::inverted::PostingHandle;
use crate::index::numeric::NumericIndex;
use crate::index::tag::TagIndex;
use crate::schema::field::FieldId;

/// The indexed values of one field.
#[derive(Debug)]
pub enum FieldStore {
    Text(TermDictionary),
    Tag(TagIndex),
    Numeric(NumericIndex),
    Geo(GeoIndex),
}

impl FieldStore {
    fn kind(&self) -> &'static str {
        match self {
            FieldStore::Text(_) => "TEXT",
            FieldStore::Tag(_) => "TAG",
            FieldStore::Numeric(_) => "NUMERIC",
            FieldStore::Geo(_) => "GEO",
        }
    }
}

/// Stores keyed by field id, created on first use.
#[derive(Debug, Default)]
pub struct FieldStores {
    stores: AHashMap<FieldId, FieldStore>,
}

macro_rules! store_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $name:literal) => {
        pub fn $get(&self, id: FieldId) -> Option<&$ty> {
            match self.stores.get(&id) {
                Some(FieldStore::$variant(store)) => Some(store),
                _ => None,
            }
        }

        pub fn $get_mut(
            &mut self,
            id: FieldId,
            create: impl FnOnce() -> $ty,
        ) -> Result<&mut $ty> {
            match self
                .stores
                .entry(id)
                .or_insert_with(|| FieldStore::$variant(create()))
            {
                FieldStore::$variant(store) => Ok(store),
                other => Err(QuiverError::index(format!(
                    "Field {id} holds {} values, not {}",
                    other.kind(),
                    $name
                ))),
            }
        }
    };
}

impl FieldStores {
    pub fn new() -> Self {
        Self::default()
    }

    store_accessors!(text, text_mut, Text, TermDictionary, "TEXT");
    store_accessors!(tags, tags_mut, Tag, TagIndex, "TAG");
    store_accessors!(numeric, numeric_mut, Numeric, NumericIndex, "NUMERIC");
    store_accessors!(geo, geo_mut, Geo, GeoIndex, "GEO");

    /// Every text and tag posting list.
    pub fn posting_lists(&self) -> Vec<PostingHandle> {
        let mut lists = Vec::new();
        for store in self.stores.values() {
            match store {
                FieldStore::Text(dict) => lists.extend(dict.posting_lists().cloned()),
                FieldStore::Tag(tags) => lists.extend(tags.values().posting_lists().cloned()),
                FieldStore::Numeric(_) | FieldStore::Geo(_) => {}
            }
        }
        lists
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::posting::PostingLayout;

    #[test]
    fn test_created_on_first_use() {
        let mut stores = FieldStores::new();
        assert!(stores.numeric(0).is_none());

        stores.numeric_mut(0, NumericIndex::new).unwrap().insert(1, 5.0).unwrap();
        assert_eq!(stores.numeric(0).map(NumericIndex::len), Some(1));

        // Field 0 already holds numbers.
        assert!(stores.geo_mut(0, GeoIndex::new).is_err());
        assert!(stores.geo(0).is_none());
    }

    #[test]
    fn test_posting_lists_cover_text_and_tags() {
        let mut stores = FieldStores::new();
        let text = stores
            .text_mut(0, || TermDictionary::new(PostingLayout::doc_ids_only(), 6))
            .unwrap();
        text.get_or_create("hello", None);
        text.get_or_create("world", None);
        stores
            .tags_mut(1, || TagIndex::new(6))
            .unwrap()
            .index(1, "a,b,c", ',')
            .unwrap();
        stores.numeric_mut(2, NumericIndex::new).unwrap();

        assert_eq!(stores.posting_lists().len(), 5);
        assert_eq!(stores.len(), 3);
    }
}
