//! The document table: key ↔ id mapping, scores and sorting values.

use ahash::AHashMap;

use crate::document::FieldValue;

/// Internal document identity. Assigned in commit order starting at 1; 0
/// means "no document".
pub type DocId = u64;

/// What the table keeps for a live document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub id: DocId,
    pub key: Vec<u8>,
    pub score: f32,
    /// Values of sortable fields, indexed by sorting slot.
    pub sort_values: Vec<Option<FieldValue>>,
}

/// Live documents by id and by key.
///
/// Ids are never reused: a dropped document leaves a hole, and a replaced
/// document gets a new id.
#[derive(Debug, Default)]
pub struct DocTable {
    docs: Vec<Option<DocumentMetadata>>,
    by_key: AHashMap<Vec<u8>, DocId>,
    live: usize,
}

impl DocTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest id ever assigned.
    pub fn max_doc_id(&self) -> DocId {
        self.docs.len() as DocId
    }

    /// The id the next insert will receive.
    pub fn next_doc_id(&self) -> DocId {
        self.max_doc_id() + 1
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Store a new document under the next id and return it.
    pub fn insert(&mut self, key: Vec<u8>, score: f32, sort_values: Vec<Option<FieldValue>>) -> DocId {
        let id = self.next_doc_id();
        self.by_key.insert(key.clone(), id);
        self.docs.push(Some(DocumentMetadata {
            id,
            key,
            score,
            sort_values,
        }));
        self.live += 1;
        id
    }

    pub fn get(&self, id: DocId) -> Option<&DocumentMetadata> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.docs.get(index)?.as_ref()
    }

    pub fn get_by_key(&self, key: &[u8]) -> Option<&DocumentMetadata> {
        self.by_key.get(key).and_then(|&id| self.get(id))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn is_live(&self, id: DocId) -> bool {
        self.get(id).is_some()
    }

    /// Remove the document stored under `key`.
    pub fn remove_by_key(&mut self, key: &[u8]) -> Option<DocumentMetadata> {
        let id = self.by_key.remove(key)?;
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        let removed = self.docs.get_mut(index)?.take();
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Put a removed document back under its original id.
    ///
    /// Does nothing if the id was never assigned or is occupied, or if the
    /// key now belongs to another live document.
    pub(crate) fn restore(&mut self, meta: DocumentMetadata) -> bool {
        if self.by_key.contains_key(&meta.key) {
            return false;
        }
        let Some(slot) = usize::try_from(meta.id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.docs.get_mut(index))
        else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        self.by_key.insert(meta.key.clone(), meta.id);
        *slot = Some(meta);
        self.live += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_never_reused() {
        let mut table = DocTable::new();
        assert_eq!(table.insert(b"a".to_vec(), 1.0, Vec::new()), 1);
        assert_eq!(table.insert(b"b".to_vec(), 1.0, Vec::new()), 2);

        let removed = table.remove_by_key(b"a").unwrap();
        assert_eq!(removed.id, 1);
        assert!(!table.is_live(1));
        assert_eq!(table.len(), 1);

        assert_eq!(table.insert(b"a".to_vec(), 0.5, Vec::new()), 3);
        assert_eq!(table.get_by_key(b"a").map(|d| d.id), Some(3));
        assert_eq!(table.max_doc_id(), 3);
    }

    #[test]
    fn test_missing() {
        let mut table = DocTable::new();
        assert!(table.get(0).is_none());
        assert!(table.get(1).is_none());
        assert!(table.remove_by_key(b"nope").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_restore() {
        let mut table = DocTable::new();
        table.insert(b"a".to_vec(), 1.0, Vec::new());
        let removed = table.remove_by_key(b"a").unwrap();

        let id = table.insert(b"a".to_vec(), 1.0, Vec::new());
        assert!(!table.restore(removed.clone()));
        table.remove_by_key(b"a");

        assert!(table.restore(removed.clone()));
        assert_eq!(table.get_by_key(b"a").map(|d| d.id), Some(1));
        assert!(!table.is_live(id));
        assert_eq!(table.len(), 1);
        assert!(!table.restore(removed));
    }
}
