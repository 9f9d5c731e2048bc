//! The caller-facing handle over a compiled iterator tree.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::index::doc_table::{DocId, DocTable};
use crate::query::iterator::{DocIterator, IteratorKind};
use crate::schema::cache::IndexSpecCache;

/// Pulls matching documents from a compiled query.
///
/// Documents dropped after the query was compiled, or before it, are
/// skipped here rather than in each leaf. The schema snapshot the query
/// was compiled against stays alive as long as the iterator does.
///
/// The first error ends the results: every later call returns `Ok(None)`.
#[derive(Debug)]
pub struct ResultsIterator {
    root: Box<dyn DocIterator>,
    docs: Arc<RwLock<DocTable>>,
    schema: Arc<IndexSpecCache>,
    failed: bool,
}

impl ResultsIterator {
    pub(crate) fn new(
        root: Box<dyn DocIterator>,
        docs: Arc<RwLock<DocTable>>,
        schema: Arc<IndexSpecCache>,
    ) -> Self {
        ResultsIterator {
            root,
            docs,
            schema,
            failed: false,
        }
    }

    /// Step the root, remembering a failure.
    fn step(&mut self) -> Result<Option<DocId>> {
        if self.failed {
            return Ok(None);
        }
        match self.root.advance() {
            Ok(true) => Ok(Some(self.root.doc_id())),
            Ok(false) => Ok(None),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Next live document id, or `None` at the end of results.
    pub fn next_id(&mut self) -> Result<Option<DocId>> {
        while let Some(id) = self.step()? {
            if self.docs.read().is_live(id) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Key of the next live document, or `None` at the end of results.
    pub fn next_key(&mut self) -> Result<Option<Vec<u8>>> {
        while let Some(id) = self.step()? {
            if let Some(meta) = self.docs.read().get(id) {
                return Ok(Some(meta.key.clone()));
            }
        }
        Ok(None)
    }

    /// Drain the remaining keys.
    pub fn collect_keys(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        while let Some(key) = self.next_key()? {
            keys.push(key);
        }
        Ok(keys)
    }

    /// Schema snapshot the query was compiled against.
    pub fn schema(&self) -> &Arc<IndexSpecCache> {
        &self.schema
    }

    /// Kind of the root iterator.
    pub fn kind(&self) -> IteratorKind {
        self.root.kind()
    }

    /// Upper bound on the number of results.
    pub fn cost(&self) -> u64 {
        self.root.cost()
    }
}

impl Iterator for ResultsIterator {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}
