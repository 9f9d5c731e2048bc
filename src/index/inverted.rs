//! A single posting list backed by an encoding buffer.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::index::doc_table::DocId;
use crate::index::posting::{Posting, PostingLayout};
use crate::storage::buffer::Buffer;

/// Shared handle to a posting list.
///
/// Iterators hold the handle, not the bytes, and take a read lock per
/// record so a concurrent append (and the growth it may cause) is never
/// observed half done.
pub type PostingHandle = Arc<RwLock<InvertedIndex>>;

/// The encoded postings of one term (or tag value), in document order.
#[derive(Debug)]
pub struct InvertedIndex {
    buffer: Buffer,
    layout: PostingLayout,
    last_doc_id: DocId,
    num_docs: usize,
}

impl InvertedIndex {
    /// An empty list with `initial_capacity` bytes allocated.
    pub fn new(layout: PostingLayout, initial_capacity: usize) -> Self {
        InvertedIndex {
            buffer: Buffer::new(initial_capacity),
            layout,
            last_doc_id: 0,
            num_docs: 0,
        }
    }

    /// Wrap a new list in a shared handle.
    pub fn new_handle(layout: PostingLayout, initial_capacity: usize) -> PostingHandle {
        Arc::new(RwLock::new(Self::new(layout, initial_capacity)))
    }

    /// Append a posting, which must name a document after every posting
    /// already in the list. Returns the bytes written.
    ///
    /// The record is encoded in full before it touches the buffer, so a
    /// failed append leaves the list unchanged.
    pub fn add_posting(&mut self, posting: &Posting) -> Result<usize> {
        let mut record = Vec::with_capacity(16);
        posting.encode(&mut record, self.last_doc_id, &self.layout)?;

        let written = self.buffer.writer().write(&record);
        self.last_doc_id = posting.doc_id;
        self.num_docs += 1;
        Ok(written)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn layout(&self) -> &PostingLayout {
        &self.layout
    }

    /// Document of the most recent posting, 0 for an empty list.
    pub fn last_doc_id(&self) -> DocId {
        self.last_doc_id
    }

    /// Number of postings in the list.
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Bytes of encoded postings.
    pub fn size(&self) -> usize {
        self.buffer.offset()
    }

    /// Bytes allocated for the list.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Release allocated space past the last record. Returns the bytes
    /// released.
    pub fn compact(&mut self) -> usize {
        let before = self.buffer.capacity();
        let after = self.buffer.truncate(None);
        before - after
    }

    /// Decode every posting in the list.
    pub fn postings(&self) -> Result<Vec<Posting>> {
        let mut reader = self.buffer.reader();
        let mut postings = Vec::with_capacity(self.num_docs);
        let mut last = 0;
        while !reader.at_end() {
            let posting = Posting::decode(&mut reader, last, &self.layout)?;
            last = posting.doc_id;
            postings.push(posting);
        }
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::spec::{FieldEncoding, IndexFlags};

    #[test]
    fn test_append_and_decode() {
        let layout = PostingLayout::new(IndexFlags::DEFAULT, FieldEncoding::Compact);
        let mut list = InvertedIndex::new(layout, 6);

        for doc_id in [1, 2, 40, 1000] {
            let mut posting = Posting::new(doc_id).with_field(0);
            posting.add_occurrence(0, 0);
            list.add_posting(&posting).unwrap();
        }

        assert_eq!(list.num_docs(), 4);
        assert_eq!(list.last_doc_id(), 1000);
        assert!(list.capacity() >= list.size());

        let ids: Vec<DocId> = list.postings().unwrap().iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 2, 40, 1000]);
    }

    #[test]
    fn test_failed_append_leaves_list_untouched() {
        let mut list = InvertedIndex::new(PostingLayout::doc_ids_only(), 6);
        list.add_posting(&Posting::new(5)).unwrap();
        let size = list.size();

        assert!(list.add_posting(&Posting::new(3)).is_err());
        assert_eq!(list.size(), size);
        assert_eq!(list.num_docs(), 1);
    }

    #[test]
    fn test_compact() {
        let mut list = InvertedIndex::new(PostingLayout::doc_ids_only(), 1024);
        list.add_posting(&Posting::new(1)).unwrap();

        assert_eq!(list.compact(), 1023);
        assert_eq!(list.capacity(), 1);
        assert_eq!(list.postings().unwrap(), vec![Posting::new(1)]);

        // Appending after compaction grows again.
        list.add_posting(&Posting::new(300)).unwrap();
        assert_eq!(list.postings().unwrap().len(), 2);
    }
}
