//! Leaf iterator over one encoded posting list.

use crate::error::{QuiverError, Result};
use crate::index::doc_table::DocId;
use crate::index::inverted::PostingHandle;
use crate::index::posting::{Posting, PostingLayout};
use crate::query::iterator::{DocIterator, IteratorKind};
use crate::schema::field::FieldId;

/// Replays a posting list record by record.
///
/// The iterator keeps a byte position into the list's buffer, never an
/// address, and re-reads the buffer under a read lock on every step. It
/// stops at the end of data observed when it was opened, so postings
/// appended afterwards are not seen.
#[derive(Debug)]
pub struct TermIterator {
    term: String,
    list: PostingHandle,
    layout: PostingLayout,
    /// Field the postings must be attributed to, when records carry it.
    field: Option<FieldId>,
    /// Byte position of the next record.
    pos: usize,
    /// End of valid data when the iterator was opened.
    end: usize,
    current: DocId,
    num_docs: usize,
    exhausted: bool,
}

impl TermIterator {
    /// Open `list`, expecting every record to belong to `field` when given.
    pub fn new<S: Into<String>>(term: S, list: PostingHandle, field: Option<FieldId>) -> Self {
        let (layout, end, num_docs) = {
            let guard = list.read();
            (*guard.layout(), guard.size(), guard.num_docs())
        };
        TermIterator {
            term: term.into(),
            list,
            layout,
            field: field.filter(|_| layout.stores_field()),
            pos: 0,
            end,
            current: 0,
            num_docs,
            exhausted: end == 0,
        }
    }

    fn read_next(&self) -> Result<Option<(Posting, usize)>> {
        let list = self.list.read();
        let mut reader = list.buffer().reader_at(self.pos).bounded(self.end);
        if reader.at_end() {
            return Ok(None);
        }
        let posting = Posting::decode(&mut reader, self.current, &self.layout)?;
        if let Some(expected) = self.field {
            if posting.field != Some(expected) {
                return Err(QuiverError::decode(format!(
                    "Posting of '{}' for document {} is attributed to field {:?}, expected {expected}",
                    self.term, posting.doc_id, posting.field
                )));
            }
        }
        Ok(Some((posting, reader.position())))
    }
}

impl DocIterator for TermIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        match self.read_next() {
            Ok(Some((posting, next_pos))) => {
                self.current = posting.doc_id;
                self.pos = next_pos;
                Ok(true)
            }
            Ok(None) => {
                self.exhausted = true;
                Ok(false)
            }
            Err(e) => {
                log::warn!("term '{}': stopping at byte {}: {e}", self.term, self.pos);
                self.exhausted = true;
                Err(e)
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn cost(&self) -> u64 {
        self.num_docs as u64
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Term
    }
}

/// A leaf over `ids` whose records belong to another field than the one it
/// was opened for, so its first step fails with a decode error.
#[cfg(test)]
pub(crate) fn misattributed_leaf(ids: &[DocId]) -> Box<dyn DocIterator> {
    use crate::index::inverted::InvertedIndex;
    use crate::schema::spec::{FieldEncoding, IndexFlags};

    let layout = PostingLayout::new(IndexFlags::DEFAULT, FieldEncoding::Compact);
    let list = InvertedIndex::new_handle(layout, 6);
    for &id in ids {
        let mut posting = Posting::new(id).with_field(2);
        posting.add_occurrence(0, 0);
        list.write().add_posting(&posting).unwrap();
    }
    Box::new(TermIterator::new("corrupt", list, Some(3)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::InvertedIndex;
    use crate::query::iterator::{SkipOutcome, collect_ids};
    use crate::schema::spec::{FieldEncoding, IndexFlags};

    fn text_list(field: FieldId, ids: &[DocId]) -> PostingHandle {
        let layout = PostingLayout::new(IndexFlags::DEFAULT, FieldEncoding::Compact);
        let handle = InvertedIndex::new_handle(layout, 6);
        for &id in ids {
            let mut posting = Posting::new(id).with_field(field);
            posting.add_occurrence(0, 0);
            handle.write().add_posting(&posting).unwrap();
        }
        handle
    }

    #[test]
    fn test_iterates_postings() {
        let list = text_list(1, &[1, 3, 200, 70_000]);
        let mut iter = TermIterator::new("index", list, Some(1));
        assert_eq!(iter.cost(), 4);
        assert_eq!(collect_ids(&mut iter).unwrap(), vec![1, 3, 200, 70_000]);
        assert!(iter.is_exhausted());
        assert!(!iter.advance().unwrap());
    }

    #[test]
    fn test_skip_to() {
        let list = text_list(0, &[2, 4, 9]);
        let mut iter = TermIterator::new("t", list, Some(0));
        assert_eq!(iter.skip_to(3).unwrap(), SkipOutcome::Overshoot);
        assert_eq!(iter.doc_id(), 4);
        assert_eq!(iter.skip_to(9).unwrap(), SkipOutcome::Found);
        assert_eq!(iter.skip_to(10).unwrap(), SkipOutcome::Eof);
    }

    #[test]
    fn test_ignores_postings_appended_after_open() {
        let list = text_list(0, &[1, 2]);
        let mut iter = TermIterator::new("t", PostingHandle::clone(&list), Some(0));

        // Force growth past the original allocation while the iterator is open.
        for id in 3..500 {
            let mut posting = Posting::new(id).with_field(0);
            posting.add_occurrence(0, 0);
            list.write().add_posting(&posting).unwrap();
        }

        assert_eq!(collect_ids(&mut iter).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_wrong_field_fails_closed() {
        let list = text_list(2, &[1, 2]);
        let mut iter = TermIterator::new("t", list, Some(3));
        assert!(matches!(iter.advance(), Err(QuiverError::Decode(_))));
        assert!(iter.is_exhausted());
        assert!(!iter.advance().unwrap());
    }

    #[test]
    fn test_empty_list() {
        let layout = PostingLayout::doc_ids_only();
        let mut iter = TermIterator::new("t", InvertedIndex::new_handle(layout, 6), None);
        assert!(iter.is_exhausted());
        assert!(!iter.advance().unwrap());
    }
}
