//! Complement (NOT) of a child iterator over the document universe.

use crate::error::Result;
use crate::index::doc_table::DocId;
use crate::query::iterator::{DocIterator, IteratorKind, SkipOutcome, stop_on_error};

/// Walks `1..=max_doc_id` and yields every id the child does not.
///
/// The universe is fixed when the iterator is built. Ids of dropped
/// documents are yielded here and filtered by the top-level results
/// iterator. A failing child ends the complement: once the child can no
/// longer say what it holds, no id is safe to yield.
#[derive(Debug)]
pub struct NotIterator {
    child: Box<dyn DocIterator>,
    max_doc_id: DocId,
    current: DocId,
    exhausted: bool,
}

impl NotIterator {
    pub fn new(child: Box<dyn DocIterator>, max_doc_id: DocId) -> Self {
        NotIterator {
            child,
            max_doc_id,
            current: 0,
            exhausted: max_doc_id == 0,
        }
    }

    /// Whether the child holds `id`, moving the child up to it first.
    fn excluded(&mut self, id: DocId) -> Result<bool> {
        if self.child.is_exhausted() {
            return Ok(false);
        }
        Ok(self.child.skip_to(id)? == SkipOutcome::Found)
    }

    /// Yield the first id `>= from` absent from the child.
    fn next_from(&mut self, from: DocId) -> Result<bool> {
        let mut candidate = from;
        while candidate <= self.max_doc_id {
            if !self.excluded(candidate)? {
                self.current = candidate;
                return Ok(true);
            }
            candidate += 1;
        }
        self.exhausted = true;
        Ok(false)
    }
}

impl DocIterator for NotIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let result = self.next_from(self.current + 1);
        stop_on_error(&mut self.exhausted, result)
    }

    fn skip_to(&mut self, target: DocId) -> Result<SkipOutcome> {
        if self.exhausted {
            return Ok(SkipOutcome::Eof);
        }
        if self.current >= target && self.current != 0 {
            return Ok(if self.current == target {
                SkipOutcome::Found
            } else {
                SkipOutcome::Overshoot
            });
        }
        let result = self.next_from(target.max(1));
        if !stop_on_error(&mut self.exhausted, result)? {
            return Ok(SkipOutcome::Eof);
        }
        Ok(if self.current == target {
            SkipOutcome::Found
        } else {
            SkipOutcome::Overshoot
        })
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn cost(&self) -> u64 {
        self.max_doc_id
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Not
    }
}
