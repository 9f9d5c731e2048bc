//! Union (OR) of child iterators.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::index::doc_table::DocId;
use crate::query::iterator::{DocIterator, IteratorKind, SkipOutcome, stop_on_error};

/// A child in the union heap, ordered by its current document.
#[derive(Debug)]
struct HeapEntry {
    iter: Box<dyn DocIterator>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.iter.doc_id() == other.iter.doc_id()
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first
        other.iter.doc_id().cmp(&self.iter.doc_id())
    }
}

/// Yields every document present in at least one child, once.
///
/// Children sit in a min-heap keyed by their current document; the top of
/// the heap is the union's current document. Children positioned on the
/// same document are all advanced past it together. An error from any
/// child ends the union.
#[derive(Debug)]
pub struct UnionIterator {
    /// Children not yet started.
    pending: Vec<Box<dyn DocIterator>>,
    /// Started, non-exhausted children.
    heap: BinaryHeap<HeapEntry>,
    current: DocId,
    exhausted: bool,
    cost: u64,
}

impl UnionIterator {
    pub fn new(children: Vec<Box<dyn DocIterator>>) -> Self {
        let cost = children.iter().map(|c| c.cost()).sum();
        let exhausted = children.is_empty();
        UnionIterator {
            heap: BinaryHeap::with_capacity(children.len()),
            pending: children,
            current: 0,
            exhausted,
            cost,
        }
    }

    /// Number of children still contributing documents.
    pub fn len(&self) -> usize {
        self.pending.len() + self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position every pending child at its first document `>= target`.
    fn start(&mut self, target: DocId) -> Result<()> {
        while let Some(mut iter) = self.pending.pop() {
            let outcome = if target <= 1 {
                if iter.advance()? {
                    SkipOutcome::Found
                } else {
                    SkipOutcome::Eof
                }
            } else {
                iter.skip_to(target)?
            };
            if outcome != SkipOutcome::Eof {
                self.heap.push(HeapEntry { iter });
            }
        }
        Ok(())
    }

    /// Move every child sitting below `target` up to it.
    fn raise_below(&mut self, target: DocId) -> Result<()> {
        while let Some(entry) = self.heap.peek() {
            if entry.iter.doc_id() >= target {
                break;
            }
            let Some(mut entry) = self.heap.pop() else {
                break;
            };
            let moved = if entry.iter.doc_id() + 1 == target {
                entry.iter.advance()?
            } else {
                entry.iter.skip_to(target)? != SkipOutcome::Eof
            };
            if moved {
                self.heap.push(entry);
            }
        }
        Ok(())
    }

    /// Bring every child to its first document `>= target`.
    fn position(&mut self, target: DocId) -> Result<()> {
        if self.pending.is_empty() {
            self.raise_below(target)
        } else {
            self.start(target)
        }
    }

    fn settle(&mut self) -> bool {
        match self.heap.peek() {
            Some(entry) => {
                self.current = entry.iter.doc_id();
                true
            }
            None => {
                self.exhausted = true;
                false
            }
        }
    }
}

impl DocIterator for UnionIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let target = self.current.saturating_add(1);
        let result = self.position(target);
        stop_on_error(&mut self.exhausted, result)?;
        Ok(self.settle())
    }

    fn skip_to(&mut self, target: DocId) -> Result<SkipOutcome> {
        if self.exhausted {
            return Ok(SkipOutcome::Eof);
        }
        if self.pending.is_empty() && self.current >= target {
            return Ok(if self.current == target {
                SkipOutcome::Found
            } else {
                SkipOutcome::Overshoot
            });
        }

        let result = self.position(target);
        stop_on_error(&mut self.exhausted, result)?;
        if !self.settle() {
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
        self.cost
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Union
    }
}
