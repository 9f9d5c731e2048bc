//! The pull protocol shared by every compiled query node.

use std::fmt::{self, Debug};

use crate::error::Result;
use crate::index::doc_table::DocId;

/// Where [`DocIterator::skip_to`] left the iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// Positioned exactly on the target.
    Found,
    /// Positioned on the first document after the target.
    Overshoot,
    /// No document at or after the target.
    Eof,
}

/// What a compiled iterator node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorKind {
    Empty,
    Term,
    IdList,
    Lazy,
    Union,
    Intersect,
    Not,
}

impl fmt::Display for IteratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IteratorKind::Empty => "EMPTY",
            IteratorKind::Term => "TERM",
            IteratorKind::IdList => "ID_LIST",
            IteratorKind::Lazy => "LAZY",
            IteratorKind::Union => "UNION",
            IteratorKind::Intersect => "INTERSECT",
            IteratorKind::Not => "NOT",
        };
        f.write_str(name)
    }
}

/// A forward-only stream of strictly ascending document ids.
///
/// `doc_id()` is 0 until the first successful `advance` or `skip_to`, and
/// keeps the last id once the iterator is exhausted. An `Err` ends the
/// stream: the iterator is exhausted afterwards and yields nothing more.
pub trait DocIterator: Send + Debug {
    /// The current document ID.
    fn doc_id(&self) -> DocId;

    /// Move to the next document. Returns false once exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Move to the first document `>= target`.
    ///
    /// An iterator already positioned at or past `target` stays put.
    fn skip_to(&mut self, target: DocId) -> Result<SkipOutcome> {
        if self.is_exhausted() {
            return Ok(SkipOutcome::Eof);
        }
        while self.doc_id() < target {
            if !self.advance()? {
                return Ok(SkipOutcome::Eof);
            }
        }
        Ok(if self.doc_id() == target {
            SkipOutcome::Found
        } else {
            SkipOutcome::Overshoot
        })
    }

    /// Check if this iterator is exhausted.
    fn is_exhausted(&self) -> bool;

    /// Upper bound on the number of documents this iterator can yield.
    fn cost(&self) -> u64;

    fn kind(&self) -> IteratorKind;
}

/// An iterator that yields nothing.
#[derive(Debug, Default)]
pub struct EmptyIterator;

impl EmptyIterator {
    pub fn new() -> Self {
        EmptyIterator
    }
}

impl DocIterator for EmptyIterator {
    fn doc_id(&self) -> DocId {
        0
    }

    fn advance(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn is_exhausted(&self) -> bool {
        true
    }

    fn cost(&self) -> u64 {
        0
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Empty
    }
}

/// Iterates a precomputed list of document ids.
///
/// Backs numeric range and geo radius results, which are selected from
/// their stores in one pass at compile time.
#[derive(Debug)]
pub struct IdListIterator {
    doc_ids: Vec<DocId>,
    /// Index of the next id to yield.
    next: usize,
    current: DocId,
    exhausted: bool,
}

impl IdListIterator {
    /// Create from any ids; they are sorted and deduplicated.
    pub fn new(mut doc_ids: Vec<DocId>) -> Self {
        doc_ids.sort_unstable();
        doc_ids.dedup();
        let exhausted = doc_ids.is_empty();
        IdListIterator {
            doc_ids,
            next: 0,
            current: 0,
            exhausted,
        }
    }
}

impl DocIterator for IdListIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        match self.doc_ids.get(self.next) {
            Some(&id) => {
                self.current = id;
                self.next += 1;
                Ok(true)
            }
            None => {
                self.exhausted = true;
                Ok(false)
            }
        }
    }

    fn skip_to(&mut self, target: DocId) -> Result<SkipOutcome> {
        if self.exhausted {
            return Ok(SkipOutcome::Eof);
        }
        if self.current >= target && self.next > 0 {
            return Ok(if self.current == target {
                SkipOutcome::Found
            } else {
                SkipOutcome::Overshoot
            });
        }

        self.next += self.doc_ids[self.next..].partition_point(|&id| id < target);
        if !self.advance()? {
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
        self.doc_ids.len() as u64
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::IdList
    }
}

/// Drain an iterator into a vector. Test and debugging helper.
pub fn collect_ids(iter: &mut dyn DocIterator) -> Result<Vec<DocId>> {
    let mut ids = Vec::new();
    while iter.advance()? {
        ids.push(iter.doc_id());
    }
    Ok(ids)
}

/// Exhaust a composite iterator when a step of it failed, so it never
/// resumes past the failure.
pub(crate) fn stop_on_error<T>(exhausted: &mut bool, result: Result<T>) -> Result<T> {
    if result.is_err() {
        *exhausted = true;
    }
    result
}
