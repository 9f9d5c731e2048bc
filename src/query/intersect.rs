//! Intersection (AND) of child iterators.

use crate::error::Result;
use crate::index::doc_table::DocId;
use crate::query::iterator::{DocIterator, IteratorKind, SkipOutcome, stop_on_error};

/// Yields the documents present in every child.
///
/// Children are kept cheapest first. Alignment skips each child to the
/// current candidate; any overshoot raises the candidate and restarts the
/// round, so every child only ever moves forward. An error from any child
/// ends the intersection.
#[derive(Debug)]
pub struct IntersectIterator {
    children: Vec<Box<dyn DocIterator>>,
    current: DocId,
    exhausted: bool,
    cost: u64,
}

impl IntersectIterator {
    pub fn new(mut children: Vec<Box<dyn DocIterator>>) -> Self {
        children.sort_by_key(|c| c.cost());
        let cost = children.iter().map(|c| c.cost()).min().unwrap_or(0);
        let exhausted = children.is_empty() || children.iter().any(|c| c.is_exhausted());
        IntersectIterator {
            children,
            current: 0,
            exhausted,
            cost,
        }
    }

    /// Find the first document `>= candidate` shared by every child.
    fn align(&mut self, mut candidate: DocId) -> Result<bool> {
        'round: loop {
            for child in &mut self.children {
                match child.skip_to(candidate)? {
                    SkipOutcome::Found => {}
                    SkipOutcome::Overshoot => {
                        candidate = child.doc_id();
                        continue 'round;
                    }
                    SkipOutcome::Eof => {
                        self.exhausted = true;
                        return Ok(false);
                    }
                }
            }
            self.current = candidate;
            return Ok(true);
        }
    }
}

impl DocIterator for IntersectIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let result = self.align(self.current.saturating_add(1));
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
        let result = self.align(target.max(1));
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
        self.cost
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Intersect
    }
}
