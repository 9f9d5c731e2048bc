//! Sorted numeric field storage and range selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuiverError, Result};
use crate::index::doc_table::DocId;

/// A closed, open or half-open interval over `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl NumericRange {
    pub fn new(min: f64, max: f64, min_inclusive: bool, max_inclusive: bool) -> Self {
        NumericRange {
            min,
            max,
            min_inclusive,
            max_inclusive,
        }
    }

    /// `[min, max]`.
    pub fn inclusive(min: f64, max: f64) -> Self {
        Self::new(min, max, true, true)
    }

    /// Build from the argument order of the low-level C-style interface:
    /// upper bound first.
    pub fn from_max_min(max: f64, min: f64, max_inclusive: bool, min_inclusive: bool) -> Self {
        Self::new(min, max, min_inclusive, max_inclusive)
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        let below = if self.max_inclusive {
            value <= self.max
        } else {
            value < self.max
        };
        above && below
    }

    /// NaN bounds are rejected; an inverted range is legal and matches
    /// nothing.
    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() {
            return Err(QuiverError::query("Numeric range bound is NaN"));
        }
        Ok(())
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.min_inclusive { '[' } else { '(' },
            self.min,
            self.max,
            if self.max_inclusive { ']' } else { ')' },
        )
    }
}

/// Values of one numeric field, kept sorted by value.
#[derive(Debug, Default)]
pub struct NumericIndex {
    entries: Vec<(f64, DocId)>,
}

impl NumericIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. NaN is rejected.
    pub fn insert(&mut self, doc_id: DocId, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(QuiverError::field("Numeric value is NaN"));
        }
        let at = self
            .entries
            .partition_point(|&(v, id)| v < value || (v == value && id < doc_id));
        self.entries.insert(at, (value, doc_id));
        Ok(())
    }

    /// Documents whose value falls in `range`, ascending by id.
    ///
    /// The matching entries form one contiguous run of the sorted store,
    /// found by two binary searches.
    pub fn range(&self, range: &NumericRange) -> Vec<DocId> {
        let start = self.entries.partition_point(|&(v, _)| {
            if range.min_inclusive {
                v < range.min
            } else {
                v <= range.min
            }
        });
        let end = self.entries.partition_point(|&(v, _)| {
            if range.max_inclusive {
                v <= range.max
            } else {
                v < range.max
            }
        });
        if start >= end {
            return Vec::new();
        }

        let mut ids: Vec<DocId> = self.entries[start..end].iter().map(|&(_, id)| id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
