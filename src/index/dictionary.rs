//! Term dictionaries.
//!
//! The query compiler only needs two capabilities from a dictionary: exact
//! lookup and an ordered walk over every term sharing a prefix. Those are
//! the [`TermLookup`] trait; [`TermDictionary`] is the in-memory
//! implementation used for both text terms and tag values.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::Bound;

use ahash::AHashMap;

use crate::analysis::PhoneticEncoder;
use crate::index::inverted::{InvertedIndex, PostingHandle};
use crate::index::posting::PostingLayout;

/// Terms matched by a prefix, in dictionary order.
#[derive(Debug, Clone, Default)]
pub struct PrefixExpansion {
    /// Matching terms with their posting lists.
    pub terms: Vec<(String, PostingHandle)>,
    /// True when the walk stopped at the expansion limit.
    pub truncated: bool,
}

/// Read access to a dictionary of posting lists.
pub trait TermLookup: Send + Sync + Debug {
    /// The posting list of `term`, if indexed.
    fn lookup(&self, term: &str) -> Option<PostingHandle>;

    /// Every term starting with `prefix`, in order, stopping after `limit`
    /// terms when given.
    fn expand_prefix(&self, prefix: &str, limit: Option<usize>) -> PrefixExpansion;

    /// Number of distinct terms.
    fn num_terms(&self) -> usize;
}

/// Ordered map from term to posting list.
///
/// Optionally keeps a side table from phonetic key to the terms sharing it,
/// filled as terms are inserted.
#[derive(Debug)]
pub struct TermDictionary {
    terms: BTreeMap<String, PostingHandle>,
    phonetic: AHashMap<String, BTreeSet<String>>,
    layout: PostingLayout,
    initial_capacity: usize,
    terms_size: usize,
}

impl TermDictionary {
    /// An empty dictionary whose posting lists use `layout`.
    pub fn new(layout: PostingLayout, initial_capacity: usize) -> Self {
        TermDictionary {
            terms: BTreeMap::new(),
            phonetic: AHashMap::new(),
            layout,
            initial_capacity,
            terms_size: 0,
        }
    }

    /// The posting list of `term`, created empty if missing. The flag is
    /// true when the term is new.
    pub fn get_or_create(
        &mut self,
        term: &str,
        encoder: Option<&dyn PhoneticEncoder>,
    ) -> (PostingHandle, bool) {
        if let Some(handle) = self.terms.get(term) {
            return (PostingHandle::clone(handle), false);
        }

        let handle = InvertedIndex::new_handle(self.layout, self.initial_capacity);
        self.terms.insert(term.to_string(), PostingHandle::clone(&handle));
        self.terms_size += term.len();

        if let Some(code) = encoder.and_then(|e| e.encode(term)) {
            self.phonetic.entry(code).or_default().insert(term.to_string());
        }
        (handle, true)
    }

    /// Terms whose phonetic key is `code`, in order.
    pub fn phonetic_matches(&self, code: &str) -> Vec<(String, PostingHandle)> {
        let Some(terms) = self.phonetic.get(code) else {
            return Vec::new();
        };
        terms
            .iter()
            .filter_map(|t| self.terms.get(t).map(|h| (t.clone(), PostingHandle::clone(h))))
            .collect()
    }

    /// Every posting list, in term order.
    pub fn posting_lists(&self) -> impl Iterator<Item = &PostingHandle> {
        self.terms.values()
    }

    /// Bytes of term text held.
    pub fn terms_size(&self) -> usize {
        self.terms_size
    }
}

impl TermLookup for TermDictionary {
    fn lookup(&self, term: &str) -> Option<PostingHandle> {
        self.terms.get(term).cloned()
    }

    fn expand_prefix(&self, prefix: &str, limit: Option<usize>) -> PrefixExpansion {
        let mut expansion = PrefixExpansion::default();
        let matching = self
            .terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix));

        for (term, handle) in matching {
            if limit.is_some_and(|limit| expansion.terms.len() >= limit) {
                expansion.truncated = true;
                break;
            }
            expansion.terms.push((term.clone(), PostingHandle::clone(handle)));
        }
        expansion
    }

    fn num_terms(&self) -> usize {
        self.terms.len()
    }
}
