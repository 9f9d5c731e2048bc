//! Tag field storage: literal values, split on a separator, never tokenized.

use crate::error::Result;
use crate::index::dictionary::TermDictionary;
use crate::index::doc_table::DocId;
use crate::index::posting::{Posting, PostingLayout};

/// Split a raw tag string into its distinct, trimmed, lowercased values.
pub fn split_tags(raw: &str, separator: char) -> Vec<String> {
    let mut values: Vec<String> = raw
        .split(separator)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Values of one tag field and the documents carrying each.
#[derive(Debug)]
pub struct TagIndex {
    values: TermDictionary,
}

/// What indexing one document's tags changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagIndexing {
    pub records: usize,
    pub bytes: usize,
    pub capacity_growth: usize,
}

impl TagIndex {
    pub fn new(initial_capacity: usize) -> Self {
        TagIndex {
            values: TermDictionary::new(PostingLayout::doc_ids_only(), initial_capacity),
        }
    }

    /// Record `doc_id` under every value in `raw`.
    pub fn index(&mut self, doc_id: DocId, raw: &str, separator: char) -> Result<TagIndexing> {
        let mut stats = TagIndexing::default();
        for value in split_tags(raw, separator) {
            let (handle, _) = self.values.get_or_create(&value, None);
            let mut list = handle.write();
            let capacity = list.capacity();
            stats.bytes += list.add_posting(&Posting::new(doc_id))?;
            stats.capacity_growth += list.capacity() - capacity;
            stats.records += 1;
        }
        Ok(stats)
    }

    pub fn values(&self) -> &TermDictionary {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::dictionary::TermLookup;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("Red, blue ,red,, green", ','), vec!["blue", "green", "red"]);
        assert_eq!(split_tags("a;b", ';'), vec!["a", "b"]);
        assert!(split_tags(" , ", ',').is_empty());
    }

    #[test]
    fn test_values_are_literal() {
        let mut tags = TagIndex::new(6);
        tags.index(1, "hello world,foo-bar", ',').unwrap();
        tags.index(2, "foo-bar", ',').unwrap();

        assert!(tags.values().lookup("hello world").is_some());
        assert!(tags.values().lookup("hello").is_none());

        let list = tags.values().lookup("foo-bar").unwrap();
        let ids: Vec<DocId> = list.read().postings().unwrap().iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
