//! Query-time values for fields that are not indexed.
//!
//! A [`ValueProvider`] is consulted for each candidate document instead of
//! an index, which lets NOINDEX fields take part in queries.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::analysis::Tokenizer;
use crate::document::FieldValue;
use crate::error::Result;
use crate::index::doc_table::{DocId, DocTable};
use crate::index::geo::GeoPoint;
use crate::index::numeric::NumericRange;
use crate::index::tag::split_tags;
use crate::query::iterator::{DocIterator, IteratorKind};

/// Supplies a field's value for a document on demand.
///
/// Called with the field name and the document key. Implemented for any
/// matching closure.
pub trait ValueProvider: Send + Sync {
    fn value(&self, field: &str, key: &[u8]) -> Option<FieldValue>;
}

impl<F> ValueProvider for F
where
    F: Fn(&str, &[u8]) -> Option<FieldValue> + Send + Sync,
{
    fn value(&self, field: &str, key: &[u8]) -> Option<FieldValue> {
        self(field, key)
    }
}

/// One literal tag value to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPattern {
    Exact(String),
    Prefix(String),
}

impl TagPattern {
    fn matches(&self, value: &str) -> bool {
        match self {
            TagPattern::Exact(v) => value == v,
            TagPattern::Prefix(p) => value.starts_with(p.as_str()),
        }
    }
}

/// The test a provided value must pass.
#[derive(Debug, Clone)]
pub enum LazyPredicate {
    /// Any of the given terms appears among the value's tokens.
    Text {
        terms: Vec<String>,
        tokenizer: Arc<dyn Tokenizer>,
    },
    /// Any tag value matches any pattern.
    Tag {
        patterns: Vec<TagPattern>,
        separator: char,
    },
    Numeric(NumericRange),
    Geo {
        center: GeoPoint,
        radius_m: f64,
    },
}

impl LazyPredicate {
    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            LazyPredicate::Text { terms, tokenizer } => value.as_text().is_some_and(|text| {
                tokenizer
                    .tokenize(text)
                    .iter()
                    .any(|token| terms.iter().any(|t| *t == token.text))
            }),
            LazyPredicate::Tag {
                patterns,
                separator,
            } => value.as_text().is_some_and(|raw| {
                split_tags(raw, *separator)
                    .iter()
                    .any(|v| patterns.iter().any(|p| p.matches(v)))
            }),
            LazyPredicate::Numeric(range) => value.as_numeric().is_some_and(|v| range.contains(v)),
            LazyPredicate::Geo { center, radius_m } => match value.to_geo() {
                Ok(Some(point)) => point.distance_to(center) <= *radius_m,
                _ => false,
            },
        }
    }
}

/// Walks the live documents and keeps those whose provided value passes
/// the predicate.
pub struct LazyFilterIterator {
    field: String,
    predicate: LazyPredicate,
    provider: Arc<dyn ValueProvider>,
    docs: Arc<RwLock<DocTable>>,
    max_doc_id: DocId,
    current: DocId,
    exhausted: bool,
}

impl LazyFilterIterator {
    pub fn new(
        field: String,
        predicate: LazyPredicate,
        provider: Arc<dyn ValueProvider>,
        docs: Arc<RwLock<DocTable>>,
        max_doc_id: DocId,
    ) -> Self {
        LazyFilterIterator {
            field,
            predicate,
            provider,
            docs,
            max_doc_id,
            current: 0,
            exhausted: max_doc_id == 0,
        }
    }
}

impl fmt::Debug for LazyFilterIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFilterIterator")
            .field("field", &self.field)
            .field("predicate", &self.predicate)
            .field("max_doc_id", &self.max_doc_id)
            .field("current", &self.current)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl DocIterator for LazyFilterIterator {
    fn doc_id(&self) -> DocId {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let mut candidate = self.current;
        while candidate < self.max_doc_id {
            candidate += 1;
            // The provider runs without the table lock held.
            let key = self.docs.read().get(candidate).map(|meta| meta.key.clone());
            let Some(key) = key else {
                continue;
            };
            let matched = self
                .provider
                .value(&self.field, &key)
                .is_some_and(|value| self.predicate.matches(&value));
            if matched {
                self.current = candidate;
                return Ok(true);
            }
        }
        self.exhausted = true;
        Ok(false)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn cost(&self) -> u64 {
        self.max_doc_id
    }

    fn kind(&self) -> IteratorKind {
        IteratorKind::Lazy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SeparatorTokenizer;
    use crate::query::iterator::collect_ids;

    fn table(keys: &[&str]) -> Arc<RwLock<DocTable>> {
        let mut table = DocTable::new();
        for key in keys {
            table.insert(key.as_bytes().to_vec(), 1.0, Vec::new());
        }
        Arc::new(RwLock::new(table))
    }

    fn provider() -> Arc<dyn ValueProvider> {
        Arc::new(|field: &str, key: &[u8]| match (field, key) {
            ("color", b"a") => Some(FieldValue::from("red,blue")),
            ("color", b"b") => Some(FieldValue::from("green")),
            ("color", b"c") => Some(FieldValue::from("Blue-ish")),
            ("price", b"a") => Some(FieldValue::Numeric(5.0)),
            ("price", b"c") => Some(FieldValue::from("50")),
            ("body", b"b") => Some(FieldValue::from("Hello lazy world")),
            _ => None,
        })
    }

    #[test]
    fn test_tag_predicate() {
        let docs = table(&["a", "b", "c"]);
        let predicate = LazyPredicate::Tag {
            patterns: vec![TagPattern::Exact("green".into()), TagPattern::Prefix("blue".into())],
            separator: ',',
        };
        let mut iter = LazyFilterIterator::new("color".into(), predicate, provider(), docs, 3);
        assert_eq!(collect_ids(&mut iter).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_numeric_and_text_predicates() {
        let docs = table(&["a", "b", "c"]);
        let range = LazyPredicate::Numeric(NumericRange::inclusive(10.0, 100.0));
        let mut iter =
            LazyFilterIterator::new("price".into(), range, provider(), Arc::clone(&docs), 3);
        assert_eq!(collect_ids(&mut iter).unwrap(), vec![3]);

        let text = LazyPredicate::Text {
            terms: vec!["lazy".into()],
            tokenizer: Arc::new(SeparatorTokenizer::new()),
        };
        let mut iter = LazyFilterIterator::new("body".into(), text, provider(), docs, 3);
        assert_eq!(collect_ids(&mut iter).unwrap(), vec![2]);
    }

    #[test]
    fn test_skips_dropped_documents() {
        let docs = table(&["a", "b", "c"]);
        docs.write().remove_by_key(b"a");
        let predicate = LazyPredicate::Tag {
            patterns: vec![TagPattern::Prefix("".into())],
            separator: ',',
        };
        let mut iter = LazyFilterIterator::new("color".into(), predicate, provider(), docs, 3);
        assert_eq!(collect_ids(&mut iter).unwrap(), vec![2, 3]);
    }
}
