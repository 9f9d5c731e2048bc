//! Lowering query trees into iterator trees.
//!
//! Every node compiles to one of three outcomes:
//!
//! - `Ok(Some(iter))`: an executable iterator,
//! - `Ok(None)`: nothing can match (an unindexed term, an empty prefix
//!   expansion, an intersection with such a child),
//! - `Err(_)`: the query is wrong (unknown field, wrong field type, short
//!   prefix, malformed tag node).
//!
//! Field references are resolved only through the schema snapshot the
//! compiler was given.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::analysis::{PhoneticEncoder, Tokenizer};
use crate::config::IndexConfig;
use crate::error::{QuiverError, Result};
use crate::index::dictionary::{TermDictionary, TermLookup};
use crate::index::doc_table::{DocId, DocTable};
use crate::index::geo::{DistanceUnit, GeoPoint};
use crate::index::inverted::PostingHandle;
use crate::index::numeric::NumericRange;
use crate::index::store::FieldStores;
use crate::query::intersect::IntersectIterator;
use crate::query::iterator::{DocIterator, EmptyIterator, IdListIterator};
use crate::query::lazy::{LazyFilterIterator, LazyPredicate, TagPattern, ValueProvider};
use crate::query::node::{FieldRef, QueryNode};
use crate::query::not::NotIterator;
use crate::query::term::TermIterator;
use crate::query::union::UnionIterator;
use crate::schema::cache::IndexSpecCache;
use crate::schema::field::{FieldSpec, FieldType};
use crate::schema::spec::IndexSpec;

/// Result of compiling one node.
pub type Compiled = Option<Box<dyn DocIterator>>;

/// Everything compilation reads, borrowed for the duration of one call.
pub struct QueryCompiler<'a> {
    pub(crate) schema: &'a IndexSpecCache,
    pub(crate) spec: &'a IndexSpec,
    pub(crate) stores: &'a FieldStores,
    pub(crate) docs: &'a Arc<RwLock<DocTable>>,
    pub(crate) max_doc_id: DocId,
    pub(crate) config: &'a IndexConfig,
    pub(crate) tokenizer: &'a Arc<dyn Tokenizer>,
    pub(crate) phonetic: &'a dyn PhoneticEncoder,
    pub(crate) provider: Option<&'a Arc<dyn ValueProvider>>,
}

impl QueryCompiler<'_> {
    /// Compile `node` and its subtree.
    pub fn compile(&self, node: &QueryNode) -> Result<Compiled> {
        match node {
            QueryNode::Token { field, term } => self.compile_token(field.as_ref(), term),
            QueryNode::Prefix { field, prefix } => self.compile_prefix(field.as_ref(), prefix),
            QueryNode::Tag { field, children } => self.compile_tag(field, children),
            QueryNode::Numeric { field, range } => self.compile_numeric(field, range),
            QueryNode::Geo {
                field,
                center,
                radius,
                unit,
            } => self.compile_geo(field, center, *radius, *unit),
            QueryNode::Intersect(children) => self.compile_intersect(children),
            QueryNode::Union(children) => self.compile_union(children),
            QueryNode::Not(child) => self.compile_not(child),
        }
    }

    fn resolve(&self, field: &FieldRef) -> Result<&FieldSpec> {
        let spec = match field {
            FieldRef::Name(name) => self.schema.field(name),
            FieldRef::Id(id) => self.schema.field_by_id(*id),
        };
        spec.ok_or_else(|| QuiverError::unknown_field(field.to_string()))
    }

    fn resolve_typed(&self, field: &FieldRef, expected: FieldType) -> Result<&FieldSpec> {
        let spec = self.resolve(field)?;
        if spec.field_type() != expected {
            return Err(QuiverError::schema(format!(
                "Field '{}' is {}, not {expected}",
                spec.name(),
                spec.field_type()
            )));
        }
        Ok(spec)
    }

    /// Text fields a token or prefix node searches.
    fn text_targets(&self, field: Option<&FieldRef>) -> Result<Vec<&FieldSpec>> {
        match field {
            Some(field) => Ok(vec![self.resolve_typed(field, FieldType::Text)?]),
            None => Ok(self.schema.searchable_text_fields().collect()),
        }
    }

    fn lazy(&self, field: &FieldSpec, predicate: LazyPredicate) -> Result<Compiled> {
        let provider = self.provider.ok_or_else(|| {
            QuiverError::query(format!(
                "Field '{}' is not indexed and no value provider is configured",
                field.name()
            ))
        })?;
        Ok(Some(Box::new(LazyFilterIterator::new(
            field.name().to_string(),
            predicate,
            Arc::clone(provider),
            Arc::clone(self.docs),
            self.max_doc_id,
        ))))
    }

    fn check_prefix(&self, prefix: &str) -> Result<()> {
        let len = prefix.chars().count();
        if len < self.config.min_prefix_len {
            return Err(QuiverError::query(format!(
                "Prefix '{prefix}' is shorter than {} characters",
                self.config.min_prefix_len
            )));
        }
        Ok(())
    }

    fn compile_token(&self, field: Option<&FieldRef>, term: &str) -> Result<Compiled> {
        let targets = self.text_targets(field)?;
        let term = self.tokenizer.normalize(term.trim());
        if term.is_empty() {
            return Ok(None);
        }
        if self.spec.is_stopword(&term) {
            log::debug!("'{term}' is a stopword");
            return Ok(None);
        }

        let mut terms = vec![term.clone()];
        terms.extend(self.spec.synonyms().synonyms(&term).into_iter().map(str::to_string));

        let mut leaves: Vec<Box<dyn DocIterator>> = Vec::new();
        for field in targets {
            if !field.is_indexed() {
                let predicate = LazyPredicate::Text {
                    terms: terms.clone(),
                    tokenizer: Arc::clone(self.tokenizer),
                };
                if let Some(iter) = self.lazy(field, predicate)? {
                    leaves.push(iter);
                }
                continue;
            }
            let Some(dict) = self.stores.text(field.id()) else {
                continue;
            };

            for t in &terms {
                if let Some(list) = dict.lookup(t) {
                    leaves.push(term_leaf(t, list, field));
                }
            }
            if self.phonetic_enabled(field) {
                leaves.extend(self.phonetic_leaves(dict, field, &term, &terms));
            }
        }
        Ok(union_of(leaves))
    }

    /// Whether `field` matches sound-alike terms.
    fn phonetic_enabled(&self, field: &FieldSpec) -> bool {
        match field.bit() {
            Some(bit) => self.spec.check_phonetic_enabled(bit),
            // Beyond the mask width only the field's own option can say.
            None => field.is_phonetic(),
        }
    }

    /// Leaves for terms sharing `term`'s phonetic key, minus those already
    /// matched literally.
    fn phonetic_leaves(
        &self,
        dict: &TermDictionary,
        field: &FieldSpec,
        term: &str,
        exclude: &[String],
    ) -> Vec<Box<dyn DocIterator>> {
        let Some(code) = self.phonetic.encode(term) else {
            return Vec::new();
        };
        dict.phonetic_matches(&code)
            .into_iter()
            .filter(|(t, _)| !exclude.contains(t))
            .map(|(t, list)| term_leaf(&t, list, field))
            .collect()
    }

    fn compile_prefix(&self, field: Option<&FieldRef>, prefix: &str) -> Result<Compiled> {
        let targets = self.text_targets(field)?;
        let prefix = self.tokenizer.normalize(prefix.trim());
        self.check_prefix(&prefix)?;

        let mut remaining = self.config.max_prefix_expansions;
        let mut leaves: Vec<Box<dyn DocIterator>> = Vec::new();
        for field in targets {
            if !field.is_indexed() {
                log::debug!("prefix '{prefix}' skips unindexed field '{}'", field.name());
                continue;
            }
            let Some(dict) = self.stores.text(field.id()) else {
                continue;
            };
            let expansion = dict.expand_prefix(&prefix, remaining);
            if let Some(left) = remaining.as_mut() {
                *left -= expansion.terms.len();
            }
            if expansion.truncated {
                log::warn!(
                    "prefix '{prefix}' on '{}' truncated after {} terms",
                    field.name(),
                    expansion.terms.len()
                );
            }
            for (term, list) in expansion.terms {
                leaves.push(term_leaf(&term, list, field));
            }
        }
        Ok(union_of(leaves))
    }

    fn compile_tag(&self, field: &FieldRef, children: &[QueryNode]) -> Result<Compiled> {
        let field = self.resolve_typed(field, FieldType::Tag)?;

        let mut patterns = Vec::with_capacity(children.len());
        for child in children {
            let pattern = match child {
                QueryNode::Token { field: None, term } => {
                    TagPattern::Exact(term.trim().to_lowercase())
                }
                QueryNode::Prefix { field: None, prefix } => {
                    let prefix = prefix.trim().to_lowercase();
                    self.check_prefix(&prefix)?;
                    TagPattern::Prefix(prefix)
                }
                other => {
                    return Err(QuiverError::query(format!(
                        "Tag node on '{}' has child {other}; only field-less token and prefix values are allowed",
                        field.name()
                    )));
                }
            };
            patterns.push(pattern);
        }

        if !field.is_indexed() {
            let predicate = LazyPredicate::Tag {
                patterns,
                separator: field.tag_separator(),
            };
            return self.lazy(field, predicate);
        }
        let Some(tags) = self.stores.tags(field.id()) else {
            return Ok(None);
        };

        let mut remaining = self.config.max_prefix_expansions;
        let mut leaves: Vec<Box<dyn DocIterator>> = Vec::new();
        for pattern in &patterns {
            match pattern {
                TagPattern::Exact(value) => {
                    if let Some(list) = tags.values().lookup(value) {
                        leaves.push(Box::new(TermIterator::new(value.as_str(), list, None)));
                    }
                }
                TagPattern::Prefix(prefix) => {
                    let expansion = tags.values().expand_prefix(prefix, remaining);
                    if let Some(left) = remaining.as_mut() {
                        *left -= expansion.terms.len();
                    }
                    if expansion.truncated {
                        log::warn!(
                            "tag prefix '{prefix}' on '{}' truncated after {} values",
                            field.name(),
                            expansion.terms.len()
                        );
                    }
                    for (value, list) in expansion.terms {
                        leaves.push(Box::new(TermIterator::new(value, list, None)));
                    }
                }
            }
        }
        Ok(union_of(leaves))
    }

    fn compile_numeric(&self, field: &FieldRef, range: &NumericRange) -> Result<Compiled> {
        let field = self.resolve_typed(field, FieldType::Numeric)?;
        range.validate()?;

        if !field.is_indexed() {
            return self.lazy(field, LazyPredicate::Numeric(*range));
        }
        let ids = self
            .stores
            .numeric(field.id())
            .map(|index| index.range(range))
            .unwrap_or_default();
        Ok(id_list(ids))
    }

    fn compile_geo(
        &self,
        field: &FieldRef,
        center: &GeoPoint,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<Compiled> {
        let field = self.resolve_typed(field, FieldType::Geo)?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(QuiverError::query(format!("Invalid radius {radius}")));
        }
        let radius_m = unit.to_meters(radius);

        if !field.is_indexed() {
            let predicate = LazyPredicate::Geo {
                center: *center,
                radius_m,
            };
            return self.lazy(field, predicate);
        }
        let ids = self
            .stores
            .geo(field.id())
            .map(|index| index.within(center, radius_m))
            .unwrap_or_default();
        Ok(id_list(ids))
    }

    fn compile_intersect(&self, children: &[QueryNode]) -> Result<Compiled> {
        // Compile every child first so a bad node anywhere is reported.
        let compiled = children
            .iter()
            .map(|child| self.compile(child))
            .collect::<Result<Vec<_>>>()?;

        let Some(mut iters) = compiled.into_iter().collect::<Option<Vec<_>>>() else {
            return Ok(None);
        };
        match iters.len() {
            0 => Ok(None),
            1 => Ok(iters.pop()),
            _ => Ok(Some(Box::new(IntersectIterator::new(iters)))),
        }
    }

    fn compile_union(&self, children: &[QueryNode]) -> Result<Compiled> {
        let mut iters = Vec::with_capacity(children.len());
        for child in children {
            if let Some(iter) = self.compile(child)? {
                iters.push(iter);
            }
        }
        Ok(union_of(iters))
    }

    fn compile_not(&self, child: &QueryNode) -> Result<Compiled> {
        let child = self.compile(child)?;
        if self.max_doc_id == 0 {
            return Ok(None);
        }
        let child: Box<dyn DocIterator> = match child {
            Some(child) => child,
            None => Box::new(EmptyIterator::new()),
        };
        Ok(Some(Box::new(NotIterator::new(child, self.max_doc_id))))
    }
}

fn term_leaf(term: &str, list: PostingHandle, field: &FieldSpec) -> Box<dyn DocIterator> {
    Box::new(TermIterator::new(term, list, Some(field.id())))
}

fn union_of(mut iters: Vec<Box<dyn DocIterator>>) -> Compiled {
    match iters.len() {
        0 => None,
        1 => iters.pop(),
        _ => Some(Box::new(UnionIterator::new(iters))),
    }
}

fn id_list(ids: Vec<DocId>) -> Compiled {
    if ids.is_empty() {
        return None;
    }
    Some(Box::new(IdListIterator::new(ids)))
}
