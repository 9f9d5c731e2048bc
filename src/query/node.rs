//! Declarative query trees.
//!
//! ```
//! use quiver::query::QueryNode;
//!
//! let mut tags = QueryNode::tag("tags", Vec::new());
//! tags.add_child(QueryNode::prefix_any("tag1-")).unwrap();
//!
//! let query = QueryNode::intersect(vec![QueryNode::token("title", "index"), tags]);
//! assert_eq!(query.to_string(), "INTERSECT(@title:index, @tags:{tag1-*})");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuiverError, Result};
use crate::index::geo::{DistanceUnit, GeoPoint};
use crate::index::numeric::NumericRange;
use crate::schema::field::FieldId;

/// A reference to a field, by name or by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRef {
    Name(String),
    Id(FieldId),
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldRef::Name(name)
    }
}

impl From<FieldId> for FieldRef {
    fn from(id: FieldId) -> Self {
        FieldRef::Id(id)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name(name) => f.write_str(name),
            FieldRef::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// A query tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    /// A single term; `field: None` searches every indexed text field.
    Token { field: Option<FieldRef>, term: String },
    /// Every term starting with `prefix`.
    Prefix { field: Option<FieldRef>, prefix: String },
    /// Literal tag values; children are `Token` or `Prefix` nodes.
    Tag { field: FieldRef, children: Vec<QueryNode> },
    Numeric { field: FieldRef, range: NumericRange },
    /// Points within `radius` of `center`.
    Geo {
        field: FieldRef,
        center: GeoPoint,
        radius: f64,
        unit: DistanceUnit,
    },
    Intersect(Vec<QueryNode>),
    Union(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    pub fn token<F: Into<FieldRef>, S: Into<String>>(field: F, term: S) -> Self {
        QueryNode::Token {
            field: Some(field.into()),
            term: term.into(),
        }
    }

    /// A term matched in any indexed text field.
    pub fn token_any<S: Into<String>>(term: S) -> Self {
        QueryNode::Token {
            field: None,
            term: term.into(),
        }
    }

    pub fn prefix<F: Into<FieldRef>, S: Into<String>>(field: F, prefix: S) -> Self {
        QueryNode::Prefix {
            field: Some(field.into()),
            prefix: prefix.into(),
        }
    }

    /// A prefix matched in any indexed text field, or a tag value prefix
    /// when used under a tag node.
    pub fn prefix_any<S: Into<String>>(prefix: S) -> Self {
        QueryNode::Prefix {
            field: None,
            prefix: prefix.into(),
        }
    }

    /// A tag node. Fails later, at compile time, if a child is neither a
    /// token nor a prefix.
    pub fn tag<F: Into<FieldRef>>(field: F, children: Vec<QueryNode>) -> Self {
        QueryNode::Tag {
            field: field.into(),
            children,
        }
    }

    /// `min..max` with independent inclusiveness at each end.
    pub fn numeric<F: Into<FieldRef>>(
        field: F,
        min: f64,
        max: f64,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Self {
        QueryNode::Numeric {
            field: field.into(),
            range: NumericRange::new(min, max, min_inclusive, max_inclusive),
        }
    }

    pub fn numeric_range<F: Into<FieldRef>>(field: F, range: NumericRange) -> Self {
        QueryNode::Numeric {
            field: field.into(),
            range,
        }
    }

    pub fn geo<F: Into<FieldRef>>(
        field: F,
        center: GeoPoint,
        radius: f64,
        unit: DistanceUnit,
    ) -> Self {
        QueryNode::Geo {
            field: field.into(),
            center,
            radius,
            unit,
        }
    }

    pub fn intersect(children: Vec<QueryNode>) -> Self {
        QueryNode::Intersect(children)
    }

    pub fn union(children: Vec<QueryNode>) -> Self {
        QueryNode::Union(children)
    }

    pub fn not(child: QueryNode) -> Self {
        QueryNode::Not(Box::new(child))
    }

    /// Attach a child to a tag, intersect or union node.
    ///
    /// Tag nodes only accept token and prefix children without a field of
    /// their own; they are read as literal tag values.
    pub fn add_child(&mut self, child: QueryNode) -> Result<()> {
        match self {
            QueryNode::Tag { children, .. } => {
                if !child.is_tag_value() {
                    return Err(QuiverError::query(format!(
                        "Tag nodes take field-less token or prefix children, not {child}"
                    )));
                }
                children.push(child);
            }
            QueryNode::Intersect(children) | QueryNode::Union(children) => children.push(child),
            other => {
                return Err(QuiverError::query(format!(
                    "{} nodes do not take children",
                    other.kind()
                )));
            }
        }
        Ok(())
    }

    /// Children of a compound node.
    pub fn children(&self) -> &[QueryNode] {
        match self {
            QueryNode::Tag { children, .. }
            | QueryNode::Intersect(children)
            | QueryNode::Union(children) => children,
            QueryNode::Not(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Upper-case node name.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryNode::Token { .. } => "TOKEN",
            QueryNode::Prefix { .. } => "PREFIX",
            QueryNode::Tag { .. } => "TAG",
            QueryNode::Numeric { .. } => "NUMERIC",
            QueryNode::Geo { .. } => "GEO",
            QueryNode::Intersect(_) => "INTERSECT",
            QueryNode::Union(_) => "UNION",
            QueryNode::Not(_) => "NOT",
        }
    }

    /// A token or prefix without a field of its own, read as a literal tag
    /// value.
    pub(crate) fn is_tag_value(&self) -> bool {
        matches!(
            self,
            QueryNode::Token { field: None, .. } | QueryNode::Prefix { field: None, .. }
        )
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[QueryNode]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{child}")?;
    }
    Ok(())
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Token { field: Some(field), term } => write!(f, "@{field}:{term}"),
            QueryNode::Token { field: None, term } => f.write_str(term),
            QueryNode::Prefix {
                field: Some(field),
                prefix,
            } => write!(f, "@{field}:{prefix}*"),
            QueryNode::Prefix { field: None, prefix } => write!(f, "{prefix}*"),
            QueryNode::Tag { field, children } => {
                write!(f, "@{field}:{{")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    match child {
                        QueryNode::Token { term, .. } => f.write_str(term)?,
                        QueryNode::Prefix { prefix, .. } => write!(f, "{prefix}*")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("}")
            }
            QueryNode::Numeric { field, range } => write!(f, "@{field}:{range}"),
            QueryNode::Geo {
                field,
                center,
                radius,
                unit,
            } => write!(f, "@{field}:[{} {} {radius} {unit}]", center.lon, center.lat),
            QueryNode::Intersect(children) => {
                f.write_str("INTERSECT(")?;
                write_children(f, children)?;
                f.write_str(")")
            }
            QueryNode::Union(children) => {
                f.write_str("UNION(")?;
                write_children(f, children)?;
                f.write_str(")")
            }
            QueryNode::Not(child) => write!(f, "NOT({child})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_child() {
        let mut tag = QueryNode::tag("tags", Vec::new());
        tag.add_child(QueryNode::token_any("red")).unwrap();
        tag.add_child(QueryNode::prefix_any("bl")).unwrap();
        assert!(tag.add_child(QueryNode::union(Vec::new())).is_err());
        // The tag node names the field; its values cannot name another.
        assert!(tag.add_child(QueryNode::token("other", "red")).is_err());
        assert_eq!(tag.children().len(), 2);

        let mut and = QueryNode::intersect(Vec::new());
        and.add_child(tag).unwrap();
        assert_eq!(and.children().len(), 1);

        let mut token = QueryNode::token("title", "x");
        assert!(token.add_child(QueryNode::token_any("y")).is_err());
    }

    #[test]
    fn test_display() {
        let query = QueryNode::union(vec![
            QueryNode::numeric("price", 10.0, 30.0, false, true),
            QueryNode::not(QueryNode::token(3u16, "x")),
            QueryNode::tag("t", vec![QueryNode::token_any("a"), QueryNode::prefix_any("b")]),
        ]);
        assert_eq!(query.to_string(), "UNION(@price:(10, 30], NOT(@#3:x), @t:{a | b*})");
    }

    #[test]
    fn test_json() {
        let query = QueryNode::intersect(vec![
            QueryNode::prefix("title", "in"),
            QueryNode::geo("loc", GeoPoint::new(1.0, 2.0).unwrap(), 5.0, DistanceUnit::Kilometers),
        ]);
        let json = serde_json::to_string(&query).unwrap();
        let parsed: QueryNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, query);
    }
}
