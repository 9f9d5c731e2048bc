//! Query module for Quiver.
//!
//! Query trees ([`QueryNode`]) are compiled against an index into trees of
//! pull iterators ([`DocIterator`]) that yield ascending document ids;
//! [`ResultsIterator`] is the handle callers drain.

pub mod compiler;
pub mod intersect;
pub mod iterator;
pub mod lazy;
pub mod node;
pub mod not;
pub mod results;
pub mod term;
pub mod union;

pub use compiler::{Compiled, QueryCompiler};
pub use intersect::IntersectIterator;
pub use iterator::{DocIterator, EmptyIterator, IdListIterator, IteratorKind, SkipOutcome};
pub use lazy::{LazyFilterIterator, LazyPredicate, TagPattern, ValueProvider};
pub use node::{FieldRef, QueryNode};
pub use not::NotIterator;
pub use results::ResultsIterator;
pub use term::TermIterator;
pub use union::UnionIterator;
