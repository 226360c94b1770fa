//! Character attributes and their dependency graph.
//!
//! Templates are authored once and compiled into an [`AttributeSchema`]; each
//! character instantiates the schema as an [`AttributeGraph`]. Edges run from
//! child to parent: a parent's modifier is the sum of its child formulas, and
//! changes propagate strictly upward.
mod formula;
mod graph;
mod schema;
mod template;

pub use formula::Formula;
pub use graph::{
    Attribute, AttributeChange, AttributeGraph, AttributeNode, AttributeReading,
    AttributeSnapshot, RESOURCE_EPSILON, ResourceAttribute,
};
pub use schema::{AttributeSchema, ChildLink, SchemaError, SchemaNode};
pub use template::{AttributeTemplate, ChildEdge, ResourceSpec};
