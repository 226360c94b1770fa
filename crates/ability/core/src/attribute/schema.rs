//! Immutable, index-resolved attribute schema.
//!
//! Templates reference each other by id. Building the schema resolves every
//! edge into index adjacency once, derives parents from children, rejects
//! dependency cycles, and ranks nodes so a recompute wave can visit each node
//! at most once.

use std::collections::{BTreeMap, VecDeque};

use super::formula::Formula;
use super::template::AttributeTemplate;
use crate::error::{ErrorSeverity, SimError};
use crate::ids::AttributeId;

/// Errors raised while building an [`AttributeSchema`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("attribute {0} is defined more than once")]
    DuplicateAttribute(AttributeId),

    #[error("attribute dependency cycle through {members:?}")]
    Cycle { members: Vec<AttributeId> },
}

impl SimError for SchemaError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAttribute(_) => "SCHEMA_DUPLICATE_ATTRIBUTE",
            Self::Cycle { .. } => "SCHEMA_CYCLE",
        }
    }
}

/// Child edge resolved against the schema. `index` is `None` for ids the schema never defined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildLink {
    pub child: AttributeId,
    pub index: Option<usize>,
    pub formula: Formula,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub template: AttributeTemplate,
    pub children: Vec<ChildLink>,
    pub parents: Vec<usize>,
    /// Longest child chain below this node; children always rank strictly lower.
    pub rank: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSchema {
    nodes: Vec<SchemaNode>,
    index: BTreeMap<AttributeId, usize>,
    /// Node indices in evaluation order (children before parents).
    order: Vec<usize>,
}

impl AttributeSchema {
    pub fn build(templates: impl IntoIterator<Item = AttributeTemplate>) -> Result<Self, SchemaError> {
        let templates: Vec<AttributeTemplate> = templates.into_iter().collect();

        let mut index = BTreeMap::new();
        for (slot, template) in templates.iter().enumerate() {
            if index.insert(template.id, slot).is_some() {
                return Err(SchemaError::DuplicateAttribute(template.id));
            }
        }

        let mut nodes: Vec<SchemaNode> = templates
            .into_iter()
            .map(|template| {
                let children = template
                    .children
                    .iter()
                    .map(|edge| {
                        let resolved = index.get(&edge.child).copied();
                        if resolved.is_none() {
                            tracing::warn!(
                                attribute = %template.id,
                                child = %edge.child,
                                "child attribute is not defined; edge contributes nothing"
                            );
                        }
                        ChildLink {
                            child: edge.child,
                            index: resolved,
                            formula: edge.formula.clone(),
                        }
                    })
                    .collect();
                SchemaNode {
                    template,
                    children,
                    parents: Vec::new(),
                    rank: 0,
                }
            })
            .collect();

        for parent in 0..nodes.len() {
            let child_indices: Vec<usize> =
                nodes[parent].children.iter().filter_map(|link| link.index).collect();
            for child in child_indices {
                if !nodes[child].parents.contains(&parent) {
                    nodes[child].parents.push(parent);
                }
            }
        }

        let order = rank_nodes(&mut nodes)?;
        Ok(Self {
            nodes,
            index,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: AttributeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, index: usize) -> &SchemaNode {
        &self.nodes[index]
    }

    pub fn template(&self, id: AttributeId) -> Option<&AttributeTemplate> {
        self.index_of(id).map(|i| &self.nodes[i].template)
    }

    pub fn contains(&self, id: AttributeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Node indices with every child before its parents.
    pub fn evaluation_order(&self) -> &[usize] {
        &self.order
    }
}

/// Kahn's algorithm over child -> parent edges. Assigns ranks and returns the order.
fn rank_nodes(nodes: &mut [SchemaNode]) -> Result<Vec<usize>, SchemaError> {
    let mut pending: Vec<usize> = nodes
        .iter()
        .map(|node| node.children.iter().filter(|link| link.index.is_some()).count())
        .collect();

    let mut ready: VecDeque<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(current) = ready.pop_front() {
        order.push(current);
        let rank = nodes[current].rank;
        let parents = nodes[current].parents.clone();
        for parent in parents {
            nodes[parent].rank = nodes[parent].rank.max(rank + 1);
            let edges = nodes[parent]
                .children
                .iter()
                .filter(|link| link.index == Some(current))
                .count();
            pending[parent] -= edges;
            if pending[parent] == 0 {
                ready.push_back(parent);
            }
        }
    }

    if order.len() != nodes.len() {
        let members = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(i, _)| nodes[i].template.id)
            .collect();
        return Err(SchemaError::Cycle { members });
    }

    Ok(order)
}
