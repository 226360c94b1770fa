//! Per-character attribute instances and push-based recalculation.
//!
//! A mutation recomputes the touched node, then walks parents in rank order.
//! Parents are only revisited when a final value actually changed (or when a
//! recompute is forced), and the rank ordering guarantees every node in a wave
//! is evaluated once with all of its children already settled.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::formula::saturate;
use super::schema::AttributeSchema;
use crate::ids::AttributeId;

/// Resource values at or below this threshold snap to zero when consumed.
pub const RESOURCE_EPSILON: f32 = 0.001;

/// Scalar stat: base value plus modifier, with optional clamping.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    id: AttributeId,
    base: i32,
    external_modifier: i32,
    modifier: i32,
    final_value: i32,
    min: i32,
    max: i32,
    clamp: bool,
    dependencies: Vec<AttributeId>,
}

impl Attribute {
    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn base(&self) -> i32 {
        self.base
    }

    /// Modifier set from outside the graph (buffs, equipment).
    pub fn external_modifier(&self) -> i32 {
        self.external_modifier
    }

    /// Total modifier: external part plus every child formula contribution.
    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    pub fn final_value(&self) -> i32 {
        self.final_value
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_clamped(&self) -> bool {
        self.clamp
    }

    pub fn dependencies(&self) -> &[AttributeId] {
        &self.dependencies
    }

    fn settle(&mut self, contribution: i64) {
        self.modifier = saturate(i64::from(self.external_modifier) + contribution);
        let raw = saturate(i64::from(self.base) + i64::from(self.modifier));
        self.final_value = if self.clamp {
            raw.clamp(self.min, self.max.max(self.min))
        } else {
            raw
        };
    }
}

/// Attribute with a depletable current value kept within `[0, final]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceAttribute {
    attribute: Attribute,
    current: f32,
    regen_per_second: f32,
}

impl ResourceAttribute {
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn regen_per_second(&self) -> f32 {
        self.regen_per_second
    }

    fn ceiling(&self) -> f32 {
        self.attribute.final_value.max(0) as f32
    }

    fn clamp_current(&self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.ceiling())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeNode {
    Plain(Attribute),
    Resource(ResourceAttribute),
}

impl AttributeNode {
    pub fn attribute(&self) -> &Attribute {
        match self {
            AttributeNode::Plain(attribute) => attribute,
            AttributeNode::Resource(resource) => &resource.attribute,
        }
    }

    fn attribute_mut(&mut self) -> &mut Attribute {
        match self {
            AttributeNode::Plain(attribute) => attribute,
            AttributeNode::Resource(resource) => &mut resource.attribute,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceAttribute> {
        match self {
            AttributeNode::Resource(resource) => Some(resource),
            AttributeNode::Plain(_) => None,
        }
    }

    fn as_resource_mut(&mut self) -> Option<&mut ResourceAttribute> {
        match self {
            AttributeNode::Resource(resource) => Some(resource),
            AttributeNode::Plain(_) => None,
        }
    }
}

/// Observable change recorded by the graph and drained by its owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeChange {
    Final {
        attribute: AttributeId,
        old: i32,
        new: i32,
    },
    Current {
        attribute: AttributeId,
        old: f32,
        new: f32,
    },
}

impl AttributeChange {
    pub fn attribute(&self) -> AttributeId {
        match self {
            AttributeChange::Final { attribute, .. } | AttributeChange::Current { attribute, .. } => {
                *attribute
            }
        }
    }
}

/// Read-only copy of a character's attributes for cross-character reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSnapshot {
    readings: BTreeMap<AttributeId, AttributeReading>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeReading {
    pub final_value: i32,
    pub min: i32,
    pub max: i32,
    pub current: Option<f32>,
}

impl AttributeSnapshot {
    pub fn get(&self, id: AttributeId) -> Option<&AttributeReading> {
        self.readings.get(&id)
    }

    pub fn final_value(&self, id: AttributeId) -> Option<i32> {
        self.get(id).map(|reading| reading.final_value)
    }

    pub fn current(&self, id: AttributeId) -> Option<f32> {
        self.get(id).and_then(|reading| reading.current)
    }
}

/// All attributes of a single character.
#[derive(Clone, Debug)]
pub struct AttributeGraph {
    schema: Arc<AttributeSchema>,
    slots: Vec<Option<AttributeNode>>,
    changes: Vec<AttributeChange>,
}

impl AttributeGraph {
    /// Instantiates every attribute in the schema.
    pub fn new(schema: Arc<AttributeSchema>) -> Self {
        let all = 0..schema.len();
        Self::instantiate(schema, all.collect())
    }

    /// Instantiates only `ids`; edges to absent attributes contribute zero.
    pub fn with_subset(
        schema: Arc<AttributeSchema>,
        ids: impl IntoIterator<Item = AttributeId>,
    ) -> Self {
        let present: BTreeSet<usize> = ids
            .into_iter()
            .filter_map(|id| {
                let index = schema.index_of(id);
                if index.is_none() {
                    tracing::warn!(attribute = %id, "attribute is not part of the schema");
                }
                index
            })
            .collect();
        Self::instantiate(schema, present.into_iter().collect())
    }

    fn instantiate(schema: Arc<AttributeSchema>, present: Vec<usize>) -> Self {
        let mut slots: Vec<Option<AttributeNode>> = vec![None; schema.len()];
        for index in present {
            let template = &schema.node(index).template;
            let attribute = Attribute {
                id: template.id,
                base: template.initial_value,
                external_modifier: 0,
                modifier: 0,
                final_value: template.initial_value,
                min: template.min,
                max: template.max,
                clamp: template.clamp,
                dependencies: template.dependencies.clone(),
            };
            slots[index] = Some(match template.resource {
                Some(spec) => AttributeNode::Resource(ResourceAttribute {
                    attribute,
                    current: 0.0,
                    regen_per_second: spec.regen_per_second,
                }),
                None => AttributeNode::Plain(attribute),
            });
        }

        let mut graph = Self {
            schema,
            slots,
            changes: Vec::new(),
        };

        let schema = Arc::clone(&graph.schema);
        for &index in schema.evaluation_order() {
            if graph.slots[index].is_some() {
                graph.recompute_node(index);
            }
        }
        for &index in schema.evaluation_order() {
            let starts_full = schema
                .node(index)
                .template
                .resource
                .is_some_and(|spec| spec.starts_full);
            if let Some(resource) = graph.slots[index].as_mut().and_then(AttributeNode::as_resource_mut)
            {
                resource.current = if starts_full { resource.ceiling() } else { 0.0 };
            }
        }
        graph.changes.clear();
        graph
    }

    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    pub fn contains(&self, id: AttributeId) -> bool {
        self.slot_index(id).is_some()
    }

    pub fn get(&self, id: AttributeId) -> Option<&AttributeNode> {
        self.slot_index(id).and_then(|index| self.slots[index].as_ref())
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.get(id).map(AttributeNode::attribute)
    }

    pub fn resource(&self, id: AttributeId) -> Option<&ResourceAttribute> {
        self.get(id).and_then(AttributeNode::as_resource)
    }

    pub fn final_value(&self, id: AttributeId) -> Option<i32> {
        self.attribute(id).map(Attribute::final_value)
    }

    pub fn current(&self, id: AttributeId) -> Option<f32> {
        self.resource(id).map(ResourceAttribute::current)
    }

    /// Current value for resources, final value otherwise.
    pub fn level(&self, id: AttributeId) -> Option<f32> {
        self.get(id).map(|node| match node {
            AttributeNode::Resource(resource) => resource.current,
            AttributeNode::Plain(attribute) => attribute.final_value as f32,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeNode> {
        self.slots.iter().flatten()
    }

    /// `(id, current)` for every resource, in id order.
    pub fn resource_levels(&self) -> Vec<(AttributeId, f32)> {
        let mut levels: Vec<(AttributeId, f32)> = self
            .iter()
            .filter_map(|node| node.as_resource())
            .map(|resource| (resource.attribute.id, resource.current))
            .collect();
        levels.sort_by_key(|(id, _)| *id);
        levels
    }

    pub fn snapshot(&self) -> AttributeSnapshot {
        let readings = self
            .iter()
            .map(|node| {
                let attribute = node.attribute();
                (
                    attribute.id,
                    AttributeReading {
                        final_value: attribute.final_value,
                        min: attribute.min,
                        max: attribute.max,
                        current: node.as_resource().map(ResourceAttribute::current),
                    },
                )
            })
            .collect();
        AttributeSnapshot { readings }
    }

    /// Takes every change recorded since the last drain.
    pub fn drain_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.changes)
    }

    // ===== mutations =====

    pub fn set_base(&mut self, id: AttributeId, value: i32) -> bool {
        self.mutate(id, |attribute| attribute.base = value)
    }

    pub fn add_base(&mut self, id: AttributeId, amount: i32) -> bool {
        self.mutate(id, |attribute| attribute.base = attribute.base.saturating_add(amount))
    }

    pub fn set_modifier(&mut self, id: AttributeId, value: i32) -> bool {
        self.mutate(id, |attribute| attribute.external_modifier = value)
    }

    pub fn add_modifier(&mut self, id: AttributeId, amount: i32) -> bool {
        self.mutate(id, |attribute| {
            attribute.external_modifier = attribute.external_modifier.saturating_add(amount)
        })
    }

    /// Recomputes `id` and every ancestor even if nothing changed.
    pub fn force_recompute(&mut self, id: AttributeId) -> bool {
        match self.slot_index(id) {
            Some(index) => {
                self.propagate(index, true);
                true
            }
            None => false,
        }
    }

    /// Adds a named, non-propagating dependency to `id`.
    pub fn add_dependent(&mut self, id: AttributeId, dependency: AttributeId) -> bool {
        let mut added = false;
        self.mutate(id, |attribute| {
            if !attribute.dependencies.contains(&dependency) {
                attribute.dependencies.push(dependency);
                added = true;
            }
        });
        added
    }

    pub fn remove_dependent(&mut self, id: AttributeId, dependency: AttributeId) -> bool {
        let mut removed = false;
        self.mutate(id, |attribute| {
            let before = attribute.dependencies.len();
            attribute.dependencies.retain(|existing| *existing != dependency);
            removed = attribute.dependencies.len() != before;
        });
        removed
    }

    /// Subtracts from a resource; results at or below [`RESOURCE_EPSILON`] become zero.
    pub fn consume(&mut self, id: AttributeId, amount: f32) -> bool {
        self.update_current(id, true, |resource| {
            let next = resource.current - amount;
            if next <= RESOURCE_EPSILON { 0.0 } else { next }
        })
    }

    /// Adds to a resource, clamped to its final value.
    pub fn gain(&mut self, id: AttributeId, amount: f32) -> bool {
        self.update_current(id, true, |resource| resource.current + amount)
    }

    /// Overwrites a resource's current value; `notify = false` records no change.
    pub fn set_current(&mut self, id: AttributeId, value: f32, notify: bool) -> bool {
        self.update_current(id, notify, |_| value)
    }

    /// Applies per-second regeneration for `delta_ms` to every resource.
    pub fn regenerate(&mut self, delta_ms: u32) {
        let seconds = delta_ms as f32 / 1000.0;
        for index in 0..self.slots.len() {
            let Some(resource) = self.slots[index].as_mut().and_then(AttributeNode::as_resource_mut)
            else {
                continue;
            };
            if resource.regen_per_second == 0.0 {
                continue;
            }
            let old = resource.current;
            let new = resource.clamp_current(old + resource.regen_per_second * seconds);
            if new != old {
                resource.current = new;
                self.changes.push(AttributeChange::Current {
                    attribute: resource.attribute.id,
                    old,
                    new,
                });
            }
        }
    }

    // ===== internals =====

    fn slot_index(&self, id: AttributeId) -> Option<usize> {
        self.schema
            .index_of(id)
            .filter(|&index| self.slots[index].is_some())
    }

    fn mutate(&mut self, id: AttributeId, apply: impl FnOnce(&mut Attribute)) -> bool {
        let Some(index) = self.slot_index(id) else {
            return false;
        };
        if let Some(node) = self.slots[index].as_mut() {
            apply(node.attribute_mut());
        }
        self.propagate(index, false);
        true
    }

    fn update_current(
        &mut self,
        id: AttributeId,
        notify: bool,
        next: impl FnOnce(&ResourceAttribute) -> f32,
    ) -> bool {
        let Some(index) = self.slot_index(id) else {
            return false;
        };
        let Some(resource) = self.slots[index].as_mut().and_then(AttributeNode::as_resource_mut) else {
            return false;
        };
        let old = resource.current;
        let new = resource.clamp_current(next(&*resource));
        resource.current = new;
        if notify && new != old {
            self.changes.push(AttributeChange::Current {
                attribute: id,
                old,
                new,
            });
        }
        true
    }

    /// Recompute wave starting at `start`, visiting nodes in rank order.
    fn propagate(&mut self, start: usize, force: bool) {
        let schema = Arc::clone(&self.schema);
        let mut wave: BTreeSet<(u32, usize)> = BTreeSet::new();
        wave.insert((schema.node(start).rank, start));

        while let Some((_, index)) = wave.pop_first() {
            let changed = self.recompute_node(index);
            if !(changed || force) {
                continue;
            }
            for &parent in &schema.node(index).parents {
                if self.slots[parent].is_some() {
                    wave.insert((schema.node(parent).rank, parent));
                }
            }
        }
    }

    /// Re-evaluates one node from its children. Returns true if the final value changed.
    fn recompute_node(&mut self, index: usize) -> bool {
        let schema = Arc::clone(&self.schema);
        let node = schema.node(index);
        let Some(dependencies) = self.slots[index]
            .as_ref()
            .map(|slot| slot.attribute().dependencies.clone())
        else {
            return false;
        };

        let mut contribution: i64 = 0;
        for link in &node.children {
            let child = link.index.and_then(|child| self.slots[child].as_ref());
            let Some(child) = child else {
                tracing::warn!(
                    attribute = %node.template.id,
                    child = %link.child,
                    "child attribute missing; contributing 0"
                );
                continue;
            };
            let child_final = child.attribute().final_value;
            let lookup = |dependency: AttributeId| {
                if !dependencies.contains(&dependency) {
                    return None;
                }
                self.attribute(dependency).map(Attribute::max)
            };
            match link.formula.evaluate(child_final, lookup) {
                Some(value) => contribution += i64::from(value),
                None => tracing::warn!(
                    attribute = %node.template.id,
                    dependency = ?link.formula.dependency(),
                    "formula dependency missing; contributing 0"
                ),
            }
        }

        let Some(slot) = self.slots[index].as_mut() else {
            return false;
        };
        let old = slot.attribute().final_value;
        slot.attribute_mut().settle(contribution);
        let new = slot.attribute().final_value;

        if let Some(resource) = slot.as_resource_mut() {
            let before = resource.current;
            let clamped = resource.clamp_current(before);
            if clamped != before {
                resource.current = clamped;
                self.changes.push(AttributeChange::Current {
                    attribute: node.template.id,
                    old: before,
                    new: clamped,
                });
            }
        }

        if new != old {
            self.changes.push(AttributeChange::Final {
                attribute: node.template.id,
                old,
                new,
            });
        }
        new != old
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeTemplate, Formula, ResourceSpec};

    const STR: AttributeId = AttributeId(1);
    const ATK: AttributeId = AttributeId(2);
    const INT: AttributeId = AttributeId(3);
    const MANA: AttributeId = AttributeId(4);
    const CAP: AttributeId = AttributeId(5);
    const WARD: AttributeId = AttributeId(6);

    fn schema() -> Arc<AttributeSchema> {
        let templates = vec![
            AttributeTemplate::new(STR, "strength", 10),
            AttributeTemplate::new(ATK, "attack", 5).child(STR, Formula::Linear { per_point: 2 }),
            AttributeTemplate::new(INT, "intellect", 10),
            AttributeTemplate::new(MANA, "mana", 20)
                .resource(ResourceSpec::FULL)
                .child(INT, Formula::Linear { per_point: 3 }),
            AttributeTemplate::new(CAP, "ward cap", 0).clamped(0, 25),
            AttributeTemplate::new(WARD, "ward", 0)
                .child(
                    INT,
                    Formula::CappedByDependency {
                        dependency: CAP,
                        percent: 400,
                    },
                )
                .dependency(CAP),
        ];
        Arc::new(AttributeSchema::build(templates).unwrap())
    }

    #[test]
    fn initial_values_follow_formulas() {
        let mut graph = AttributeGraph::new(schema());
        assert_eq!(graph.final_value(ATK), Some(25));
        assert_eq!(graph.final_value(MANA), Some(50));
        assert_eq!(graph.current(MANA), Some(50.0));
        assert_eq!(graph.final_value(WARD), Some(25));
        assert!(graph.drain_changes().is_empty());
    }

    #[test]
    fn base_change_propagates_to_parents() {
        let mut graph = AttributeGraph::new(schema());
        graph.drain_changes();
        assert!(graph.set_base(STR, 20));
        assert_eq!(graph.final_value(ATK), Some(45));

        let changes = graph.drain_changes();
        assert_eq!(
            changes,
            vec![
                AttributeChange::Final {
                    attribute: STR,
                    old: 10,
                    new: 20
                },
                AttributeChange::Final {
                    attribute: ATK,
                    old: 25,
                    new: 45
                },
            ]
        );
    }

    #[test]
    fn external_modifier_survives_recompute() {
        let mut graph = AttributeGraph::new(schema());
        graph.set_modifier(ATK, 7);
        graph.set_base(STR, 11);
        let attack = graph.attribute(ATK).unwrap();
        assert_eq!(attack.external_modifier(), 7);
        assert_eq!(attack.modifier(), 29);
        assert_eq!(attack.final_value(), 34);
    }

    #[test]
    fn final_drop_clamps_current() {
        let mut graph = AttributeGraph::new(schema());
        graph.set_base(INT, 0);
        assert_eq!(graph.final_value(MANA), Some(20));
        assert_eq!(graph.current(MANA), Some(20.0));

        graph.set_base(INT, 10);
        assert_eq!(graph.final_value(MANA), Some(50));
        assert_eq!(graph.current(MANA), Some(20.0));
    }

    #[test]
    fn consume_snaps_tiny_remainders() {
        let mut graph = AttributeGraph::new(schema());
        graph.consume(MANA, 49.9995);
        assert_eq!(graph.current(MANA), Some(0.0));
        graph.gain(MANA, 500.0);
        assert_eq!(graph.current(MANA), Some(50.0));
        assert!(!graph.consume(STR, 1.0));
    }

    #[test]
    fn set_current_without_notify_records_nothing() {
        let mut graph = AttributeGraph::new(schema());
        graph.drain_changes();
        graph.set_current(MANA, 12.0, false);
        assert!(graph.drain_changes().is_empty());
        graph.set_current(MANA, 80.0, true);
        assert_eq!(graph.current(MANA), Some(50.0));
        assert_eq!(graph.drain_changes().len(), 1);
    }

    #[test]
    fn removing_dependency_zeroes_capped_formula() {
        let mut graph = AttributeGraph::new(schema());
        assert!(graph.remove_dependent(WARD, CAP));
        assert_eq!(graph.final_value(WARD), Some(0));
        assert!(graph.add_dependent(WARD, CAP));
        assert_eq!(graph.final_value(WARD), Some(25));
        assert!(!graph.add_dependent(WARD, CAP));
    }

    #[test]
    fn subset_graph_treats_missing_children_as_zero() {
        let graph = AttributeGraph::with_subset(schema(), [ATK, MANA]);
        assert_eq!(graph.final_value(ATK), Some(5));
        assert_eq!(graph.final_value(MANA), Some(20));
        assert!(!graph.contains(STR));
    }

    #[test]
    fn regeneration_stops_at_final() {
        let templates = vec![
            AttributeTemplate::new(MANA, "mana", 10).resource(ResourceSpec {
                regen_per_second: 4.0,
                starts_full: false,
            }),
        ];
        let mut graph = AttributeGraph::new(Arc::new(AttributeSchema::build(templates).unwrap()));
        assert_eq!(graph.current(MANA), Some(0.0));
        graph.regenerate(500);
        assert_eq!(graph.current(MANA), Some(2.0));
        graph.regenerate(10_000);
        assert_eq!(graph.current(MANA), Some(10.0));
    }

    #[test]
    fn clamped_attribute_respects_bounds() {
        let mut graph = AttributeGraph::new(schema());
        graph.set_base(CAP, 90);
        assert_eq!(graph.final_value(CAP), Some(25));
        graph.set_base(CAP, -5);
        assert_eq!(graph.final_value(CAP), Some(0));
    }
}
