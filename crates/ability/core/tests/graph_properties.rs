use std::sync::Arc;

use ability_core::{
    AttributeGraph, AttributeId, AttributeSchema, AttributeTemplate, Formula, ResourceSpec,
};
use proptest::prelude::*;

const STRENGTH: AttributeId = AttributeId(1);
const AGILITY: AttributeId = AttributeId(2);
const ATTACK: AttributeId = AttributeId(3);
const DPS: AttributeId = AttributeId(4);
const HEALTH: AttributeId = AttributeId(5);

fn schema() -> Arc<AttributeSchema> {
    let templates = vec![
        AttributeTemplate::new(STRENGTH, "strength", 10),
        AttributeTemplate::new(AGILITY, "agility", 5),
        AttributeTemplate::new(ATTACK, "attack", 0)
            .child(STRENGTH, Formula::Linear { per_point: 2 })
            .child(AGILITY, Formula::Step { every: 3, bonus: 4 }),
        AttributeTemplate::new(DPS, "dps", 0)
            .child(ATTACK, Formula::Percent { percent: 150 })
            .child(AGILITY, Formula::Linear { per_point: 1 }),
        AttributeTemplate::new(HEALTH, "health", 50)
            .child(STRENGTH, Formula::Linear { per_point: 5 })
            .resource(ResourceSpec::regenerating(2.5)),
    ];
    Arc::new(AttributeSchema::build(templates).expect("acyclic"))
}

#[derive(Clone, Debug)]
enum Mutation {
    AddBase(usize, i32),
    AddModifier(usize, i32),
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (0..5usize, -50..50i32).prop_map(|(slot, amount)| Mutation::AddBase(slot, amount)),
        (0..5usize, -50..50i32).prop_map(|(slot, amount)| Mutation::AddModifier(slot, amount)),
    ]
}

const IDS: [AttributeId; 5] = [STRENGTH, AGILITY, ATTACK, DPS, HEALTH];

fn apply(graph: &mut AttributeGraph, mutation: &Mutation) {
    match *mutation {
        Mutation::AddBase(slot, amount) => graph.add_base(IDS[slot], amount),
        Mutation::AddModifier(slot, amount) => graph.add_modifier(IDS[slot], amount),
    };
}

fn finals(graph: &AttributeGraph) -> Vec<Option<i32>> {
    IDS.iter().map(|&id| graph.final_value(id)).collect()
}

#[derive(Clone, Debug)]
enum ResourceOp {
    Consume(f32),
    Gain(f32),
    Set(f32),
    Regenerate(u32),
    StrengthBase(i32),
}

fn resource_op() -> impl Strategy<Value = ResourceOp> {
    prop_oneof![
        (0.0f32..500.0).prop_map(ResourceOp::Consume),
        (0.0f32..500.0).prop_map(ResourceOp::Gain),
        (-100.0f32..500.0).prop_map(ResourceOp::Set),
        (0u32..5000).prop_map(ResourceOp::Regenerate),
        (-40..40i32).prop_map(ResourceOp::StrengthBase),
    ]
}

proptest! {
    #[test]
    fn mutation_order_does_not_change_finals(
        mutations in prop::collection::vec(mutation(), 1..24),
    ) {
        let schema = schema();
        let mut forward = AttributeGraph::new(Arc::clone(&schema));
        let mut backward = AttributeGraph::new(Arc::clone(&schema));

        for mutation in &mutations {
            apply(&mut forward, mutation);
        }
        for mutation in mutations.iter().rev() {
            apply(&mut backward, mutation);
        }

        let mut rebuilt = AttributeGraph::new(Arc::clone(&schema));
        for &id in &IDS {
            let base = forward.attribute(id).map(|attribute| attribute.base()).unwrap_or_default();
            let modifier = forward
                .attribute(id)
                .map(|attribute| attribute.external_modifier())
                .unwrap_or_default();
            rebuilt.set_base(id, base);
            rebuilt.set_modifier(id, modifier);
        }

        prop_assert_eq!(finals(&forward), finals(&backward));
        prop_assert_eq!(finals(&forward), finals(&rebuilt));
    }

    #[test]
    fn resource_current_stays_in_bounds(ops in prop::collection::vec(resource_op(), 1..40)) {
        let mut graph = AttributeGraph::new(schema());
        for op in ops {
            match op {
                ResourceOp::Consume(amount) => { graph.consume(HEALTH, amount); }
                ResourceOp::Gain(amount) => { graph.gain(HEALTH, amount); }
                ResourceOp::Set(value) => { graph.set_current(HEALTH, value, true); }
                ResourceOp::Regenerate(delta) => graph.regenerate(delta),
                ResourceOp::StrengthBase(amount) => { graph.add_base(STRENGTH, amount); }
            }
            let current = graph.current(HEALTH).unwrap();
            let ceiling = graph.final_value(HEALTH).unwrap().max(0) as f32;
            prop_assert!(current >= 0.0, "current {} below zero", current);
            prop_assert!(current <= ceiling, "current {} above final {}", current, ceiling);
        }
    }
}
