//! Transient effect objects produced by completed activations.
//!
//! Spawning is a pure function of the ability, the caster's pose, and the seed
//! handed out by the activation protocol, so peers that spawn with the same
//! seed get the same container id, member set, and jitter. After spawning,
//! objects live on their own clock; nothing here feeds back into activation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::{
    Ability, AbilityHooks, DestroyAction, PreSpawnAction, SpawnAction, SpawnTarget, TickAction,
};
use crate::activation::{EffectRng, TargetInfo};
use crate::config::SimConfig;
use crate::geometry::{Pose, Vec2};
use crate::ids::{AbilityId, AttributeId, CharacterId, ContainerId, MemberId};

/// Resource change the host routes to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitIntent {
    pub source: CharacterId,
    pub ability: AbilityId,
    pub target: CharacterId,
    pub attribute: AttributeId,
    pub delta: i32,
}

/// Area resource change the host resolves against nearby characters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaIntent {
    pub source: CharacterId,
    pub ability: AbilityId,
    pub center: Vec2,
    pub radius: i32,
    pub attribute: AttributeId,
    pub delta: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectOutput {
    pub hits: Vec<HitIntent>,
    pub areas: Vec<AreaIntent>,
    pub destroyed: Vec<(ContainerId, MemberId)>,
}

impl EffectOutput {
    pub fn extend(&mut self, other: EffectOutput) {
        self.hits.extend(other.hits);
        self.areas.extend(other.areas);
        self.destroyed.extend(other.destroyed);
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.areas.is_empty() && self.destroyed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpawnOutcome {
    /// A target was required but none resolved; nothing happened.
    NoTarget,
    /// Pet summon; the host creates the pet.
    Summoned,
    /// Caster-targeted ability applied immediately without an object.
    SelfApplied { hits: Vec<HitIntent> },
    Spawned {
        container: ContainerId,
        members: Vec<MemberId>,
    },
}

/// Where and for whom a spawn happens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnContext {
    pub caster: CharacterId,
    pub origin: Pose,
    pub spawn_point: Pose,
    pub target: Option<TargetInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectObject {
    pub member: MemberId,
    pub position: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub remaining_ms: i32,
    pub hit_count: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectContainer {
    pub ability: AbilityId,
    pub caster: CharacterId,
    hooks: Arc<AbilityHooks>,
    members: BTreeMap<MemberId, EffectObject>,
}

impl EffectContainer {
    pub fn members(&self) -> impl Iterator<Item = &EffectObject> {
        self.members.values()
    }

    pub fn member(&self, id: MemberId) -> Option<&EffectObject> {
        self.members.get(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Live effect objects of one character.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectWorld {
    containers: BTreeMap<ContainerId, EffectContainer>,
}

impl EffectWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self, id: ContainerId) -> Option<&EffectContainer> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &EffectContainer)> {
        self.containers.iter().map(|(&id, container)| (id, container))
    }

    pub fn live_for(&self, ability: AbilityId) -> usize {
        self.containers
            .values()
            .filter(|container| container.ability == ability)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Hits a caster-targeted ability applies to its own caster, or `None`
    /// when the ability spawns objects or summons.
    ///
    /// Depends only on the ability, so replayed ticks apply the same hits.
    pub fn caster_hits(ability: &Ability, caster: CharacterId) -> Option<Vec<HitIntent>> {
        if ability.kind().is_summon() || ability.template().spawn_target != SpawnTarget::Caster {
            return None;
        }
        let hits = ability
            .hooks()
            .hit
            .iter()
            .map(|action| {
                let (attribute, delta) = action.delta();
                HitIntent {
                    source: caster,
                    ability: ability.id(),
                    target: caster,
                    attribute,
                    delta,
                }
            })
            .collect();
        Some(hits)
    }

    pub fn spawn(&mut self, ability: &Ability, cx: SpawnContext, seed: u64) -> SpawnOutcome {
        let template = ability.template();
        if ability.needs_target() && cx.target.is_none() {
            tracing::debug!(ability = %ability.id(), "spawn skipped: no target");
            return SpawnOutcome::NoTarget;
        }
        if ability.kind().is_summon() {
            return SpawnOutcome::Summoned;
        }
        if let Some(hits) = Self::caster_hits(ability, cx.caster) {
            return SpawnOutcome::SelfApplied { hits };
        }

        let hooks = Arc::clone(ability.hooks());
        let mut rng = EffectRng::new(seed);
        let container = loop {
            let candidate = ContainerId(rng.next_u32());
            if !self.containers.contains_key(&candidate) {
                break candidate;
            }
        };

        let position = match template.spawn_target {
            SpawnTarget::Target => cx.target.map_or(cx.origin.position, |target| target.position),
            SpawnTarget::Spawner => cx.spawn_point.position,
            SpawnTarget::Forward | SpawnTarget::Caster => cx
                .origin
                .position
                .offset(Vec2::from_heading(cx.origin.heading), ability.range() as f32),
        };
        let primary = EffectObject {
            member: MemberId::PRIMARY,
            position,
            heading: cx.origin.heading,
            speed: ability.speed() as f32,
            remaining_ms: ability.lifetime_ms(),
            hit_count: template.hit_count,
        };

        let mut members = vec![primary];
        for action in &hooks.pre_spawn {
            run_pre_spawn(action, &mut members, &mut rng);
        }
        for action in &hooks.spawn {
            run_spawn(action, &mut members, &mut rng);
        }

        let ids: Vec<MemberId> = members.iter().map(|member| member.member).collect();
        self.containers.insert(
            container,
            EffectContainer {
                ability: ability.id(),
                caster: cx.caster,
                hooks,
                members: members
                    .into_iter()
                    .map(|member| (member.member, member))
                    .collect(),
            },
        );
        SpawnOutcome::Spawned {
            container,
            members: ids,
        }
    }

    /// Advances every object by `delta_ms`: tick hooks, lifetime, destroy hooks.
    pub fn tick(&mut self, delta_ms: i32) -> EffectOutput {
        let mut output = EffectOutput::default();
        let seconds = delta_ms as f32 / 1000.0;

        for (&container_id, container) in self.containers.iter_mut() {
            let hooks = Arc::clone(&container.hooks);
            let (source, ability) = (container.caster, container.ability);
            container.members.retain(|&member_id, member| {
                for action in &hooks.tick {
                    match *action {
                        TickAction::Advance => {
                            member.position = member
                                .position
                                .offset(Vec2::from_heading(member.heading), member.speed * seconds);
                        }
                        TickAction::Accelerate { per_second } => {
                            member.speed = (member.speed + per_second as f32 * seconds).max(0.0);
                        }
                    }
                }
                member.remaining_ms -= delta_ms;
                if member.remaining_ms > 0 {
                    return true;
                }
                destroy(&hooks, source, ability, member, &mut output);
                output.destroyed.push((container_id, member_id));
                false
            });
        }
        self.containers.retain(|_, container| !container.members.is_empty());
        output
    }

    /// Resolves a collision. `target` is `None` when the object hit level geometry.
    pub fn hit(
        &mut self,
        container_id: ContainerId,
        member_id: MemberId,
        target: Option<CharacterId>,
    ) -> EffectOutput {
        let mut output = EffectOutput::default();
        let Some(container) = self.containers.get_mut(&container_id) else {
            return output;
        };
        let hooks = Arc::clone(&container.hooks);
        let (source, ability) = (container.caster, container.ability);
        let Some(member) = container.members.get_mut(&member_id) else {
            return output;
        };

        let destroyed = match target {
            None => true,
            Some(target) => {
                let mut consumed = 0;
                for action in &hooks.hit {
                    let (attribute, delta) = action.delta();
                    output.hits.push(HitIntent {
                        source,
                        ability,
                        target,
                        attribute,
                        delta,
                    });
                    consumed += action.hits_consumed().max(0);
                }
                if hooks.hit.is_empty() {
                    consumed = 1;
                }
                member.hit_count -= consumed;
                member.hit_count < 1
            }
        };

        if destroyed {
            destroy(&hooks, source, ability, member, &mut output);
            container.members.remove(&member_id);
            output.destroyed.push((container_id, member_id));
            if container.members.is_empty() {
                self.containers.remove(&container_id);
            }
        }
        output
    }
}

fn destroy(
    hooks: &AbilityHooks,
    source: CharacterId,
    ability: AbilityId,
    member: &EffectObject,
    output: &mut EffectOutput,
) {
    for action in &hooks.destroy {
        match *action {
            DestroyAction::Burst {
                attribute,
                amount,
                radius,
            } => output.areas.push(AreaIntent {
                source,
                ability,
                center: member.position,
                radius,
                attribute,
                delta: amount.saturating_neg(),
            }),
        }
    }
}

fn run_pre_spawn(action: &PreSpawnAction, members: &mut Vec<EffectObject>, rng: &mut EffectRng) {
    match *action {
        PreSpawnAction::Multiply {
            count,
            spread_degrees,
        } => {
            let Some(primary) = members.first().cloned() else {
                return;
            };
            for _ in 0..count {
                if members.len() >= SimConfig::MAX_EFFECT_MEMBERS {
                    tracing::warn!("effect member limit reached; extra siblings dropped");
                    break;
                }
                let member = MemberId(members.len() as u32);
                members.push(EffectObject {
                    member,
                    heading: primary.heading + rng.next_signed(spread_degrees / 2.0),
                    ..primary.clone()
                });
            }
        }
    }
}

fn run_spawn(action: &SpawnAction, members: &mut [EffectObject], rng: &mut EffectRng) {
    match *action {
        SpawnAction::Scatter { radius } => {
            for member in members.iter_mut() {
                member.position.x += rng.next_signed(radius);
                member.position.y += rng.next_signed(radius);
            }
        }
        SpawnAction::Fan { spread_degrees } => {
            let count = members.len();
            if count < 2 {
                return;
            }
            let base = members[0].heading - spread_degrees / 2.0;
            let step = spread_degrees / (count - 1) as f32;
            for (index, member) in members.iter_mut().enumerate() {
                member.heading = base + step * index as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityKind, AbilityTemplate, HitAction, StatModifiers};
    use crate::ids::TemplateId;

    const HEALTH: AttributeId = AttributeId(1);
    const CASTER: CharacterId = CharacterId(1);
    const FOE: CharacterId = CharacterId(2);

    fn context() -> SpawnContext {
        SpawnContext {
            caster: CASTER,
            origin: Pose::new(Vec2::ZERO, 0.0),
            spawn_point: Pose::new(Vec2::new(1.0, 1.0), 0.0),
            target: None,
        }
    }

    fn ability(configure: impl FnOnce(&mut AbilityTemplate)) -> Ability {
        let mut template = AbilityTemplate::new(TemplateId(1), "orb").with_stats(StatModifiers {
            lifetime_ms: 300,
            range: 2,
            speed: 10,
            ..StatModifiers::default()
        });
        template.hooks.hit.push(HitAction::Damage {
            attribute: HEALTH,
            amount: 7,
            hits_consumed: 1,
        });
        configure(&mut template);
        Ability::new(AbilityId(1), Arc::new(template), [])
    }

    #[test]
    fn same_seed_same_spawn() {
        let ability = ability(|template| {
            template.hooks.pre_spawn.push(PreSpawnAction::Multiply {
                count: 3,
                spread_degrees: 40.0,
            });
        });
        let mut a = EffectWorld::new();
        let mut b = EffectWorld::new();
        let first = a.spawn(&ability, context(), 1234);
        let second = b.spawn(&ability, context(), 1234);
        assert_eq!(first, second);
        assert_eq!(a, b);

        let SpawnOutcome::Spawned { container, members } = first else {
            panic!("expected a spawn");
        };
        assert_eq!(members.len(), 4);
        let primary = a.container(container).unwrap().member(MemberId::PRIMARY).unwrap();
        assert!((primary.position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn container_ids_are_not_reused_while_live() {
        let ability = ability(|_| {});
        let mut world = EffectWorld::new();
        let first = world.spawn(&ability, context(), 55);
        let second = world.spawn(&ability, context(), 55);
        let (SpawnOutcome::Spawned { container: a, .. }, SpawnOutcome::Spawned { container: b, .. }) =
            (first, second)
        else {
            panic!("expected spawns");
        };
        assert_ne!(a, b);
        assert_eq!(world.live_for(AbilityId(1)), 2);
    }

    #[test]
    fn missing_target_spawns_nothing() {
        let ability = ability(|template| template.requires_target = true);
        let mut world = EffectWorld::new();
        assert_eq!(world.spawn(&ability, context(), 1), SpawnOutcome::NoTarget);
        assert!(world.is_empty());
    }

    #[test]
    fn summons_and_self_targets_skip_objects() {
        let mut world = EffectWorld::new();
        let summon = ability(|template| template.kind = AbilityKind::PetSummon);
        assert_eq!(world.spawn(&summon, context(), 1), SpawnOutcome::Summoned);

        let heal = ability(|template| template.spawn_target = SpawnTarget::Caster);
        let SpawnOutcome::SelfApplied { hits } = world.spawn(&heal, context(), 1) else {
            panic!("expected immediate application");
        };
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, CASTER);
        assert_eq!(hits[0].delta, -7);
        assert!(world.is_empty());
    }

    #[test]
    fn objects_expire_and_run_destroy_hooks() {
        let ability = ability(|template| {
            template.hooks.tick.push(TickAction::Advance);
            template.hooks.destroy.push(DestroyAction::Burst {
                attribute: HEALTH,
                amount: 3,
                radius: 2,
            });
        });
        let mut world = EffectWorld::new();
        world.spawn(&ability, context(), 9);

        let output = world.tick(100);
        assert!(output.destroyed.is_empty());
        let (_, container) = world.containers().next().unwrap();
        let moved = container.member(MemberId::PRIMARY).unwrap();
        assert!((moved.position.x - 3.0).abs() < 1e-4);

        world.tick(100);
        let output = world.tick(100);
        assert_eq!(output.destroyed.len(), 1);
        assert_eq!(output.areas.len(), 1);
        assert_eq!(output.areas[0].delta, -3);
        assert!(world.is_empty());
    }

    #[test]
    fn hits_consume_hit_count() {
        let ability = ability(|template| template.hit_count = 2);
        let mut world = EffectWorld::new();
        let SpawnOutcome::Spawned { container, .. } = world.spawn(&ability, context(), 3) else {
            panic!("expected a spawn");
        };

        let first = world.hit(container, MemberId::PRIMARY, Some(FOE));
        assert_eq!(first.hits.len(), 1);
        assert!(first.destroyed.is_empty());

        let second = world.hit(container, MemberId::PRIMARY, Some(FOE));
        assert_eq!(second.destroyed, vec![(container, MemberId::PRIMARY)]);
        assert!(world.container(container).is_none());
    }

    #[test]
    fn hitting_geometry_destroys_without_intents() {
        let ability = ability(|template| template.hit_count = 5);
        let mut world = EffectWorld::new();
        let SpawnOutcome::Spawned { container, .. } = world.spawn(&ability, context(), 3) else {
            panic!("expected a spawn");
        };
        let output = world.hit(container, MemberId::PRIMARY, None);
        assert!(output.hits.is_empty());
        assert_eq!(output.destroyed.len(), 1);
    }

    #[test]
    fn fan_spreads_headings_evenly() {
        let ability = ability(|template| {
            template.hooks.pre_spawn.push(PreSpawnAction::Multiply {
                count: 2,
                spread_degrees: 0.0,
            });
            template.hooks.spawn.push(SpawnAction::Fan {
                spread_degrees: 90.0,
            });
        });
        let mut world = EffectWorld::new();
        let SpawnOutcome::Spawned { container, .. } = world.spawn(&ability, context(), 3) else {
            panic!("expected a spawn");
        };
        let headings: Vec<f32> = world
            .container(container)
            .unwrap()
            .members()
            .map(|member| member.heading)
            .collect();
        assert_eq!(headings, vec![-45.0, 0.0, 45.0]);
    }
}
