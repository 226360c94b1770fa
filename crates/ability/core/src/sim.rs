//! Per-character simulation: attributes, catalog, cooldowns, activation, and effects.
//!
//! [`CharacterSim`] is the unit both peers run. The authority ticks it with
//! inputs forwarded by the owning peer; the owning peer ticks it locally ahead
//! of the authority and reconciles when snapshots arrive. Each tick runs:
//!
//! 1. cooldown countdown
//! 2. resource regeneration
//! 3. the activation protocol
//! 4. spawns for seeds the protocol handed out; a replayed tick re-applies
//!    only caster-targeted hits, which land on this character's own graph
//! 5. effect object lifetimes and tick hooks (fresh ticks only)

use std::sync::Arc;

use crate::ability::Ability;
use crate::activation::{
    ActivationContext, ActivationInput, ActivationObserver, ActivationPhase, ActivationProtocol,
    ActivationStep, CharacterState, CooldownService, CooldownTable, HeldToken, InputLatch,
    PredictionBuffer, ReconcileSnapshot, SeedSequence, TargetResolver, TickMode,
};
use crate::attribute::AttributeGraph;
use crate::catalog::{AbilityCatalog, CatalogError, Learned};
use crate::config::SimConfig;
use crate::effect::{EffectOutput, EffectWorld, HitIntent, SpawnContext, SpawnOutcome};
use crate::ids::{AbilityId, AttributeId, CharacterId, EventId, TemplateId, Tick};
use crate::registry::ContentRegistry;

/// Host-supplied collaborators for one tick.
pub struct TickEnv<'a> {
    pub character: &'a dyn CharacterState,
    pub targets: &'a dyn TargetResolver,
    pub observer: &'a mut dyn ActivationObserver,
}

/// Result of a spawn performed for one seed.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnReport {
    pub ability: AbilityId,
    pub seed: u64,
    pub outcome: SpawnOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tick: Tick,
    pub step: ActivationStep,
    pub spawns: Vec<SpawnReport>,
    pub effects: EffectOutput,
}

pub struct CharacterSim {
    id: CharacterId,
    registry: Arc<ContentRegistry>,
    config: SimConfig,
    attributes: AttributeGraph,
    catalog: AbilityCatalog,
    cooldowns: CooldownTable,
    protocol: ActivationProtocol,
    seeds: SeedSequence,
    effects: EffectWorld,
    latch: InputLatch,
}

impl CharacterSim {
    pub fn new(
        id: CharacterId,
        registry: Arc<ContentRegistry>,
        config: SimConfig,
        root_seed: u64,
    ) -> Self {
        let attributes = AttributeGraph::new(Arc::clone(registry.attributes()));
        Self {
            id,
            registry,
            config,
            attributes,
            catalog: AbilityCatalog::new(),
            cooldowns: CooldownTable::new(),
            protocol: ActivationProtocol::new(),
            seeds: SeedSequence::new(root_seed),
            effects: EffectWorld::new(),
            latch: InputLatch::new(),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn registry(&self) -> &Arc<ContentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn attributes(&self) -> &AttributeGraph {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeGraph {
        &mut self.attributes
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    pub fn effects(&self) -> &EffectWorld {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectWorld {
        &mut self.effects
    }

    pub fn seeds(&self) -> &SeedSequence {
        &self.seeds
    }

    pub fn protocol(&self) -> &ActivationProtocol {
        &self.protocol
    }

    /// Phase including a request latched locally but not yet ticked.
    pub fn phase(&self) -> ActivationPhase {
        match self.protocol.phase() {
            ActivationPhase::Idle if self.latch.interrupt_pending() => {
                ActivationPhase::Interrupting
            }
            ActivationPhase::Idle if self.latch.has_request() => ActivationPhase::Queued,
            phase => phase,
        }
    }

    // ===== input =====

    /// Latches an activation request for the next tick.
    pub fn activate(&mut self, ability: AbilityId, held: Option<HeldToken>) -> bool {
        self.latch.request(ability, held)
    }

    pub fn hold(&mut self, token: HeldToken) {
        self.latch.hold(token);
    }

    pub fn release(&mut self) {
        self.latch.release();
    }

    pub fn interrupt(&mut self) {
        self.latch.interrupt();
    }

    /// Drains the latch into the input for `tick`.
    pub fn next_input(&mut self, tick: Tick) -> ActivationInput {
        self.latch.take(tick)
    }

    // ===== catalog =====

    pub fn learn_base_abilities(
        &mut self,
        templates: impl IntoIterator<Item = TemplateId>,
        events: impl IntoIterator<Item = EventId>,
    ) -> Learned {
        self.catalog
            .learn_base_abilities(&self.registry, templates, events)
    }

    /// Adds a ready-made instance, replacing any with the same id.
    pub fn learn_ability(
        &mut self,
        ability: Ability,
        observer: &mut dyn ActivationObserver,
    ) -> Option<Ability> {
        let id = ability.id();
        let replaced = self.catalog.learn_ability(ability);
        observer.on_ability_added(id);
        replaced
    }

    pub fn craft_ability(
        &mut self,
        id: AbilityId,
        template: TemplateId,
        events: &[EventId],
        observer: &mut dyn ActivationObserver,
    ) -> Result<AbilityId, CatalogError> {
        self.catalog
            .craft_ability(&self.registry, id, template, events)?;
        tracing::debug!(
            target: "ability::catalog",
            character = %self.id,
            ability = %id,
            template = %template,
            "ability crafted"
        );
        observer.on_ability_added(id);
        Ok(id)
    }

    pub fn remove_ability(&mut self, id: AbilityId) -> Option<Ability> {
        self.catalog.remove_ability(id)
    }

    pub fn knows_ability(&self, id: AbilityId) -> bool {
        self.catalog.knows_ability(id)
    }

    // ===== tick =====

    pub fn tick(
        &mut self,
        input: &ActivationInput,
        mode: TickMode,
        env: &mut TickEnv<'_>,
    ) -> TickReport {
        let delta_ms = self.config.tick_delta();
        self.cooldowns.tick(delta_ms);
        self.attributes.regenerate(self.config.tick_delta_ms);

        let outcome = {
            let mut cx = ActivationContext {
                catalog: &self.catalog,
                attributes: &mut self.attributes,
                cooldowns: &mut self.cooldowns,
                character: env.character,
                targets: env.targets,
                seeds: &mut self.seeds,
                observer: &mut *env.observer,
                mode,
                delta_ms,
            };
            self.protocol.tick(input, &mut cx)
        };

        let mut report = TickReport {
            tick: input.tick,
            step: outcome.step,
            spawns: Vec::with_capacity(outcome.spawns.len()),
            effects: EffectOutput::default(),
        };
        if !mode.is_fresh() {
            let hits: Vec<HitIntent> = outcome
                .spawns
                .iter()
                .filter_map(|request| self.catalog.get(request.ability))
                .filter_map(|ability| EffectWorld::caster_hits(ability, self.id))
                .flatten()
                .collect();
            for hit in &hits {
                self.apply_hit(hit);
            }
            return report;
        }

        for request in outcome.spawns {
            let Some(ability) = self.catalog.get(request.ability) else {
                continue;
            };
            let cx = SpawnContext {
                caster: self.id,
                origin: env.targets.caster_pose(),
                spawn_point: env.targets.spawn_point(),
                target: env.targets.resolve_target(ability),
            };
            let spawned = self.effects.spawn(ability, cx, request.seed);
            match &spawned {
                SpawnOutcome::Summoned => env.observer.on_summon(request.ability),
                SpawnOutcome::Spawned { container, members } => {
                    env.observer
                        .on_effect_spawned(request.ability, *container, members.len());
                }
                SpawnOutcome::SelfApplied { hits } => {
                    for hit in hits {
                        self.apply_hit(hit);
                    }
                }
                SpawnOutcome::NoTarget => {}
            }
            report.spawns.push(SpawnReport {
                ability: request.ability,
                seed: request.seed,
                outcome: spawned,
            });
        }

        report.effects = self.effects.tick(delta_ms);
        report
    }

    /// Applies a hit aimed at this character. Resources move their current
    /// value; other attributes move their base.
    pub fn apply_hit(&mut self, hit: &HitIntent) -> bool {
        if hit.target != self.id {
            return false;
        }
        self.apply_delta(hit.attribute, hit.delta)
    }

    pub fn apply_delta(&mut self, attribute: AttributeId, delta: i32) -> bool {
        if self.attributes.resource(attribute).is_some() {
            if delta < 0 {
                self.attributes.consume(attribute, delta.unsigned_abs() as f32)
            } else {
                self.attributes.gain(attribute, delta as f32)
            }
        } else {
            self.attributes.add_base(attribute, delta)
        }
    }

    // ===== reconciliation =====

    pub fn snapshot(&self, tick: Tick) -> ReconcileSnapshot {
        let state = self.protocol.state();
        ReconcileSnapshot {
            tick,
            current_ability: state.current,
            remaining_ms: state.remaining_ms,
            total_ms: state.total_ms,
            held: state.held,
            seed_cursor: self.seeds.cursor(),
            resources: self.attributes.resource_levels(),
            cooldowns: self.cooldowns.entries(),
        }
    }

    /// Overwrites local state with `snapshot` without notifying observers.
    pub fn apply_snapshot(&mut self, snapshot: &ReconcileSnapshot) {
        if let Some(current) = snapshot.current_ability {
            if !self.catalog.knows_ability(current) {
                tracing::warn!(
                    target: "ability::reconcile",
                    character = %self.id,
                    ability = %current,
                    "snapshot references an unknown ability"
                );
            }
        }
        self.protocol.restore(
            snapshot.current_ability,
            snapshot.remaining_ms,
            snapshot.total_ms,
            snapshot.held,
        );
        for &(attribute, current) in &snapshot.resources {
            self.attributes.set_current(attribute, current, false);
        }
        self.cooldowns.restore(&snapshot.cooldowns);
        self.seeds.set_cursor(snapshot.seed_cursor);
    }

    /// Applies a newer snapshot and replays unconfirmed inputs.
    ///
    /// Returns the number of replayed ticks, or `None` when the snapshot is stale.
    pub fn reconcile(
        &mut self,
        snapshot: &ReconcileSnapshot,
        buffer: &mut PredictionBuffer,
        env: &mut TickEnv<'_>,
    ) -> Option<usize> {
        let replay = buffer.accept(snapshot)?;
        self.apply_snapshot(snapshot);
        for input in &replay {
            self.tick(input, TickMode::Replay, env);
        }
        tracing::trace!(
            target: "ability::reconcile",
            character = %self.id,
            tick = %snapshot.tick,
            replayed = replay.len(),
            "reconciled"
        );
        Some(replay.len())
    }

    #[cfg(feature = "serde")]
    pub(crate) fn replace_state(
        &mut self,
        attributes: AttributeGraph,
        catalog: AbilityCatalog,
        cooldowns: CooldownTable,
        seeds: SeedSequence,
    ) {
        self.attributes = attributes;
        self.catalog = catalog;
        self.cooldowns = cooldowns;
        self.seeds = seeds;
        self.protocol.reset();
        self.effects.clear();
        self.latch = InputLatch::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityTemplate, HitAction, ResourceMap, SpawnTarget, StatModifiers};
    use crate::activation::{FixedTargets, NoticeLog, StaticCharacterState};
    use crate::attribute::{AttributeTemplate, ResourceSpec};
    use crate::geometry::Pose;

    const MANA: AttributeId = AttributeId(1);
    const HEALTH: AttributeId = AttributeId(2);
    const BOLT: TemplateId = TemplateId(1);
    const MEND: TemplateId = TemplateId(2);

    fn registry() -> Arc<ContentRegistry> {
        let attributes = vec![
            AttributeTemplate::new(MANA, "mana", 50).resource(ResourceSpec::FULL),
            AttributeTemplate::new(HEALTH, "health", 100).resource(ResourceSpec {
                regen_per_second: 0.0,
                starts_full: false,
            }),
        ];
        let bolt = AbilityTemplate::new(BOLT, "bolt").with_stats(StatModifiers {
            activation_time_ms: 200,
            lifetime_ms: 1000,
            cooldown_ms: 500,
            resources: ResourceMap::new().with(MANA, 10),
            ..StatModifiers::default()
        });
        let mut mend = AbilityTemplate::new(MEND, "mend")
            .with_spawn_target(SpawnTarget::Caster)
            .with_stats(StatModifiers {
                activation_time_ms: 100,
                ..StatModifiers::default()
            });
        mend.hooks.hit.push(HitAction::Restore {
            attribute: HEALTH,
            amount: 25,
            hits_consumed: 1,
        });
        Arc::new(ContentRegistry::new(attributes, vec![bolt, mend], vec![]).unwrap())
    }

    fn sim() -> CharacterSim {
        let mut sim = CharacterSim::new(
            CharacterId(7),
            registry(),
            SimConfig::with_tick_delta(100),
            42,
        );
        sim.learn_base_abilities([BOLT, MEND], []);
        let mut log = NoticeLog::new();
        sim.craft_ability(AbilityId(1), BOLT, &[], &mut log).unwrap();
        sim.craft_ability(AbilityId(2), MEND, &[], &mut log).unwrap();
        sim
    }

    fn run(sim: &mut CharacterSim, tick: u64, log: &mut NoticeLog) -> TickReport {
        let state = StaticCharacterState::default();
        let targets = FixedTargets::new(Pose::default());
        let mut env = TickEnv {
            character: &state,
            targets: &targets,
            observer: log,
        };
        let input = sim.next_input(Tick(tick));
        sim.tick(&input, TickMode::Fresh, &mut env)
    }

    #[test]
    fn completed_bolt_spawns_and_pays() {
        let mut sim = sim();
        let mut log = NoticeLog::new();
        assert!(sim.activate(AbilityId(1), None));
        assert_eq!(sim.phase(), ActivationPhase::Queued);

        run(&mut sim, 1, &mut log);
        run(&mut sim, 2, &mut log);
        let report = run(&mut sim, 3, &mut log);

        assert_eq!(report.step, ActivationStep::Completed { ability: AbilityId(1) });
        assert!(matches!(report.spawns[0].outcome, SpawnOutcome::Spawned { .. }));
        assert_eq!(sim.attributes().current(MANA), Some(40.0));
        assert_eq!(sim.cooldowns().remaining(AbilityId(1)), 500);
        assert_eq!(sim.effects().live_for(AbilityId(1)), 1);
        assert_eq!(sim.seeds().cursor(), 1);
    }

    #[test]
    fn self_targeted_mend_applies_immediately() {
        let mut sim = sim();
        let mut log = NoticeLog::new();
        sim.activate(AbilityId(2), None);
        run(&mut sim, 1, &mut log);
        let report = run(&mut sim, 2, &mut log);
        assert!(matches!(report.spawns[0].outcome, SpawnOutcome::SelfApplied { .. }));
        assert_eq!(sim.attributes().current(HEALTH), Some(25.0));
        assert!(sim.effects().is_empty());
    }

    #[test]
    fn snapshot_restores_state_silently() {
        let mut authority = sim();
        let mut log = NoticeLog::new();
        authority.activate(AbilityId(1), None);
        run(&mut authority, 1, &mut log);
        let snapshot = authority.snapshot(Tick(1));

        let mut peer = sim();
        peer.attributes_mut().drain_changes();
        peer.apply_snapshot(&snapshot);
        assert_eq!(peer.protocol().state().current, Some(AbilityId(1)));
        assert_eq!(peer.snapshot(Tick(1)), snapshot);
        assert!(peer.attributes_mut().drain_changes().is_empty());
    }

    #[test]
    fn hits_for_other_characters_are_ignored() {
        let mut sim = sim();
        let hit = HitIntent {
            source: CharacterId(1),
            ability: AbilityId(9),
            target: CharacterId(99),
            attribute: HEALTH,
            delta: 10,
        };
        assert!(!sim.apply_hit(&hit));
        assert!(sim.apply_hit(&HitIntent {
            target: sim.id(),
            ..hit
        }));
        assert_eq!(sim.attributes().current(HEALTH), Some(10.0));
    }
}
