//! Shared content and drivers for the ability-core integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use ability_core::{
    AbilityEvent, AbilityId, AbilityTemplate, ActivationInput, AttributeId, AttributeTemplate,
    CharacterId, CharacterSim, ContentRegistry, EventBehavior, EventId, FixedTargets, Formula,
    HitAction, NoticeLog, Pose, ResourceMap, ResourceSpec, SimConfig, SpawnTarget,
    StaticCharacterState, StatModifiers, TemplateId, Tick, TickEnv, TickMode, TickReport, Vec2,
};

pub const TICK_MS: u32 = 100;

pub const STRENGTH: AttributeId = AttributeId(1);
pub const HEALTH: AttributeId = AttributeId(2);
pub const MANA: AttributeId = AttributeId(3);

pub const FIREBALL: TemplateId = TemplateId(1);
pub const BEAM: TemplateId = TemplateId(2);
pub const MEND: TemplateId = TemplateId(3);
pub const CHANNEL: EventId = EventId(1);

pub const FIREBALL_ID: AbilityId = AbilityId(10);
pub const BEAM_ID: AbilityId = AbilityId(11);
pub const MEND_ID: AbilityId = AbilityId(12);

pub const HERO: CharacterId = CharacterId(1);
pub const ROOT_SEED: u64 = 0x5eed_cafe;

/// Fireball: 1s cast, 2s cooldown, 30 mana. Beam: channeled, 10 mana per tick.
/// Mend: 200ms cast, 10 mana, restores 25 health on the caster.
pub fn registry(mana: i32) -> Arc<ContentRegistry> {
    let attributes = vec![
        AttributeTemplate::new(STRENGTH, "strength", 10),
        AttributeTemplate::new(HEALTH, "health", 100)
            .child(STRENGTH, Formula::Linear { per_point: 2 })
            .resource(ResourceSpec::FULL),
        AttributeTemplate::new(MANA, "mana", mana).resource(ResourceSpec::FULL),
    ];

    let mut fireball = AbilityTemplate::new(FIREBALL, "fireball").with_stats(StatModifiers {
        activation_time_ms: 1000,
        lifetime_ms: 2000,
        cooldown_ms: 2000,
        range: 1,
        speed: 5,
        resources: ResourceMap::new().with(MANA, 30),
        ..StatModifiers::default()
    });
    fireball.hooks.hit.push(HitAction::Damage {
        attribute: HEALTH,
        amount: 12,
        hits_consumed: 1,
    });

    let beam = AbilityTemplate::new(BEAM, "beam")
        .with_event_slots(1)
        .with_stats(StatModifiers {
            activation_time_ms: 1000,
            lifetime_ms: 100,
            cooldown_ms: 500,
            resources: ResourceMap::new().with(MANA, 10),
            ..StatModifiers::default()
        });

    let mut mend = AbilityTemplate::new(MEND, "mend")
        .with_spawn_target(SpawnTarget::Caster)
        .with_stats(StatModifiers {
            activation_time_ms: 200,
            resources: ResourceMap::new().with(MANA, 10),
            ..StatModifiers::default()
        });
    mend.hooks.hit.push(HitAction::Restore {
        attribute: HEALTH,
        amount: 25,
        hits_consumed: 1,
    });

    let events = vec![AbilityEvent::new(CHANNEL, "channel", EventBehavior::Channeled)];

    Arc::new(
        ContentRegistry::new(attributes, vec![fireball, beam, mend], events)
            .expect("test content is valid"),
    )
}

/// Character that knows every test ability.
pub fn hero(registry: Arc<ContentRegistry>) -> CharacterSim {
    let mut sim = CharacterSim::new(HERO, registry, SimConfig::with_tick_delta(TICK_MS), ROOT_SEED);
    sim.learn_base_abilities([FIREBALL, BEAM, MEND], [CHANNEL]);
    let mut log = NoticeLog::new();
    sim.craft_ability(FIREBALL_ID, FIREBALL, &[], &mut log)
        .expect("fireball crafts");
    sim.craft_ability(BEAM_ID, BEAM, &[CHANNEL], &mut log)
        .expect("beam crafts");
    sim.craft_ability(MEND_ID, MEND, &[], &mut log)
        .expect("mend crafts");
    sim
}

/// Host collaborators with a fixed pose and a living, grounded caster.
pub struct Host {
    pub state: StaticCharacterState,
    pub targets: FixedTargets,
    pub log: NoticeLog,
}

impl Host {
    pub fn new() -> Self {
        Self {
            state: StaticCharacterState::default(),
            targets: FixedTargets::new(Pose::new(Vec2::ZERO, 0.0)),
            log: NoticeLog::new(),
        }
    }

    pub fn env(&mut self) -> TickEnv<'_> {
        TickEnv {
            character: &self.state,
            targets: &self.targets,
            observer: &mut self.log,
        }
    }

    /// Latches nothing new and runs one fresh tick.
    pub fn step(&mut self, sim: &mut CharacterSim, tick: u64) -> TickReport {
        let input = sim.next_input(Tick(tick));
        self.run(sim, &input)
    }

    pub fn run(&mut self, sim: &mut CharacterSim, input: &ActivationInput) -> TickReport {
        sim.tick(input, TickMode::Fresh, &mut self.env())
    }
}
