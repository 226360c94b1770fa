//! Deterministic ability activation and attribute graph shared by all peers.
//!
//! `ability-core` defines the canonical rules: authored content
//! ([`ContentRegistry`]), per-character attribute graphs, ability instances
//! composed from templates and events, the tick-driven activation protocol,
//! and the effect objects it spawns. Everything here is pure and synchronous;
//! the runtime crate drives [`CharacterSim`] on a clock and moves the
//! [`wire`] payloads between authority and predicting peers.
pub mod ability;
pub mod activation;
pub mod attribute;
pub mod catalog;
pub mod config;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod registry;
pub mod sim;
#[cfg(feature = "serde")]
pub mod wire;

pub use ability::{
    Ability, AbilityEvent, AbilityFlags, AbilityHooks, AbilityKind, AbilityTemplate,
    DestroyAction, EventBehavior, EventPhase, HitAction, PreSpawnAction, ResourceMap,
    SpawnAction, SpawnTarget, StatModifiers, TickAction,
};
pub use activation::{
    ActivationInput, ActivationNotice, ActivationObserver, ActivationPhase, ActivationProtocol,
    ActivationStep, CharacterState, CooldownEntry, CooldownService, CooldownTable, FixedTargets,
    HeldToken, NoticeLog, NullObserver, PredictionBuffer, ReconcileSnapshot, Rejection,
    SeedSequence, StaticCharacterState, TargetInfo, TargetResolver, TickMode,
};
pub use attribute::{
    AttributeChange, AttributeGraph, AttributeSchema, AttributeTemplate, Formula, ResourceSpec,
    SchemaError,
};
pub use catalog::{AbilityCatalog, CatalogError, Learned};
pub use config::SimConfig;
pub use effect::{AreaIntent, EffectOutput, EffectWorld, HitIntent, SpawnOutcome};
pub use error::{ErrorSeverity, SimError};
pub use geometry::{Pose, Vec2};
pub use ids::{
    AbilityId, AttributeId, CharacterId, ContainerId, EventId, MemberId, TemplateId, Tick,
};
pub use registry::{ContentRegistry, RegistryError};
pub use sim::{CharacterSim, SpawnReport, TickEnv, TickReport};
#[cfg(feature = "serde")]
pub use wire::{CharacterSyncPayload, MessageKind, SyncError, WireError, WireMessage};
