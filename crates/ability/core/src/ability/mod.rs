//! Ability templates, events, and runtime instances.
mod event;
mod instance;
mod kind;
mod resources;
mod template;

pub use event::{
    AbilityEvent, DestroyAction, EventBehavior, EventPhase, HitAction, PreSpawnAction,
    SpawnAction, StatModifiers, TickAction,
};
pub use instance::{Ability, AbilityFlags};
pub use kind::{AbilityKind, SpawnTarget};
pub use resources::ResourceMap;
pub use template::{AbilityHooks, AbilityTemplate};
