//! Ability activation: per-tick state machine, deterministic seeds, and the
//! reconciliation data exchanged between authority and predicting peers.
mod collaborators;
mod input;
mod observer;
mod prediction;
mod protocol;
mod seed;
mod snapshot;
mod state;

pub use collaborators::{
    CharacterState, CooldownEntry, CooldownService, CooldownTable, FixedTargets,
    StaticCharacterState, TargetInfo, TargetResolver,
};
pub use input::{ActivationInput, InputLatch};
pub use observer::{ActivationNotice, ActivationObserver, NoticeLog, NullObserver};
pub use prediction::PredictionBuffer;
pub use protocol::{
    ActivationContext, ActivationProtocol, ActivationStep, Rejection, SpawnRequest, TickMode,
    TickOutcome,
};
pub use seed::{EffectRng, SeedSequence, derive_seed};
pub use snapshot::ReconcileSnapshot;
pub use state::{ActivationPhase, ActivationRequest, ActivationState, HeldToken};
