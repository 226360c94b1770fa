//! Effect objects spawned by completed activations.
mod world;

pub use world::{
    AreaIntent, EffectContainer, EffectObject, EffectOutput, EffectWorld, HitIntent,
    SpawnContext, SpawnOutcome,
};
