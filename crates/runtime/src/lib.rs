//! Async orchestration around the deterministic ability simulation.
//!
//! The authority worker owns every hosted [`ability_core::CharacterSim`],
//! advances them on a shared clock, routes effect hits between characters,
//! and publishes reconciliation snapshots. Predicting peers run a
//! [`PredictionSession`] that ticks ahead locally and reconciles against those
//! snapshots.
//!
//! Modules are organized by responsibility:
//! - [`api`]: public-facing handle and error types
//! - [`events`]: topic-based event bus and event payloads
//! - [`handlers`]: post-tick handlers that resolve effect output
//! - [`workers`]: background tasks (authority simulation)
//! - [`prediction`]: client-side prediction and reconciliation
pub mod api;
pub mod arena;
pub mod config;
pub mod events;
pub mod handlers;
pub mod prediction;
pub mod runtime;
pub mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle, SyncGrant};
pub use arena::{Arena, Participant};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, PresentationEvent, ReplicationEvent, Topic};
pub use handlers::{HandlerCriticality, HandlerError, HandlerRegistry, TickContext, TickHandler};
pub use prediction::{Predicted, PredictionSession};
pub use runtime::{Runtime, RuntimeBuilder};
