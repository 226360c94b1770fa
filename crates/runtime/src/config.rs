use std::time::Duration;

use ability_core::{AttributeId, SimConfig};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub sim: SimConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Wall-clock pacing of authority ticks. `None` advances only on
    /// [`RuntimeHandle::tick`](crate::RuntimeHandle::tick).
    pub tick_interval: Option<Duration>,
    /// Distance at which an effect object touches a character.
    pub hit_radius: f32,
    /// Resource whose depletion marks a character dead.
    pub vital_attribute: Option<AttributeId>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            tick_interval: None,
            hit_radius: 1.0,
            vital_attribute: None,
        }
    }
}
