/// Simulation configuration constants and tunable parameters.
///
/// Authority and predicting peers must run with identical values; the runtime
/// ships the loaded config to both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Milliseconds simulated by one tick.
    pub tick_delta_ms: u32,
    /// Authority emits a reconciliation snapshot every N ticks.
    pub reconcile_interval: u32,
    /// Upper bound on buffered inputs kept for replay by a predicting peer.
    pub max_replay_ticks: usize,
}

impl SimConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of events attached to one ability instance.
    pub const MAX_EVENT_SLOTS: usize = 16;
    /// Maximum number of effect objects produced by one spawn.
    pub const MAX_EFFECT_MEMBERS: usize = 32;
    /// Maximum number of characters hosted by one authority.
    pub const MAX_CHARACTERS: usize = 256;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_DELTA_MS: u32 = 50;
    pub const DEFAULT_RECONCILE_INTERVAL: u32 = 3;
    pub const DEFAULT_MAX_REPLAY_TICKS: usize = 64;

    pub fn new() -> Self {
        Self {
            tick_delta_ms: Self::DEFAULT_TICK_DELTA_MS,
            reconcile_interval: Self::DEFAULT_RECONCILE_INTERVAL,
            max_replay_ticks: Self::DEFAULT_MAX_REPLAY_TICKS,
        }
    }

    pub fn with_tick_delta(tick_delta_ms: u32) -> Self {
        Self {
            tick_delta_ms,
            ..Self::new()
        }
    }

    /// Tick delta as the signed millisecond unit used by timers.
    pub fn tick_delta(&self) -> i32 {
        i32::try_from(self.tick_delta_ms).unwrap_or(i32::MAX)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
