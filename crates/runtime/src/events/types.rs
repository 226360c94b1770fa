//! Event types for different topics.

use ability_core::{ActivationNotice, CharacterId, HitIntent, Tick};
use serde::{Deserialize, Serialize};

/// Authority state headed for predicting peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationEvent {
    /// Encoded `WireMessage::Snapshot` for `character` at the end of `tick`.
    Snapshot {
        character: CharacterId,
        tick: Tick,
        message: Vec<u8>,
    },
}

impl ReplicationEvent {
    pub fn character(&self) -> CharacterId {
        match self {
            Self::Snapshot { character, .. } => *character,
        }
    }
}

/// Authority-side facts for rendering and logging. Never replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentationEvent {
    Notice {
        character: CharacterId,
        tick: Tick,
        notice: ActivationNotice,
    },
    Hit {
        tick: Tick,
        hit: HitIntent,
    },
    Died {
        character: CharacterId,
        tick: Tick,
    },
}
