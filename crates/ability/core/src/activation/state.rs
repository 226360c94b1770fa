use crate::ids::AbilityId;

/// Opaque token identifying the input binding that started an activation.
///
/// Charged and channeled abilities stay active only while the same token is
/// reported as held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HeldToken(pub u32);

/// Request to start an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivationRequest {
    pub ability: AbilityId,
    pub held: Option<HeldToken>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActivationPhase {
    Idle,
    Queued,
    Activating,
    Interrupting,
}

/// Per-tick activation state. Ephemeral: rebuilt from snapshots, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivationState {
    pub current: Option<AbilityId>,
    pub remaining_ms: i32,
    /// Activation time the current ability started with, for progress reporting.
    pub total_ms: i32,
    pub queued: Option<ActivationRequest>,
    pub held: Option<HeldToken>,
    pub interrupt_pending: bool,
}

impl ActivationState {
    pub fn phase(&self) -> ActivationPhase {
        if self.interrupt_pending {
            ActivationPhase::Interrupting
        } else if self.current.is_some() {
            ActivationPhase::Activating
        } else if self.queued.is_some() {
            ActivationPhase::Queued
        } else {
            ActivationPhase::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some() || self.queued.is_some()
    }

    /// Returns to Idle, keeping nothing.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_precedence() {
        let mut state = ActivationState::default();
        assert_eq!(state.phase(), ActivationPhase::Idle);

        state.queued = Some(ActivationRequest {
            ability: AbilityId(1),
            held: None,
        });
        assert_eq!(state.phase(), ActivationPhase::Queued);

        state.current = Some(AbilityId(1));
        assert_eq!(state.phase(), ActivationPhase::Activating);

        state.interrupt_pending = true;
        assert_eq!(state.phase(), ActivationPhase::Interrupting);

        state.reset();
        assert_eq!(state, ActivationState::default());
    }
}
