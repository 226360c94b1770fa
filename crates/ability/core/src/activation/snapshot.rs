use super::collaborators::CooldownEntry;
use super::state::HeldToken;
use crate::ids::{AbilityId, AttributeId, Tick};

/// Authoritative activation state at the end of `tick`.
///
/// Predicting peers overwrite their local state with this verbatim, even when
/// `current_ability` is unknown to them, then replay newer inputs.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconcileSnapshot {
    pub tick: Tick,
    pub current_ability: Option<AbilityId>,
    pub remaining_ms: i32,
    pub total_ms: i32,
    pub held: Option<HeldToken>,
    pub seed_cursor: u64,
    /// Current value of every resource attribute.
    pub resources: Vec<(AttributeId, f32)>,
    pub cooldowns: Vec<CooldownEntry>,
}

impl ReconcileSnapshot {
    /// Last-writer-wins: only strictly newer snapshots replace `last`.
    pub fn supersedes(&self, last: Option<Tick>) -> bool {
        last.is_none_or(|last| self.tick > last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticks_win() {
        let snapshot = ReconcileSnapshot {
            tick: Tick(5),
            ..ReconcileSnapshot::default()
        };
        assert!(snapshot.supersedes(None));
        assert!(snapshot.supersedes(Some(Tick(4))));
        assert!(!snapshot.supersedes(Some(Tick(5))));
        assert!(!snapshot.supersedes(Some(Tick(9))));
    }
}
