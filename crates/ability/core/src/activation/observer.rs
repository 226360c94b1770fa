use crate::ids::{AbilityId, ContainerId};

/// Presentation-facing notifications. Only fired on freshly produced ticks.
///
/// All methods default to no-ops so hosts implement only what they render.
#[allow(unused_variables)]
pub trait ActivationObserver {
    fn on_progress(&mut self, ability: AbilityId, remaining_ms: i32, total_ms: i32) {}

    /// Activation ended without external preemption (completion, release, failed check).
    fn on_cancel(&mut self, ability: AbilityId) {}

    fn on_interrupt(&mut self, ability: Option<AbilityId>) {}

    fn on_ability_added(&mut self, ability: AbilityId) {}

    fn on_summon(&mut self, ability: AbilityId) {}

    fn on_effect_spawned(&mut self, ability: AbilityId, container: ContainerId, members: usize) {}
}

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl ActivationObserver for NullObserver {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationNotice {
    Progress {
        ability: AbilityId,
        remaining_ms: i32,
        total_ms: i32,
    },
    Cancelled {
        ability: AbilityId,
    },
    Interrupted {
        ability: Option<AbilityId>,
    },
    AbilityAdded {
        ability: AbilityId,
    },
    Summoned {
        ability: AbilityId,
    },
    EffectSpawned {
        ability: AbilityId,
        container: ContainerId,
        members: usize,
    },
}

/// Observer that records notices for later draining.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoticeLog {
    notices: Vec<ActivationNotice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[ActivationNotice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<ActivationNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn count(&self, matches: impl Fn(&ActivationNotice) -> bool) -> usize {
        self.notices.iter().filter(|notice| matches(notice)).count()
    }
}

impl ActivationObserver for NoticeLog {
    fn on_progress(&mut self, ability: AbilityId, remaining_ms: i32, total_ms: i32) {
        self.notices.push(ActivationNotice::Progress {
            ability,
            remaining_ms,
            total_ms,
        });
    }

    fn on_cancel(&mut self, ability: AbilityId) {
        self.notices.push(ActivationNotice::Cancelled { ability });
    }

    fn on_interrupt(&mut self, ability: Option<AbilityId>) {
        self.notices.push(ActivationNotice::Interrupted { ability });
    }

    fn on_ability_added(&mut self, ability: AbilityId) {
        self.notices.push(ActivationNotice::AbilityAdded { ability });
    }

    fn on_summon(&mut self, ability: AbilityId) {
        self.notices.push(ActivationNotice::Summoned { ability });
    }

    fn on_effect_spawned(&mut self, ability: AbilityId, container: ContainerId, members: usize) {
        self.notices.push(ActivationNotice::EffectSpawned {
            ability,
            container,
            members,
        });
    }
}
