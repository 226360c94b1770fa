//! Services the activation protocol consults but does not own.
//!
//! Hosts plug in their own implementations; the bundled ones are enough for
//! the runtime worker, the CLI, and tests.

use std::collections::BTreeMap;

use crate::ability::Ability;
use crate::geometry::{Pose, Vec2};
use crate::ids::{AbilityId, CharacterId};

/// Remaining cooldown of one ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownEntry {
    pub ability: AbilityId,
    pub remaining_ms: i32,
}

/// Per-character cooldown bookkeeping.
pub trait CooldownService {
    fn remaining(&self, ability: AbilityId) -> i32;

    fn is_on_cooldown(&self, ability: AbilityId) -> bool {
        self.remaining(ability) > 0
    }

    /// Starts (or restarts) a cooldown of `duration_ms`.
    fn add_cooldown(&mut self, ability: AbilityId, duration_ms: i32);

    fn tick(&mut self, delta_ms: i32);

    /// Active cooldowns in ability id order.
    fn entries(&self) -> Vec<CooldownEntry>;

    /// Replaces every cooldown with `entries`.
    fn restore(&mut self, entries: &[CooldownEntry]);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooldownTable {
    remaining: BTreeMap<AbilityId, i32>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl CooldownService for CooldownTable {
    fn remaining(&self, ability: AbilityId) -> i32 {
        self.remaining.get(&ability).copied().unwrap_or(0)
    }

    fn add_cooldown(&mut self, ability: AbilityId, duration_ms: i32) {
        if duration_ms > 0 {
            self.remaining.insert(ability, duration_ms);
        }
    }

    fn tick(&mut self, delta_ms: i32) {
        self.remaining.retain(|_, remaining| {
            *remaining -= delta_ms;
            *remaining > 0
        });
    }

    fn entries(&self) -> Vec<CooldownEntry> {
        self.remaining
            .iter()
            .map(|(&ability, &remaining_ms)| CooldownEntry {
                ability,
                remaining_ms,
            })
            .collect()
    }

    fn restore(&mut self, entries: &[CooldownEntry]) {
        self.remaining = entries
            .iter()
            .filter(|entry| entry.remaining_ms > 0)
            .map(|entry| (entry.ability, entry.remaining_ms))
            .collect();
    }
}

/// Read-only character facts used by activation checks.
pub trait CharacterState {
    fn is_alive(&self) -> bool;
    fn is_grounded(&self) -> bool;
    fn has_pet(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticCharacterState {
    pub alive: bool,
    pub grounded: bool,
    pub has_pet: bool,
}

impl Default for StaticCharacterState {
    fn default() -> Self {
        Self {
            alive: true,
            grounded: true,
            has_pet: false,
        }
    }
}

impl CharacterState for StaticCharacterState {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn has_pet(&self) -> bool {
        self.has_pet
    }
}

/// Character an ability is aimed at.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetInfo {
    pub character: CharacterId,
    pub position: Vec2,
}

/// Resolves where an ability spawns and what it is aimed at.
pub trait TargetResolver {
    fn caster_pose(&self) -> Pose;

    /// Spawn point for [`SpawnTarget::Spawner`](crate::ability::SpawnTarget::Spawner).
    fn spawn_point(&self) -> Pose {
        self.caster_pose()
    }

    fn resolve_target(&self, ability: &Ability) -> Option<TargetInfo>;
}

/// Resolver with a fixed pose and optional target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedTargets {
    pub pose: Pose,
    pub target: Option<TargetInfo>,
}

impl FixedTargets {
    pub fn new(pose: Pose) -> Self {
        Self { pose, target: None }
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetInfo) -> Self {
        self.target = Some(target);
        self
    }
}

impl TargetResolver for FixedTargets {
    fn caster_pose(&self) -> Pose {
        self.pose
    }

    fn resolve_target(&self, _ability: &Ability) -> Option<TargetInfo> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_expire_after_ticks() {
        let mut cooldowns = CooldownTable::new();
        cooldowns.add_cooldown(AbilityId(1), 250);
        assert!(cooldowns.is_on_cooldown(AbilityId(1)));
        cooldowns.tick(100);
        assert_eq!(cooldowns.remaining(AbilityId(1)), 150);
        cooldowns.tick(200);
        assert!(!cooldowns.is_on_cooldown(AbilityId(1)));
        assert!(cooldowns.is_empty());
    }

    #[test]
    fn restore_replaces_entries() {
        let mut cooldowns = CooldownTable::new();
        cooldowns.add_cooldown(AbilityId(1), 500);
        cooldowns.restore(&[CooldownEntry {
            ability: AbilityId(2),
            remaining_ms: 300,
        }]);
        assert_eq!(
            cooldowns.entries(),
            vec![CooldownEntry {
                ability: AbilityId(2),
                remaining_ms: 300
            }]
        );
        assert!(!cooldowns.is_on_cooldown(AbilityId(1)));
    }
}
