/// Ability classification.
///
/// Classification affects:
/// - Stance checks at activation (grounded / aerial)
/// - Summon handling (pet summons spawn no effect object)
/// - Presentation grouping
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AbilityKind {
    /// No stance or summon restrictions
    #[default]
    General,
    /// Weapon attacks
    Physical,
    /// Spells
    Magic,
    /// Only usable while standing on the ground
    Grounded,
    /// Only usable while airborne
    Aerial,
    /// Summons a pet; rejected while one is already out
    PetSummon,
}

impl AbilityKind {
    /// Stance the caster must be in, if any. `Some(true)` means grounded.
    pub const fn required_grounded(self) -> Option<bool> {
        match self {
            AbilityKind::Grounded => Some(true),
            AbilityKind::Aerial => Some(false),
            _ => None,
        }
    }

    pub const fn is_summon(self) -> bool {
        matches!(self, AbilityKind::PetSummon)
    }
}

/// Where the first effect object of a spawn appears.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SpawnTarget {
    /// Applied to the caster immediately; no transient object is created
    Caster,
    /// At the resolved target's position
    Target,
    /// Ahead of the caster along its heading, at the ability's range
    #[default]
    Forward,
    /// At the caster's spawn point (hand, weapon tip, ...)
    Spawner,
}
