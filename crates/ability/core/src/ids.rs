//! Identifier newtypes and the simulation clock.
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident($repr:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub $repr);

        impl $name {
            #[inline]
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

identifier!(
    /// Authored attribute template identifier (strength, mana, ...).
    AttributeId(u32),
    "attr:"
);
identifier!(
    /// Authored ability template identifier.
    TemplateId(u32),
    "tpl:"
);
identifier!(
    /// Authored ability event identifier. Events are learnable on their own.
    EventId(u32),
    "evt:"
);
identifier!(
    /// Durable identifier of a runtime ability instance owned by a character.
    AbilityId(u64),
    "ability:"
);
identifier!(
    /// Character identifier, unique within one authority.
    CharacterId(u32),
    "#"
);
identifier!(
    /// Groups every effect object produced by one spawn.
    ContainerId(u32),
    "fx:"
);
identifier!(
    /// Index of an effect object within its container.
    MemberId(u32),
    "m:"
);

impl MemberId {
    /// The primary object of every container.
    pub const PRIMARY: Self = Self(0);
}

/// Discrete simulation tick. Both attributes and activation advance once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns true when `self` lands on a multiple of `interval`; an interval of 0 never matches.
    pub const fn is_multiple_of(self, interval: u64) -> bool {
        interval != 0 && self.0 % interval == 0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes() {
        assert_eq!(CharacterId(7).to_string(), "#7");
        assert_eq!(AbilityId(3).to_string(), "ability:3");
        assert_eq!(Tick(12).to_string(), "t12");
    }

    #[test]
    fn tick_interval_matching() {
        assert!(Tick(6).is_multiple_of(3));
        assert!(!Tick(7).is_multiple_of(3));
        assert!(!Tick(6).is_multiple_of(0));
        assert_eq!(Tick::ZERO.next() + 2, Tick(3));
    }
}
