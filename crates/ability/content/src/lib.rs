//! Data-driven ability content and loaders.
//!
//! This crate houses the authored content and loaders for RON/TOML data files:
//! - Attribute schema (data-driven via RON)
//! - Ability templates (data-driven via RON)
//! - Ability events (data-driven via RON)
//! - Starting loadouts (data-driven via RON)
//! - Simulation configuration (data-driven via TOML)
//!
//! Loaded content is compiled into an [`ability_core::ContentRegistry`] and
//! shared read-only by every character on both peers.

#[cfg(feature = "loaders")]
pub mod embedded;
#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use embedded::{embedded_config, embedded_loadout, embedded_registry};
#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityLoader, AttributeLoader, ConfigLoader, ContentBundle, ContentFactory, CraftSpec,
    EventLoader, LoadResult, LoadoutLoader, LoadoutSpec,
};
