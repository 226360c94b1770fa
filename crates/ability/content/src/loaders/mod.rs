//! Content loaders for reading ability data from files.
//!
//! Each loader parses one file format; [`ContentFactory`] ties them together
//! for a data directory and [`ContentBundle`] compiles the result.

pub mod abilities;
pub mod attributes;
pub mod bundle;
pub mod config;
pub mod events;
pub mod factory;
pub mod loadout;

pub use abilities::AbilityLoader;
pub use attributes::AttributeLoader;
pub use bundle::ContentBundle;
pub use config::ConfigLoader;
pub use events::EventLoader;
pub use factory::ContentFactory;
pub use loadout::{CraftSpec, LoadoutLoader, LoadoutSpec};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
