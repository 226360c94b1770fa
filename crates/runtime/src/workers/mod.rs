//! Worker tasks that back the runtime orchestration.
//!
//! The authority worker owns every hosted character and is the only place
//! their simulations are advanced.

mod authority;

pub use authority::{AuthorityWorker, Command, Control};
