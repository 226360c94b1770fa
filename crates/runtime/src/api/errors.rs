//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, wire decoding, and the core
//! simulation so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use ability_core::{CatalogError, CharacterId, MessageKind, SyncError, WireError};

use crate::handlers::HandlerError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("authority worker command channel closed")]
    CommandChannelClosed,

    #[error("authority worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("authority worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a content registry before building")]
    MissingRegistry,

    #[error("character {0} is not hosted")]
    UnknownCharacter(CharacterId),

    #[error("character {0} is already hosted")]
    DuplicateCharacter(CharacterId),

    #[error("arena is full ({limit} characters)")]
    ArenaFull { limit: usize },

    #[error("{kind} messages are not accepted here")]
    UnexpectedMessage { kind: MessageKind },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("critical handler {name} failed")]
    Handler {
        name: &'static str,
        #[source]
        source: HandlerError,
    },
}
