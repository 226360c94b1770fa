//! Post-tick handlers that resolve effect output against the arena.
//!
//! Characters tick in isolation; anything that crosses characters (contacts,
//! hits, area bursts, deaths) is settled here after every character has
//! stepped. Handlers run in registration order against a shared
//! [`TickContext`].

mod collision;
mod routing;
mod vitals;

pub use collision::CollisionHandler;
pub use routing::{AreaRouter, HitRouter};
pub use vitals::VitalsHandler;

use ability_core::{AttributeId, CharacterId, EffectOutput, Tick};
use thiserror::Error;
use tracing::{debug, error};

use crate::arena::Arena;
use crate::config::RuntimeConfig;
use crate::events::PresentationEvent;

/// Criticality level for handler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerCriticality {
    /// Handler failure fails the whole tick.
    Critical,
    /// Handler failure is logged but execution continues.
    Important,
    /// Handler failure can be ignored.
    Optional,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("hit aimed at {0}, which is not hosted")]
    UnknownTarget(CharacterId),

    #[error("{target} has no attribute {attribute}")]
    MissingAttribute {
        target: CharacterId,
        attribute: AttributeId,
    },
}

/// State shared by the handlers of one authority tick.
pub struct TickContext<'a> {
    pub tick: Tick,
    pub config: &'a RuntimeConfig,
    pub arena: &'a mut Arena,
    /// Intents produced this tick that no handler has consumed yet.
    pub output: &'a mut EffectOutput,
    pub events: &'a mut Vec<PresentationEvent>,
}

pub trait TickHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn criticality(&self) -> HandlerCriticality {
        HandlerCriticality::Important
    }

    fn handle(&self, cx: &mut TickContext<'_>) -> Result<(), HandlerError>;
}

/// Ordered set of post-tick handlers.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn TickHandler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Contacts, then hits, then areas, then deaths.
    pub fn default_handlers() -> Self {
        Self::empty()
            .with(CollisionHandler)
            .with(HitRouter)
            .with(AreaRouter)
            .with(VitalsHandler)
    }

    #[must_use]
    pub fn with(mut self, handler: impl TickHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Runs every handler in order. Stops at the first critical failure.
    pub fn run(&self, cx: &mut TickContext<'_>) -> Result<(), (&'static str, HandlerError)> {
        for handler in &self.handlers {
            if let Err(error) = handler.handle(cx) {
                Self::handle_error(handler.as_ref(), error)?;
            }
        }
        Ok(())
    }

    fn handle_error(
        handler: &dyn TickHandler,
        error: HandlerError,
    ) -> Result<(), (&'static str, HandlerError)> {
        match handler.criticality() {
            HandlerCriticality::Critical => {
                error!(
                    target: "runtime::handlers",
                    handler = handler.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical handler failed, aborting tick"
                );
                return Err((handler.name(), error));
            }
            HandlerCriticality::Important => error!(
                target: "runtime::handlers",
                handler = handler.name(),
                criticality = "important",
                error = %error,
                "Handler failed, continuing"
            ),
            HandlerCriticality::Optional => debug!(
                target: "runtime::handlers",
                handler = handler.name(),
                criticality = "optional",
                error = %error,
                "Optional handler failed"
            ),
        }
        Ok(())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::default_handlers()
    }
}
