//! High-level runtime orchestrator.
//!
//! The runtime owns the authority worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the simulation.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use ability_core::ContentRegistry;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::handlers::HandlerRegistry;
use crate::workers::AuthorityWorker;

/// Main runtime that hosts the authoritative simulation.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every outstanding [`RuntimeHandle`] clone is dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    registry: Option<Arc<ContentRegistry>>,
    handlers: Option<HandlerRegistry>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            registry: None,
            handlers: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the content every hosted character is built from (required)
    pub fn registry(mut self, registry: Arc<ContentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set custom post-tick handlers.
    ///
    /// If not provided, [`HandlerRegistry::default_handlers`] is used.
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Build the runtime and spawn the authority worker
    pub async fn build(self) -> Result<Runtime> {
        let registry = self.registry.ok_or(RuntimeError::MissingRegistry)?;
        let handlers = self.handlers.unwrap_or_default();

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let worker = AuthorityWorker::new(
            registry,
            self.config,
            handlers,
            command_rx,
            event_bus.clone(),
        );
        let worker_handle = tokio::spawn(worker.run());

        Ok(Runtime {
            handle: RuntimeHandle::new(command_tx, event_bus),
            worker_handle,
        })
    }
}
