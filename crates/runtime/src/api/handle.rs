//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving hosted characters or streaming events from specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use ability_content::LoadoutSpec;
use ability_core::{
    AbilityId, AttributeId, CharacterId, HeldToken, Pose, ReconcileSnapshot, Tick,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::{Command, Control};

/// Encoded full-state sync plus the authority tick it was taken at.
///
/// A predicting peer starts numbering its own ticks after `tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncGrant {
    pub tick: Tick,
    pub message: Vec<u8>,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Hosts a new character and applies `loadout` to it.
    ///
    /// Returns the number of abilities crafted.
    pub async fn spawn(
        &self,
        character: CharacterId,
        root_seed: u64,
        pose: Pose,
        loadout: LoadoutSpec,
    ) -> Result<usize> {
        self.request(|reply| Command::Spawn {
            character,
            root_seed,
            pose,
            loadout: Box::new(loadout),
            reply,
        })
        .await?
    }

    pub async fn despawn(&self, character: CharacterId) -> Result<()> {
        self.request(|reply| Command::Despawn { character, reply })
            .await?
    }

    /// Hands an encoded wire message from a predicting peer to the authority.
    pub async fn deliver(&self, bytes: Vec<u8>) -> Result<()> {
        self.request(|reply| Command::Deliver { bytes, reply })
            .await?
    }

    /// Latches an activation request on an authority-driven character.
    pub async fn activate(
        &self,
        character: CharacterId,
        ability: AbilityId,
        held: Option<HeldToken>,
    ) -> Result<bool> {
        self.control(character, Control::Activate { ability, held })
            .await
    }

    pub async fn release(&self, character: CharacterId) -> Result<()> {
        self.control(character, Control::Release).await.map(drop)
    }

    pub async fn interrupt(&self, character: CharacterId) -> Result<()> {
        self.control(character, Control::Interrupt).await.map(drop)
    }

    pub async fn set_pose(&self, character: CharacterId, pose: Pose) -> Result<()> {
        self.control(character, Control::SetPose(pose))
            .await
            .map(drop)
    }

    /// Aims `character` at another hosted character, or clears its target.
    pub async fn set_target(
        &self,
        character: CharacterId,
        target: Option<CharacterId>,
    ) -> Result<()> {
        self.control(character, Control::SetTarget(target))
            .await
            .map(drop)
    }

    /// Applies an authority-side attribute change outside any ability.
    pub async fn apply_delta(
        &self,
        character: CharacterId,
        attribute: AttributeId,
        delta: i32,
    ) -> Result<bool> {
        self.control(character, Control::ApplyDelta { attribute, delta })
            .await
    }

    /// Encodes the full state of `character` for a peer that starts predicting it.
    pub async fn sync(&self, character: CharacterId) -> Result<SyncGrant> {
        self.request(|reply| Command::Sync { character, reply })
            .await?
    }

    /// Reconciliation snapshot of `character` at the current authority tick.
    pub async fn snapshot(&self, character: CharacterId) -> Result<ReconcileSnapshot> {
        self.request(|reply| Command::Snapshot { character, reply })
            .await?
    }

    /// Advances the authority by one tick and returns the tick just simulated.
    pub async fn tick(&self) -> Result<Tick> {
        self.request(|reply| Command::Tick { reply }).await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Replication` - Encoded snapshots for predicting peers
    /// - `Topic::Presentation` - Activation notices, hits, and deaths
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use ability_runtime::Topic;
    ///
    /// let mut snapshots = handle.subscribe(Topic::Replication);
    /// while let Ok(event) = snapshots.recv().await {
    ///     // Forward to the owning peer
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn control(&self, character: CharacterId, control: Control) -> Result<bool> {
        self.request(|reply| Command::Control {
            character,
            control,
            reply,
        })
        .await?
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
