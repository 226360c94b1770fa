//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use super::types::{PresentationEvent, ReplicationEvent};

/// Routing key for [`Event`]s.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Reconciliation snapshots for predicting peers
    Replication,
    /// Notices, hits, and deaths for presentation
    Presentation,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Replication, Topic::Presentation];
}

/// Anything the runtime publishes, tagged by topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Replication(ReplicationEvent),
    Presentation(PresentationEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Replication(_) => Topic::Replication,
            Event::Presentation(_) => Topic::Presentation,
        }
    }
}

/// Fan-out of runtime events, one broadcast channel per [`Topic`].
///
/// Clones share the same channels; a subscriber only hears its own topic.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<Event>>>>,
}

impl EventBus {
    /// Bus with room for 100 pending events per topic.
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(RwLock::new(channels)),
        }
    }

    /// Sends `event` on its topic. Never blocks; an event nobody hears is dropped.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        let Ok(channels) = self.channels.try_read() else {
            tracing::debug!(target: "runtime::events", ?topic, "event bus busy, event dropped");
            return;
        };
        if let Some(tx) = channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Receiver for one topic. Falls back to a closed receiver if the bus is busy.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.subscribe_multiple(&[topic])
            .remove(&topic)
            .unwrap_or_else(|| broadcast::channel(1).1)
    }

    /// Receivers for each of `topics`. Channels are only written at
    /// construction, so the read lock is uncontended in practice.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        let Ok(channels) = self.channels.try_read() else {
            tracing::debug!(target: "runtime::events", ?topics, "event bus busy, no receivers");
            return HashMap::new();
        };
        topics
            .iter()
            .filter_map(|&topic| channels.get(&topic).map(|tx| (topic, tx.subscribe())))
            .collect()
    }

    /// Live receivers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .try_read()
            .ok()
            .and_then(|channels| channels.get(&topic).map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{CharacterId, Tick};

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut replication = bus.subscribe(Topic::Replication);
        let mut presentation = bus.subscribe(Topic::Presentation);

        bus.publish(Event::Presentation(PresentationEvent::Died {
            character: CharacterId(4),
            tick: Tick(2),
        }));

        assert!(replication.try_recv().is_err());
        let event = presentation.recv().await.unwrap();
        assert_eq!(event.topic(), Topic::Presentation);
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(Event::Replication(ReplicationEvent::Snapshot {
            character: CharacterId(1),
            tick: Tick(3),
            message: vec![1, 3],
        }));
        assert_eq!(bus.subscriber_count(Topic::Replication), 0);

        let _presentation = bus.subscribe(Topic::Presentation);
        assert_eq!(bus.subscriber_count(Topic::Presentation), 1);
    }
}
