//! Versioned payloads exchanged between authority and predicting peers.
//!
//! Every message is framed as:
//!
//! ```text
//! [u8 SCHEMA_VERSION][u8 MessageKind][bincode body]
//! ```
//!
//! Bodies are plain structs with a fixed field order, so both sides stay in
//! lockstep as long as they agree on the version byte. Transport is out of
//! scope; callers move the bytes however they like.

use std::sync::Arc;

use crate::activation::{
    ActivationInput, CooldownEntry, CooldownService, CooldownTable, ReconcileSnapshot,
    SeedSequence,
};
use crate::attribute::AttributeGraph;
use crate::catalog::{AbilityCatalog, CatalogError};
use crate::error::{ErrorSeverity, SimError};
use crate::ids::{AbilityId, AttributeId, CharacterId, EventId, TemplateId};
use crate::sim::CharacterSim;

/// Bumped whenever any body layout changes.
pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    #[error("message shorter than its header")]
    Truncated,

    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl SimError for WireError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Truncated | Self::Codec(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::VersionMismatch { .. } => "WIRE_VERSION_MISMATCH",
            Self::Truncated => "WIRE_TRUNCATED",
            Self::UnknownKind(_) => "WIRE_UNKNOWN_KIND",
            Self::Codec(_) => "WIRE_CODEC",
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum MessageKind {
    Sync = 1,
    Input = 2,
    Snapshot = 3,
}

impl TryFrom<u8> for MessageKind {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sync),
            2 => Ok(Self::Input),
            3 => Ok(Self::Snapshot),
            other => Err(WireError::UnknownKind(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AbilityRecord {
    pub id: AbilityId,
    pub template: TemplateId,
    pub events: Vec<EventId>,
}

/// Authored inputs of one attribute; derived values are recomputed on apply.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributeRecord {
    pub id: AttributeId,
    pub base: i32,
    pub external_modifier: i32,
    pub current: Option<f32>,
}

/// One-time full state of a character, sent when a peer starts predicting it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacterSyncPayload {
    pub character: CharacterId,
    pub content_digest: [u8; 32],
    pub root_seed: u64,
    pub seed_cursor: u64,
    pub known_templates: Vec<TemplateId>,
    pub known_events: Vec<EventId>,
    pub abilities: Vec<AbilityRecord>,
    pub cooldowns: Vec<CooldownEntry>,
    pub attributes: Vec<AttributeRecord>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputMessage {
    pub character: CharacterId,
    pub input: ActivationInput,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotMessage {
    pub character: CharacterId,
    pub snapshot: ReconcileSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WireMessage {
    Sync(CharacterSyncPayload),
    Input(InputMessage),
    Snapshot(SnapshotMessage),
}

impl WireMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Sync(_) => MessageKind::Sync,
            Self::Input(_) => MessageKind::Input,
            Self::Snapshot(_) => MessageKind::Snapshot,
        }
    }

    pub fn character(&self) -> CharacterId {
        match self {
            Self::Sync(payload) => payload.character,
            Self::Input(message) => message.character,
            Self::Snapshot(message) => message.character,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut bytes = vec![SCHEMA_VERSION, self.kind() as u8];
        match self {
            Self::Sync(payload) => bincode::serialize_into(&mut bytes, payload)?,
            Self::Input(message) => bincode::serialize_into(&mut bytes, message)?,
            Self::Snapshot(message) => bincode::serialize_into(&mut bytes, message)?,
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let [version, kind, body @ ..] = bytes else {
            return Err(WireError::Truncated);
        };
        Self::check_version(*version)?;
        Ok(match MessageKind::try_from(*kind)? {
            MessageKind::Sync => Self::Sync(bincode::deserialize(body)?),
            MessageKind::Input => Self::Input(bincode::deserialize(body)?),
            MessageKind::Snapshot => Self::Snapshot(bincode::deserialize(body)?),
        })
    }

    /// Reads only the header; handlers use it to route before decoding.
    pub fn peek_kind(bytes: &[u8]) -> Result<MessageKind, WireError> {
        let [version, kind, ..] = bytes else {
            return Err(WireError::Truncated);
        };
        Self::check_version(*version)?;
        MessageKind::try_from(*kind)
    }

    fn check_version(found: u8) -> Result<(), WireError> {
        if found == SCHEMA_VERSION {
            Ok(())
        } else {
            Err(WireError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync payload was built from different content")]
    ContentMismatch,

    #[error("sync payload is for {found}, expected {expected}")]
    CharacterMismatch {
        expected: CharacterId,
        found: CharacterId,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SimError for SyncError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ContentMismatch => ErrorSeverity::Fatal,
            Self::CharacterMismatch { .. } => ErrorSeverity::Validation,
            Self::Catalog(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ContentMismatch => "SYNC_CONTENT_MISMATCH",
            Self::CharacterMismatch { .. } => "SYNC_CHARACTER_MISMATCH",
            Self::Catalog(error) => error.error_code(),
        }
    }
}

impl CharacterSim {
    pub fn sync_payload(&self) -> CharacterSyncPayload {
        let catalog = self.catalog();
        CharacterSyncPayload {
            character: self.id(),
            content_digest: self.registry().digest(),
            root_seed: self.seeds().root(),
            seed_cursor: self.seeds().cursor(),
            known_templates: catalog.known_templates().collect(),
            known_events: catalog.known_events().collect(),
            abilities: catalog
                .abilities()
                .map(|ability| AbilityRecord {
                    id: ability.id(),
                    template: ability.template_id(),
                    events: ability.event_ids(),
                })
                .collect(),
            cooldowns: self.cooldowns().entries(),
            attributes: self
                .attributes()
                .iter()
                .map(|node| {
                    let attribute = node.attribute();
                    AttributeRecord {
                        id: attribute.id(),
                        base: attribute.base(),
                        external_modifier: attribute.external_modifier(),
                        current: node.as_resource().map(|resource| resource.current()),
                    }
                })
                .collect(),
        }
    }

    /// Replaces catalog, attributes, cooldowns, and seeds with `payload`.
    ///
    /// Nothing changes unless the whole payload applies. Activation and effect
    /// state are reset; no observer is notified.
    pub fn apply_sync(&mut self, payload: &CharacterSyncPayload) -> Result<(), SyncError> {
        if payload.character != self.id() {
            return Err(SyncError::CharacterMismatch {
                expected: self.id(),
                found: payload.character,
            });
        }
        let registry = Arc::clone(self.registry());
        if payload.content_digest != registry.digest() {
            return Err(SyncError::ContentMismatch);
        }

        let mut catalog = AbilityCatalog::new();
        catalog.learn_base_abilities(
            &registry,
            payload.known_templates.iter().copied(),
            payload.known_events.iter().copied(),
        );
        for record in &payload.abilities {
            let ability = registry.instantiate(record.id, record.template, &record.events)?;
            catalog.learn_ability(ability);
        }

        let mut attributes = AttributeGraph::with_subset(
            Arc::clone(registry.attributes()),
            payload.attributes.iter().map(|record| record.id),
        );
        for record in &payload.attributes {
            attributes.set_base(record.id, record.base);
            attributes.set_modifier(record.id, record.external_modifier);
        }
        for record in &payload.attributes {
            if let Some(current) = record.current {
                attributes.set_current(record.id, current, false);
            }
        }
        attributes.drain_changes();

        let mut cooldowns = CooldownTable::new();
        cooldowns.restore(&payload.cooldowns);

        tracing::info!(
            target: "ability::sync",
            character = %payload.character,
            abilities = payload.abilities.len(),
            "full-state sync applied"
        );
        self.replace_state(
            attributes,
            catalog,
            cooldowns,
            SeedSequence::with_cursor(payload.root_seed, payload.seed_cursor),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::HeldToken;
    use crate::ids::Tick;

    #[test]
    fn rejects_wrong_version() {
        let message = WireMessage::Input(InputMessage {
            character: CharacterId(3),
            input: ActivationInput::idle(Tick(9)),
        });
        let mut bytes = message.encode().unwrap();
        bytes[0] = SCHEMA_VERSION + 1;
        assert!(matches!(
            WireMessage::decode(&bytes),
            Err(WireError::VersionMismatch { found, .. }) if found == SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn header_is_checked_before_body() {
        assert!(matches!(WireMessage::decode(&[SCHEMA_VERSION]), Err(WireError::Truncated)));
        assert!(matches!(
            WireMessage::peek_kind(&[SCHEMA_VERSION, 42]),
            Err(WireError::UnknownKind(42))
        ));
    }

    #[test]
    fn input_survives_encoding() {
        let message = WireMessage::Input(InputMessage {
            character: CharacterId(3),
            input: ActivationInput {
                tick: Tick(9),
                request: None,
                held: Some(HeldToken(2)),
                interrupt: true,
            },
        });
        let bytes = message.encode().unwrap();
        assert_eq!(WireMessage::peek_kind(&bytes).unwrap(), MessageKind::Input);
        assert_eq!(WireMessage::decode(&bytes).unwrap(), message);
    }
}
