//! Owning-peer side of replication: predict locally, reconcile on snapshots.

use std::sync::Arc;

use ability_core::wire::InputMessage;
use ability_core::{
    AbilityId, ActivationNotice, CharacterId, CharacterSim, ContentRegistry, FixedTargets,
    HeldToken, NoticeLog, Pose, PredictionBuffer, ReconcileSnapshot, SimConfig,
    StaticCharacterState, TargetInfo, Tick, TickEnv, TickMode, TickReport, WireMessage,
};

use crate::api::{Result, RuntimeError, SyncGrant};

/// Outcome of one locally predicted tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicted {
    pub report: TickReport,
    /// Encoded input to forward to the authority.
    pub message: Vec<u8>,
}

/// A character simulated ahead of the authority by the peer that controls it.
pub struct PredictionSession {
    sim: CharacterSim,
    buffer: PredictionBuffer,
    state: StaticCharacterState,
    targets: FixedTargets,
    log: NoticeLog,
    tick: Tick,
}

impl PredictionSession {
    /// Starts predicting `sim`; the first predicted tick is `tick + 1`.
    pub fn new(sim: CharacterSim, tick: Tick) -> Self {
        let buffer = PredictionBuffer::new(sim.config().max_replay_ticks);
        Self {
            sim,
            buffer,
            state: StaticCharacterState::default(),
            targets: FixedTargets::default(),
            log: NoticeLog::new(),
            tick,
        }
    }

    /// Builds a session from a full-state sync issued by the authority.
    pub fn from_sync(
        registry: Arc<ContentRegistry>,
        config: SimConfig,
        grant: &SyncGrant,
    ) -> Result<Self> {
        let payload = match WireMessage::decode(&grant.message)? {
            WireMessage::Sync(payload) => payload,
            other => return Err(RuntimeError::UnexpectedMessage { kind: other.kind() }),
        };
        let mut sim = CharacterSim::new(payload.character, registry, config, payload.root_seed);
        sim.apply_sync(&payload)?;
        Ok(Self::new(sim, grant.tick))
    }

    pub fn character(&self) -> CharacterId {
        self.sim.id()
    }

    pub fn sim(&self) -> &CharacterSim {
        &self.sim
    }

    /// Last tick predicted (or confirmed, if the authority is ahead).
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Inputs not yet confirmed by a snapshot.
    pub fn unconfirmed(&self) -> usize {
        self.buffer.len()
    }

    pub fn confirmed(&self) -> Option<Tick> {
        self.buffer.confirmed()
    }

    pub fn drain_notices(&mut self) -> Vec<ActivationNotice> {
        self.log.drain()
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.targets.pose = pose;
    }

    pub fn set_target(&mut self, target: Option<TargetInfo>) {
        self.targets.target = target;
    }

    pub fn set_state(&mut self, state: StaticCharacterState) {
        self.state = state;
    }

    pub fn activate(&mut self, ability: AbilityId, held: Option<HeldToken>) -> bool {
        self.sim.activate(ability, held)
    }

    pub fn hold(&mut self, token: HeldToken) {
        self.sim.hold(token);
    }

    pub fn release(&mut self) {
        self.sim.release();
    }

    pub fn interrupt(&mut self) {
        self.sim.interrupt();
    }

    /// Runs the next tick locally and records its input for replay.
    pub fn predict(&mut self) -> Result<Predicted> {
        let tick = self.tick.next();
        self.tick = tick;

        let input = self.sim.next_input(tick);
        self.buffer.record(input);
        let mut env = TickEnv {
            character: &self.state,
            targets: &self.targets,
            observer: &mut self.log,
        };
        let report = self.sim.tick(&input, TickMode::Fresh, &mut env);

        let message = WireMessage::Input(InputMessage {
            character: self.sim.id(),
            input,
        })
        .encode()?;
        Ok(Predicted { report, message })
    }

    /// Applies an encoded authority message.
    ///
    /// Returns the number of replayed ticks when a newer snapshot was applied.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<Option<usize>> {
        match WireMessage::decode(bytes)? {
            WireMessage::Snapshot(message) => {
                if message.character != self.sim.id() {
                    return Err(RuntimeError::UnknownCharacter(message.character));
                }
                Ok(self.reconcile(&message.snapshot))
            }
            WireMessage::Sync(payload) => {
                self.sim.apply_sync(&payload)?;
                self.buffer = PredictionBuffer::new(self.sim.config().max_replay_ticks);
                Ok(None)
            }
            other => Err(RuntimeError::UnexpectedMessage { kind: other.kind() }),
        }
    }

    pub fn reconcile(&mut self, snapshot: &ReconcileSnapshot) -> Option<usize> {
        let mut env = TickEnv {
            character: &self.state,
            targets: &self.targets,
            observer: &mut self.log,
        };
        let replayed = self.sim.reconcile(snapshot, &mut self.buffer, &mut env)?;
        if snapshot.tick > self.tick {
            self.tick = snapshot.tick;
        }
        Some(replayed)
    }
}
