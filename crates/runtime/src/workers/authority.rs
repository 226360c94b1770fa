//! Authority worker that owns every hosted [`ability_core::CharacterSim`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), advances
//! the arena one tick at a time, runs post-tick handlers, and publishes
//! presentation events and reconciliation snapshots to the EventBus.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use ability_content::LoadoutSpec;
use ability_core::wire::SnapshotMessage;
use ability_core::{
    AbilityId, AttributeId, CharacterId, CharacterSim, ContentRegistry, EffectOutput, HeldToken,
    NoticeLog, Pose, ReconcileSnapshot, Tick, WireMessage,
};

use crate::api::{Result, RuntimeError, SyncGrant};
use crate::arena::{Arena, Participant};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, PresentationEvent, ReplicationEvent, Topic};
use crate::handlers::{HandlerRegistry, TickContext, TickHandler, VitalsHandler};

/// Per-character adjustments that do not advance the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Activate {
        ability: AbilityId,
        held: Option<HeldToken>,
    },
    Hold(HeldToken),
    Release,
    Interrupt,
    SetPose(Pose),
    SetTarget(Option<CharacterId>),
    ApplyDelta {
        attribute: AttributeId,
        delta: i32,
    },
}

/// Commands that can be sent to the authority worker
pub enum Command {
    Spawn {
        character: CharacterId,
        root_seed: u64,
        pose: Pose,
        loadout: Box<LoadoutSpec>,
        reply: oneshot::Sender<Result<usize>>,
    },
    Despawn {
        character: CharacterId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Encoded wire message from a predicting peer.
    Deliver {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Result<()>>,
    },
    Control {
        character: CharacterId,
        control: Control,
        reply: oneshot::Sender<Result<bool>>,
    },
    Sync {
        character: CharacterId,
        reply: oneshot::Sender<Result<SyncGrant>>,
    },
    Snapshot {
        character: CharacterId,
        reply: oneshot::Sender<Result<ReconcileSnapshot>>,
    },
    Tick {
        reply: oneshot::Sender<Result<Tick>>,
    },
}

/// Background task that advances the authoritative simulations.
pub struct AuthorityWorker {
    registry: Arc<ContentRegistry>,
    config: RuntimeConfig,
    arena: Arena,
    handlers: HandlerRegistry,
    tick: Tick,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl AuthorityWorker {
    pub fn new(
        registry: Arc<ContentRegistry>,
        config: RuntimeConfig,
        handlers: HandlerRegistry,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::authority",
            tick_delta_ms = config.sim.tick_delta_ms,
            reconcile_interval = config.sim.reconcile_interval,
            handlers = ?handlers.names(),
            "AuthorityWorker initialized"
        );

        Self {
            registry,
            config,
            arena: Arena::new(ability_core::SimConfig::MAX_CHARACTERS),
            handlers,
            tick: Tick::ZERO,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop. Exits once every handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = self.config.tick_interval.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = next_tick(&mut ticker), if ticker.is_some() => {
                    if let Err(error) = self.advance() {
                        warn!(target: "runtime::authority", error = %error, "tick failed");
                    }
                }
            }
        }
        debug!(target: "runtime::authority", tick = %self.tick, "AuthorityWorker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Spawn {
                character,
                root_seed,
                pose,
                loadout,
                reply,
            } => {
                let result = self.spawn(character, root_seed, pose, &loadout);
                respond("spawn", reply, result);
            }
            Command::Despawn { character, reply } => {
                let result = self
                    .arena
                    .remove(character)
                    .map(drop)
                    .ok_or(RuntimeError::UnknownCharacter(character));
                respond("despawn", reply, result);
            }
            Command::Deliver { bytes, reply } => {
                let result = self.deliver(&bytes);
                respond("deliver", reply, result);
            }
            Command::Control {
                character,
                control,
                reply,
            } => {
                let result = self.control(character, control);
                respond("control", reply, result);
            }
            Command::Sync { character, reply } => respond("sync", reply, self.sync(character)),
            Command::Snapshot { character, reply } => {
                let result = self
                    .arena
                    .get(character)
                    .map(|participant| participant.sim().snapshot(self.tick))
                    .ok_or(RuntimeError::UnknownCharacter(character));
                respond("snapshot", reply, result);
            }
            Command::Tick { reply } => respond("tick", reply, self.advance()),
        }
    }

    fn spawn(
        &mut self,
        character: CharacterId,
        root_seed: u64,
        pose: Pose,
        loadout: &LoadoutSpec,
    ) -> Result<usize> {
        if self.arena.contains(character) {
            return Err(RuntimeError::DuplicateCharacter(character));
        }
        let mut sim = CharacterSim::new(
            character,
            Arc::clone(&self.registry),
            self.config.sim.clone(),
            root_seed,
        );
        let mut log = NoticeLog::new();
        let crafted = loadout.apply(&mut sim, &mut log)?;
        self.arena.insert(Participant::new(sim, pose))?;

        info!(
            target: "runtime::authority",
            character = %character,
            crafted,
            "character spawned"
        );
        let tick = self.tick;
        self.publish_notices(character, tick, log);
        Ok(crafted)
    }

    fn deliver(&mut self, bytes: &[u8]) -> Result<()> {
        match WireMessage::decode(bytes)? {
            WireMessage::Input(message) => {
                let simulated = self.tick;
                let participant = self.arena.require_mut(message.character)?;
                if !participant.queue_input(message.input, simulated) {
                    warn!(
                        target: "runtime::authority",
                        character = %message.character,
                        input_tick = %message.input.tick,
                        simulated = %simulated,
                        "late input dropped"
                    );
                }
                Ok(())
            }
            other => Err(RuntimeError::UnexpectedMessage { kind: other.kind() }),
        }
    }

    fn control(&mut self, character: CharacterId, control: Control) -> Result<bool> {
        if let Control::SetTarget(Some(target)) = control
            && !self.arena.contains(target)
        {
            return Err(RuntimeError::UnknownCharacter(target));
        }
        let participant = self.arena.require_mut(character)?;
        let applied = match control {
            Control::Activate { ability, held } => participant.sim_mut().activate(ability, held),
            Control::Hold(token) => {
                participant.sim_mut().hold(token);
                true
            }
            Control::Release => {
                participant.sim_mut().release();
                true
            }
            Control::Interrupt => {
                participant.sim_mut().interrupt();
                true
            }
            Control::SetPose(pose) => {
                participant.pose = pose;
                true
            }
            Control::SetTarget(target) => {
                participant.target = target;
                true
            }
            Control::ApplyDelta { attribute, delta } => {
                participant.sim_mut().apply_delta(attribute, delta)
            }
        };
        if applied && matches!(control, Control::ApplyDelta { .. }) {
            self.settle_vitals();
        }
        Ok(applied)
    }

    /// Deaths caused outside the tick are recorded at the current tick.
    fn settle_vitals(&mut self) {
        let mut output = EffectOutput::default();
        let mut events = Vec::new();
        let mut cx = TickContext {
            tick: self.tick,
            config: &self.config,
            arena: &mut self.arena,
            output: &mut output,
            events: &mut events,
        };
        if let Err(error) = VitalsHandler.handle(&mut cx) {
            debug!(target: "runtime::authority", error = %error, "vitals check failed");
        }
        for event in events {
            self.event_bus.publish(Event::Presentation(event));
        }
    }

    fn sync(&self, character: CharacterId) -> Result<SyncGrant> {
        let participant = self
            .arena
            .get(character)
            .ok_or(RuntimeError::UnknownCharacter(character))?;
        let message = WireMessage::Sync(participant.sim().sync_payload()).encode()?;
        Ok(SyncGrant {
            tick: self.tick,
            message,
        })
    }

    /// Steps every character, settles cross-character output, and publishes.
    fn advance(&mut self) -> Result<Tick> {
        let tick = self.tick.next();
        self.tick = tick;

        let mut output = EffectOutput::default();
        let mut logs = Vec::with_capacity(self.arena.len());
        for id in self.arena.ids() {
            let targets = self.arena.targets_for(id);
            let Some(participant) = self.arena.get_mut(id) else {
                continue;
            };
            let mut log = NoticeLog::new();
            let report = participant.step(tick, &targets, &mut log);
            output.extend(report.effects);
            logs.push((id, log));
        }
        for (id, log) in logs {
            self.publish_notices(id, tick, log);
        }

        let mut events = Vec::new();
        let handled = self.handlers.run(&mut TickContext {
            tick,
            config: &self.config,
            arena: &mut self.arena,
            output: &mut output,
            events: &mut events,
        });
        for event in events {
            self.event_bus.publish(Event::Presentation(event));
        }
        handled.map_err(|(name, source)| RuntimeError::Handler { name, source })?;

        if tick.is_multiple_of(u64::from(self.config.sim.reconcile_interval)) {
            self.publish_snapshots(tick)?;
        }
        Ok(tick)
    }

    fn publish_snapshots(&self, tick: Tick) -> Result<()> {
        if self.event_bus.subscriber_count(Topic::Replication) == 0 {
            return Ok(());
        }
        for participant in self.arena.iter() {
            let character = participant.id();
            let message = WireMessage::Snapshot(SnapshotMessage {
                character,
                snapshot: participant.sim().snapshot(tick),
            })
            .encode()?;
            self.event_bus
                .publish(Event::Replication(ReplicationEvent::Snapshot {
                    character,
                    tick,
                    message,
                }));
        }
        Ok(())
    }

    fn publish_notices(&self, character: CharacterId, tick: Tick, mut log: NoticeLog) {
        for notice in log.drain() {
            self.event_bus
                .publish(Event::Presentation(PresentationEvent::Notice {
                    character,
                    tick,
                    notice,
                }));
        }
    }
}

fn respond<T>(command: &'static str, reply: oneshot::Sender<T>, result: T) {
    if reply.send(result).is_err() {
        debug!(target: "runtime::authority", command, "reply channel closed (caller dropped)");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
