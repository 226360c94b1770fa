//! Scripted duel: a predicting hero casts at an authority-driven dummy.
use std::collections::BTreeMap;
use std::sync::Arc;

use ability_core::{
    AbilityId, ActivationNotice, ActivationPhase, CharacterId, Pose, TargetInfo, Tick, Vec2,
};
use ability_runtime::{
    Event, PredictionSession, PresentationEvent, ReplicationEvent, Runtime, RuntimeConfig,
    RuntimeHandle, Topic,
};
use anyhow::Result;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::CliConfig;
use crate::content::DuelContent;

const HERO: CharacterId = CharacterId(1);
const DUMMY: CharacterId = CharacterId(2);
const HERO_POSE: Pose = Pose::new(Vec2::new(0.0, 0.0), 0.0);
const DUMMY_POSE: Pose = Pose::new(Vec2::new(6.0, 0.0), 180.0);

/// Abilities the hero cycles through while idle.
const ROTATION: [AbilityId; 3] = [AbilityId(4), AbilityId(1), AbilityId(3)];
/// Minimum ticks between two activation requests.
const REQUEST_SPACING: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SpawnRecord {
    pub tick: u64,
    pub ability: u64,
    pub members: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct DuelReport {
    pub content_digest: String,
    pub ticks: u64,
    pub spawns: Vec<SpawnRecord>,
    pub hits: usize,
    pub damage: i64,
    pub dummy_died_at: Option<u64>,
    pub snapshots_applied: usize,
    pub replayed_ticks: usize,
    /// Authority and predicted hero agree once the peer stops running ahead.
    pub converged: bool,
    pub hero_resources: BTreeMap<String, f32>,
}

impl DuelReport {
    fn record(&mut self, event: PresentationEvent) {
        match event {
            PresentationEvent::Notice {
                character: HERO,
                tick,
                notice:
                    ActivationNotice::EffectSpawned {
                        ability, members, ..
                    },
            } => self.spawns.push(SpawnRecord {
                tick: tick.0,
                ability: ability.0,
                members,
            }),
            PresentationEvent::Hit { hit, .. } if hit.source == HERO => {
                self.hits += 1;
                self.damage -= i64::from(hit.delta.min(0));
            }
            PresentationEvent::Died {
                character: DUMMY,
                tick,
            } => {
                self.dummy_died_at.get_or_insert(tick.0);
            }
            _ => {}
        }
    }
}

pub async fn run(config: &CliConfig, content: DuelContent) -> Result<DuelReport> {
    let DuelContent {
        registry,
        sim,
        loadout,
        vital,
    } = content;

    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            sim: sim.clone(),
            vital_attribute: vital,
            ..RuntimeConfig::default()
        })
        .registry(Arc::clone(&registry))
        .build()
        .await?;
    let handle = runtime.handle();
    let mut replication = handle.subscribe(Topic::Replication);
    let mut presentation = handle.subscribe(Topic::Presentation);

    handle.spawn(HERO, config.seed, HERO_POSE, loadout.clone()).await?;
    handle
        .spawn(DUMMY, config.seed.rotate_left(32), DUMMY_POSE, loadout)
        .await?;
    handle.set_target(HERO, Some(DUMMY)).await?;

    let grant = handle.sync(HERO).await?;
    let mut session = PredictionSession::from_sync(Arc::clone(&registry), sim, &grant)?;
    session.set_pose(HERO_POSE);
    session.set_target(Some(TargetInfo {
        character: DUMMY,
        position: DUMMY_POSE.position,
    }));

    let mut report = DuelReport {
        content_digest: registry.digest().iter().map(|b| format!("{b:02x}")).collect(),
        ..DuelReport::default()
    };
    let mut rotation = ROTATION.iter().copied().cycle();
    let mut next_request = Tick::ZERO;
    let mut authority = grant.tick;

    for _ in 0..config.ticks {
        while session.tick() < authority + (1 + config.lead) {
            if session.sim().phase() == ActivationPhase::Idle
                && session.tick() >= next_request
                && let Some(ability) = rotation.next()
                && session.activate(ability, None)
            {
                next_request = session.tick() + REQUEST_SPACING;
            }
            let predicted = session.predict()?;
            handle.deliver(predicted.message).await?;
        }

        authority = handle.tick().await?;
        settle(&mut replication, &mut presentation, &mut session, &mut report)?;
    }

    // Let the authority catch up with everything already predicted.
    while authority < session.tick() {
        authority = handle.tick().await?;
        settle(&mut replication, &mut presentation, &mut session, &mut report)?;
    }

    report.ticks = authority.0;
    report.converged = handle.snapshot(HERO).await? == session.sim().snapshot(authority);
    report.hero_resources = resources(&handle, &registry).await?;
    tracing::info!(
        ticks = report.ticks,
        hits = report.hits,
        converged = report.converged,
        "duel finished"
    );

    drop(handle);
    runtime.shutdown().await?;
    Ok(report)
}

/// Handles every event already queued on `rx`.
fn pump(
    rx: &mut broadcast::Receiver<Event>,
    mut on_event: impl FnMut(Event) -> Result<()>,
) -> Result<()> {
    loop {
        match rx.try_recv() {
            Ok(event) => on_event(event)?,
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event stream lagged");
            }
            Err(_) => return Ok(()),
        }
    }
}

/// Feeds pending authority output to the peer and the report.
fn settle(
    replication: &mut broadcast::Receiver<Event>,
    presentation: &mut broadcast::Receiver<Event>,
    session: &mut PredictionSession,
    report: &mut DuelReport,
) -> Result<()> {
    pump(replication, |event| {
        if let Event::Replication(ReplicationEvent::Snapshot {
            character, message, ..
        }) = event
            && character == session.character()
            && let Some(replayed) = session.receive(&message)?
        {
            report.snapshots_applied += 1;
            report.replayed_ticks += replayed;
        }
        Ok(())
    })?;
    pump(presentation, |event| {
        if let Event::Presentation(event) = event {
            report.record(event);
        }
        Ok(())
    })
}

async fn resources(
    handle: &RuntimeHandle,
    registry: &ability_core::ContentRegistry,
) -> Result<BTreeMap<String, f32>> {
    let snapshot = handle.snapshot(HERO).await?;
    Ok(snapshot
        .resources
        .into_iter()
        .map(|(id, current)| {
            let name = registry
                .attributes()
                .template(id)
                .map_or_else(|| id.to_string(), |template| template.name.clone());
            (name, current)
        })
        .collect())
}
