use std::sync::Arc;
use std::time::Duration;

use ability_content::{embedded_config, embedded_loadout, embedded_registry};
use ability_core::wire::SnapshotMessage;
use ability_core::{
    AbilityId, AttributeId, CharacterId, ContentRegistry, MessageKind, Pose, ReconcileSnapshot,
    Tick, Vec2, WireMessage,
};
use ability_runtime::{
    Event, PredictionSession, PresentationEvent, ReplicationEvent, Runtime, RuntimeConfig,
    RuntimeError, Topic,
};
use tokio::sync::broadcast;

const HERO: CharacterId = CharacterId(1);
const DUMMY: CharacterId = CharacterId(2);
const FIREBALL: AbilityId = AbilityId(1);
const HEALTH: AttributeId = AttributeId(10);

fn content() -> (Arc<ContentRegistry>, RuntimeConfig) {
    let registry = Arc::new(embedded_registry().expect("embedded content is valid"));
    let config = RuntimeConfig {
        sim: embedded_config().expect("embedded config is valid"),
        ..RuntimeConfig::default()
    };
    (registry, config)
}

async fn runtime(registry: &Arc<ContentRegistry>, config: RuntimeConfig) -> Runtime {
    Runtime::builder()
        .config(config)
        .registry(Arc::clone(registry))
        .build()
        .await
        .expect("runtime builds")
}

fn at(x: f32) -> Pose {
    Pose::new(Vec2::new(x, 0.0), 0.0)
}

async fn next_snapshot(rx: &mut broadcast::Receiver<Event>) -> (Tick, Vec<u8>) {
    match rx.recv().await.expect("replication stream open") {
        Event::Replication(ReplicationEvent::Snapshot { tick, message, .. }) => (tick, message),
        other => panic!("unexpected event {other:?}"),
    }
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<PresentationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Presentation(event) = event {
            events.push(event);
        }
    }
    events
}

fn resource(snapshot: &ReconcileSnapshot, attribute: AttributeId) -> f32 {
    snapshot
        .resources
        .iter()
        .find(|(id, _)| *id == attribute)
        .map(|(_, value)| *value)
        .expect("resource is tracked")
}

#[tokio::test]
async fn predicting_peer_converges_with_authority() {
    let (registry, config) = content();
    let sim_config = config.sim.clone();
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();

    let crafted = handle
        .spawn(HERO, 0xfeed, at(0.0), embedded_loadout().unwrap())
        .await
        .unwrap();
    assert_eq!(crafted, 5);

    let mut replication = handle.subscribe(Topic::Replication);
    let grant = handle.sync(HERO).await.unwrap();
    assert_eq!(grant.tick, Tick::ZERO);
    let mut session = PredictionSession::from_sync(Arc::clone(&registry), sim_config, &grant).unwrap();

    assert!(session.activate(FIREBALL, None));
    for _ in 0..5 {
        let predicted = session.predict().unwrap();
        handle.deliver(predicted.message).await.unwrap();
    }
    assert_eq!(session.unconfirmed(), 5);

    for expected in 1..=3 {
        assert_eq!(handle.tick().await.unwrap(), Tick(expected));
    }
    let (tick, message) = next_snapshot(&mut replication).await;
    assert_eq!(tick, Tick(3));
    assert_eq!(session.receive(&message).unwrap(), Some(2));
    assert_eq!(session.confirmed(), Some(Tick(3)));

    handle.tick().await.unwrap();
    handle.tick().await.unwrap();
    let authority = handle.snapshot(HERO).await.unwrap();
    assert_eq!(authority.current_ability, Some(FIREBALL));
    assert_eq!(authority, session.sim().snapshot(Tick(5)));

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn authority_correction_overrides_prediction() {
    let (registry, config) = content();
    let sim_config = config.sim.clone();
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();
    handle
        .spawn(HERO, 3, at(0.0), embedded_loadout().unwrap())
        .await
        .unwrap();

    let grant = handle.sync(HERO).await.unwrap();
    let mut session = PredictionSession::from_sync(Arc::clone(&registry), sim_config, &grant).unwrap();
    let mut replication = handle.subscribe(Topic::Replication);

    for _ in 0..4 {
        let predicted = session.predict().unwrap();
        handle.deliver(predicted.message).await.unwrap();
    }
    // The peer never sees this.
    assert!(handle.apply_delta(HERO, HEALTH, -60).await.unwrap());
    for _ in 0..3 {
        handle.tick().await.unwrap();
    }

    let (_, message) = next_snapshot(&mut replication).await;
    let before = resource(&session.sim().snapshot(Tick(4)), HEALTH);
    assert_eq!(session.receive(&message).unwrap(), Some(1));
    let after = resource(&session.sim().snapshot(Tick(4)), HEALTH);
    assert!(after < before - 50.0, "health {before} -> {after}");

    handle.tick().await.unwrap();
    assert_eq!(handle.snapshot(HERO).await.unwrap(), session.sim().snapshot(Tick(4)));
    // A replayed snapshot is ignored.
    assert_eq!(session.receive(&message).unwrap(), None);
}

#[tokio::test]
async fn fireball_strikes_its_target() {
    let (registry, mut config) = content();
    config.vital_attribute = Some(HEALTH);
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();
    let loadout = embedded_loadout().unwrap();
    handle.spawn(HERO, 11, at(0.0), loadout.clone()).await.unwrap();
    handle.spawn(DUMMY, 12, at(6.0), loadout).await.unwrap();
    handle.set_target(HERO, Some(DUMMY)).await.unwrap();

    let mut presentation = handle.subscribe(Topic::Presentation);
    assert!(handle.activate(HERO, FIREBALL, None).await.unwrap());

    let mut events = Vec::new();
    for _ in 0..40 {
        handle.tick().await.unwrap();
        events.extend(drain(&mut presentation));
    }

    let hits: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            PresentationEvent::Hit { hit, .. } => Some(*hit),
            _ => None,
        })
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, HERO);
    assert_eq!(hits[0].target, DUMMY);
    assert_eq!(hits[0].delta, -18);
    assert!(events.iter().any(|event| matches!(
        event,
        PresentationEvent::Notice { character: HERO, .. }
    )));

    let dummy = handle.snapshot(DUMMY).await.unwrap();
    assert!(resource(&dummy, HEALTH) < 150.0);
}

#[tokio::test]
async fn depleted_vitals_kill_once() {
    let (registry, mut config) = content();
    config.vital_attribute = Some(HEALTH);
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();
    handle
        .spawn(DUMMY, 1, at(0.0), embedded_loadout().unwrap())
        .await
        .unwrap();
    let mut presentation = handle.subscribe(Topic::Presentation);

    handle.apply_delta(DUMMY, HEALTH, -1000).await.unwrap();
    handle.tick().await.unwrap();
    handle.tick().await.unwrap();

    let deaths = drain(&mut presentation)
        .into_iter()
        .filter(|event| matches!(event, PresentationEvent::Died { character: DUMMY, .. }))
        .count();
    assert_eq!(deaths, 1);

    // The dead caster's request is latched but never starts.
    handle.activate(DUMMY, FIREBALL, None).await.unwrap();
    handle.tick().await.unwrap();
    assert_eq!(handle.snapshot(DUMMY).await.unwrap().current_ability, None);
}

#[tokio::test]
async fn authority_rejects_foreign_messages() {
    let (registry, config) = content();
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();
    handle
        .spawn(HERO, 1, at(0.0), embedded_loadout().unwrap())
        .await
        .unwrap();

    let snapshot = WireMessage::Snapshot(SnapshotMessage {
        character: HERO,
        snapshot: ReconcileSnapshot::default(),
    })
    .encode()
    .unwrap();
    assert!(matches!(
        handle.deliver(snapshot).await,
        Err(RuntimeError::UnexpectedMessage {
            kind: MessageKind::Snapshot
        })
    ));
    assert!(matches!(
        handle.deliver(vec![0xff, 2]).await,
        Err(RuntimeError::Wire(_))
    ));
    assert!(matches!(
        handle.sync(DUMMY).await,
        Err(RuntimeError::UnknownCharacter(DUMMY))
    ));
    assert!(matches!(
        handle
            .spawn(HERO, 1, at(0.0), embedded_loadout().unwrap())
            .await,
        Err(RuntimeError::DuplicateCharacter(HERO))
    ));
    assert!(matches!(
        handle.set_target(HERO, Some(DUMMY)).await,
        Err(RuntimeError::UnknownCharacter(DUMMY))
    ));
}

#[tokio::test(start_paused = true)]
async fn interval_drives_ticks() {
    let (registry, mut config) = content();
    config.tick_interval = Some(Duration::from_millis(u64::from(config.sim.tick_delta_ms)));
    let runtime = runtime(&registry, config).await;
    let handle = runtime.handle();
    let mut replication = handle.subscribe(Topic::Replication);
    handle
        .spawn(HERO, 1, at(0.0), embedded_loadout().unwrap())
        .await
        .unwrap();

    let (first, _) = next_snapshot(&mut replication).await;
    let (second, _) = next_snapshot(&mut replication).await;
    assert_eq!(second.0 - first.0, 3);
}

#[tokio::test]
async fn builder_requires_content() {
    assert!(matches!(
        Runtime::builder().build().await,
        Err(RuntimeError::MissingRegistry)
    ));
}
