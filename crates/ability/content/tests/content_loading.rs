use std::fs;
use std::sync::Arc;

use ability_content::{
    ContentBundle, ContentFactory, embedded_config, embedded_loadout, embedded_registry,
};
use ability_core::{
    AbilityId, AbilityTemplate, ActivationNotice, AttributeId, CharacterId, CharacterSim,
    NoticeLog, TemplateId,
};

const HEALTH: AttributeId = AttributeId(10);
const MANA: AttributeId = AttributeId(11);
const WARD: AttributeId = AttributeId(12);

#[test]
fn embedded_content_builds() {
    let registry = embedded_registry().expect("embedded content is valid");
    assert_eq!(registry.templates().count(), 5);
    assert_eq!(registry.events().count(), 11);
    assert_eq!(registry.attributes().len(), 9);
    assert_eq!(
        registry.digest(),
        embedded_registry().unwrap().digest(),
        "digest is stable across loads"
    );

    let config = embedded_config().unwrap();
    assert_eq!(config.tick_delta_ms, 50);
}

#[test]
fn loadout_crafts_starting_abilities() {
    let registry = Arc::new(embedded_registry().unwrap());
    let config = embedded_config().unwrap();
    let mut sim = CharacterSim::new(CharacterId(1), Arc::clone(&registry), config, 7);
    let mut log = NoticeLog::new();

    let crafted = embedded_loadout().unwrap().apply(&mut sim, &mut log).unwrap();
    assert_eq!(crafted, 5);
    assert_eq!(
        log.count(|notice| matches!(notice, ActivationNotice::AbilityAdded { .. })),
        5
    );

    // 100 base + 10 strength * 5; 20 base + 12 intellect * 3.
    assert_eq!(sim.attributes().final_value(HEALTH), Some(150));
    assert_eq!(sim.attributes().current(MANA), Some(56.0));
    // spell power 18 + 2 from strength steps, halved.
    assert_eq!(sim.attributes().final_value(WARD), Some(10));

    let split_fireball = sim.catalog().get(AbilityId(4)).unwrap();
    assert_eq!(split_fireball.template_id(), TemplateId(1));
    assert_eq!(split_fireball.resources().get(MANA), 45);
    assert_eq!(split_fireball.hooks().pre_spawn.len(), 1);
    assert_eq!(split_fireball.hooks().spawn.len(), 1);
    assert_eq!(split_fireball.hooks().destroy.len(), 1);

    let beam = sim.catalog().get(AbilityId(5)).unwrap();
    assert!(beam.is_channeled());
}

fn write_data_dir(attributes: &str, abilities: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("attributes.ron"), attributes).unwrap();
    fs::write(dir.path().join("abilities.ron"), abilities).unwrap();
    fs::write(dir.path().join("events.ron"), "(events: [])").unwrap();
    fs::write(dir.path().join("config.toml"), "tick_delta_ms = 25\n").unwrap();
    dir
}

#[test]
fn loads_from_directory_and_drops_dangling_costs() {
    let dir = write_data_dir(
        r#"(attributes: [(id: 1, name: "mana", initial_value: 40, resource: Some((regen_per_second: 0.0)))])"#,
        r#"(templates: [(id: 1, name: "zap", stats: (resources: {1: 5, 99: 3}))])"#,
    );
    let factory = ContentFactory::new(dir.path());

    let registry = factory.load_registry().unwrap();
    let zap = registry.template(TemplateId(1)).unwrap();
    assert_eq!(zap.stats.resources.len(), 1);
    assert_eq!(zap.stats.resources.get(AttributeId(1)), 5);

    assert_eq!(factory.load_config().unwrap().tick_delta_ms, 25);
    assert!(factory.load_loadout().unwrap().abilities.is_empty());
}

#[test]
fn attribute_cycle_fails_to_load() {
    let dir = write_data_dir(
        r#"(attributes: [
            (id: 1, name: "a", children: [(child: 2, formula: Linear(per_point: 1))]),
            (id: 2, name: "b", children: [(child: 1, formula: Linear(per_point: 1))]),
        ])"#,
        "(templates: [])",
    );
    let error = ContentFactory::new(dir.path()).load_registry().unwrap_err();
    assert!(error.to_string().contains("cycle"), "unexpected error: {error}");
}

#[test]
fn duplicate_templates_are_rejected() {
    let bundle = ContentBundle {
        templates: vec![
            AbilityTemplate::new(TemplateId(1), "a"),
            AbilityTemplate::new(TemplateId(1), "b"),
        ],
        ..ContentBundle::default()
    };
    assert!(bundle.into_registry().is_err());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let error = ContentFactory::new(dir.path()).load_bundle().unwrap_err();
    assert!(error.to_string().contains("attributes.ron"));
}
