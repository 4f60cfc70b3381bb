mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use common::build_test_world;
use gang_sim::db::snapshot::{TERRITORIES_KEY, load_part};
use gang_sim::db::{MemoryCache, MemoryLedger};
use gang_sim::model::*;
use gang_sim::sim::NewEvent;
use gang_sim::{ManualClock, SimConfig, Signal, WorldError, WorldService};

fn raid_at(x: f64, y: f64, radius: f64, minutes: u32) -> NewEvent {
    NewEvent {
        kind: WorldEventKind::PoliceRaid,
        location: EventLocation { x, y, z: 0.0, radius },
        severity: Severity::Medium,
        duration_minutes: minutes,
        affected_factions: BTreeSet::new(),
        description: None,
    }
}

// -- Territories -------------------------------------------------------------

#[test]
fn position_lookup_includes_min_edges_and_excludes_max_edges() {
    let world = build_test_world();

    let expectations: [((f64, f64), Option<&str>); 10] = [
        ((0.0, 0.0), Some("docks")),
        ((50.0, 50.0), Some("docks")),
        ((99.9, 99.9), Some("docks")),
        ((100.0, 50.0), None),
        ((50.0, 100.0), None),
        ((-0.1, 0.0), None),
        ((150.0, 50.0), None),
        ((200.0, 0.0), Some("alley")),
        ((300.0, 50.0), None),
        ((250.0, 100.0), None),
    ];
    for ((x, y), expected) in expectations {
        let found = world.service.get_territory_at_position(x, y).map(|t| t.id);
        assert_eq!(found.as_deref(), expected, "point ({x}, {y})");
    }
}

#[tokio::test]
async fn shared_seed_edge_resolves_to_the_territory_it_starts() {
    let service = WorldService::start(
        SimConfig::default(),
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryLedger::new()),
        Arc::new(ManualClock::new(common::start_time())),
    )
    .await;

    // downtown ends at y = 0 where vinewood begins
    assert_eq!(service.get_territory_at_position(0.0, 0.0).unwrap().id, "vinewood");
    assert_eq!(service.get_territory_at_position(0.0, -1.0).unwrap().id, "downtown");
    assert!(service.get_territory_at_position(500.0, -500.0).is_none());
}

#[tokio::test]
async fn strategic_territory_changing_hands_becomes_contested() {
    let world = build_test_world();
    let mut signals = world.service.subscribe();

    let docks = world.service.update_territory_control("docks", "ballas").await.unwrap();

    assert!(docks.contested);
    assert_eq!(docks.controlling_faction.as_deref(), Some("ballas"));
    assert!(world.service.is_in_contested_territory(10.0, 10.0));
    assert!(matches!(
        signals.try_recv().unwrap(),
        Signal::TerritoryControlChanged { ref previous_faction, .. } if previous_faction.as_deref() == Some("families")
    ));

    let cached: Vec<Territory> = load_part(&*world.cache, TERRITORIES_KEY).await.unwrap().unwrap();
    assert!(cached.iter().any(|t| t.id == "docks" && t.contested));

    let holdings = world.service.get_territories_controlled_by("ballas");
    assert_eq!(holdings.len(), 1);
    assert!(world.service.get_territories_controlled_by("families").is_empty());
}

#[tokio::test]
async fn ordinary_territory_is_never_contested_by_a_handover() {
    let world = build_test_world();

    let alley = world.service.update_territory_control("alley", "vagos").await.unwrap();
    assert!(!alley.contested);
    assert!(!world.service.is_in_contested_territory(250.0, 50.0));
}

#[tokio::test]
async fn control_update_survives_cache_outage() {
    let world = build_test_world();
    world.cache.set_offline(true);

    let docks = world.service.update_territory_control("docks", "ballas").await.unwrap();
    assert_eq!(docks.controlling_faction.as_deref(), Some("ballas"));
    assert_eq!(
        world.service.get_territory("docks").unwrap().controlling_faction.as_deref(),
        Some("ballas")
    );
}

#[tokio::test]
async fn unknown_territory_is_an_error() {
    let world = build_test_world();

    let err = world.service.update_territory_control("nowhere", "ballas").await.unwrap_err();
    assert_eq!(err, WorldError::TerritoryNotFound("nowhere".to_string()));
    assert_eq!(err.to_string(), "Territory not found: nowhere");
}

// -- Events ------------------------------------------------------------------

#[test]
fn expiry_sweep_removes_only_past_events() {
    let world = build_test_world();
    let short = world.service.create_event(raid_at(0.0, 0.0, 10.0, 30));
    let long = world.service.create_event(raid_at(0.0, 0.0, 10.0, 240));
    let mut signals = world.service.subscribe();

    world.clock.advance(Duration::minutes(31));
    let removed = world.service.process_active_events();

    assert_eq!(removed, vec![short.id]);
    let remaining: Vec<u64> = world.service.get_active_events().iter().map(|e| e.id).collect();
    assert_eq!(remaining, vec![long.id]);

    let expired: Vec<Signal> = std::iter::from_fn(|| signals.try_recv().ok()).collect();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].name(), "eventExpired");
}

#[test]
fn event_expiring_now_survives_the_sweep() {
    let world = build_test_world();
    world.service.create_event(raid_at(0.0, 0.0, 10.0, 30));

    world.clock.advance(Duration::minutes(30));
    assert!(world.service.process_active_events().is_empty());
}

#[test]
fn location_query_is_planar() {
    let world = build_test_world();
    let mut raid = raid_at(100.0, 100.0, 50.0, 60);
    raid.location.z = 500.0;
    let event = world.service.create_event(raid);

    // z is not part of the distance check
    let hits = world.service.get_events_at_location(130.0, 140.0, 0.0);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, event.id);

    assert!(world.service.get_events_at_location(151.0, 100.0, 500.0).is_empty());
}

#[test]
fn faction_conflict_marks_territory_and_covers_it() {
    let world = build_test_world();

    let event = world.service.trigger_faction_conflict("ballas", "families", "docks").unwrap();

    assert_eq!(event.kind, WorldEventKind::FactionWar);
    assert_eq!(event.severity, Severity::Critical);
    assert!(event.affected_factions.contains("ballas"));
    assert!(event.affected_factions.contains("families"));
    assert!(world.service.get_territory("docks").unwrap().contested);
    assert_eq!(event.duration_minutes, 240);
    assert_eq!(world.service.get_events_at_location(2.0, 2.0, 0.0).len(), 1);
    assert_eq!(world.service.get_events_at_location(98.0, 98.0, 0.0).len(), 1);
    assert!(world.service.get_events_at_location(250.0, 50.0, 0.0).is_empty());
}

// -- Economy -----------------------------------------------------------------

#[test]
fn economic_patch_changes_only_named_fields() {
    let world = build_test_world();
    let before = world.service.get_economic_state().unwrap();

    assert!(world.service.update_economic_state(EconomicPatch {
        law_enforcement_activity: Some(60.0),
        ..EconomicPatch::default()
    }));

    let after = world.service.get_economic_state().unwrap();
    assert_eq!(after.law_enforcement_activity, 60.0);
    assert_eq!(after.business_activity, before.business_activity);
    assert_eq!(after.tourist_activity, before.tourist_activity);
    assert_eq!(after.weapon_availability, before.weapon_availability);
    assert_eq!(after.drug_prices, before.drug_prices);
}

#[test]
fn classification_follows_thresholds() {
    let world = build_test_world();
    let set = |business: f64, policing: f64| {
        world.service.update_economic_state(EconomicPatch {
            business_activity: Some(business),
            law_enforcement_activity: Some(policing),
            ..EconomicPatch::default()
        });
    };

    set(80.0, 80.0);
    assert_eq!(world.service.get_economic_level(), Some(EconomicLevel::Wealthy));
    assert_eq!(world.service.get_crime_level(), Some(CrimeLevel::Low));

    set(20.0, 20.0);
    assert_eq!(world.service.get_economic_level(), Some(EconomicLevel::Poor));
    assert_eq!(world.service.get_crime_level(), Some(CrimeLevel::High));

    for mid in [40.0, 50.0] {
        set(mid, mid);
        assert_eq!(world.service.get_economic_level(), Some(EconomicLevel::Average));
        assert_eq!(world.service.get_crime_level(), Some(CrimeLevel::Medium));
    }
}

#[tokio::test]
async fn inflation_sums_recent_impacts() {
    let world = build_test_world();
    assert_eq!(world.service.calculate_inflation().await, 0.02);

    for impact in [0.1, 0.05, -0.02] {
        world.ledger.push_economic_event(EconomicEvent::new("shock", impact, common::start_time()));
    }
    assert!((world.service.calculate_inflation().await - 0.13).abs() < 0.01);
}

#[tokio::test]
async fn inflation_defaults_when_history_is_unreadable() {
    let world = build_test_world();
    world.ledger.push_economic_event(EconomicEvent::new("shock", 0.5, common::start_time()));
    world.ledger.set_offline(true);

    assert_eq!(world.service.calculate_inflation().await, 0.02);
}
