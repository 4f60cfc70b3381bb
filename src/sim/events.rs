//! World event store: creation, spatial queries and the expiry sweep.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::context::TickContext;
use super::signal::Signal;
use super::system::SimSystem;
use crate::error::WorldError;
use crate::model::{EventLocation, Severity, SimState, WorldEvent, WorldEventKind};

/// Parameters for a new world event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub kind: WorldEventKind,
    pub location: EventLocation,
    pub severity: Severity,
    pub duration_minutes: u32,
    pub affected_factions: BTreeSet<String>,
    pub description: Option<String>,
}

pub fn create_event(
    state: &mut SimState,
    params: NewEvent,
    now: DateTime<Utc>,
    signals: &mut Vec<Signal>,
) -> WorldEvent {
    let id = state.id_gen.next_id();
    let mut event = WorldEvent::new(
        id,
        params.kind,
        params.location,
        params.severity,
        params.duration_minutes,
        params.affected_factions,
        now,
    );
    if let Some(description) = params.description {
        event = event.with_description(description);
    }

    tracing::debug!(event_id = id, kind = %event.kind, severity = %event.severity, "world event created");
    signals.push(Signal::EventCreated {
        event_id: id,
        kind: event.kind.to_string(),
    });
    state.events.insert(id, event.clone());
    event
}

/// Active events whose radius covers the point. Distance is planar; `z` is
/// accepted for call-site symmetry with positions but not consulted.
pub fn events_at_location(state: &SimState, x: f64, y: f64, _z: f64) -> Vec<WorldEvent> {
    state
        .events
        .values()
        .filter(|e| e.location.covers(x, y))
        .cloned()
        .collect()
}

pub fn active_events(state: &SimState) -> Vec<WorldEvent> {
    state.events.values().cloned().collect()
}

fn severity_for_value(value: f64) -> Severity {
    match value {
        v if v >= 10_000.0 => Severity::Critical,
        v if v >= 5_000.0 => Severity::High,
        v if v >= 1_000.0 => Severity::Medium,
        _ => Severity::Low,
    }
}

fn duration_for_severity(severity: Severity) -> u32 {
    match severity {
        Severity::Low => 30,
        Severity::Medium => 60,
        Severity::High => 120,
        Severity::Critical => 240,
    }
}

/// Two factions clash over a territory: open a faction war covering the
/// territory and mark it contested.
pub fn trigger_faction_conflict(
    state: &mut SimState,
    attacker: &str,
    defender: &str,
    territory_id: &str,
    now: DateTime<Utc>,
    signals: &mut Vec<Signal>,
) -> Result<WorldEvent, WorldError> {
    let territory = state
        .territories
        .get_mut(territory_id)
        .ok_or_else(|| WorldError::TerritoryNotFound(territory_id.to_string()))?;

    territory.contested = true;
    territory.last_update = now;

    let (x, y) = territory.boundaries.center();
    let radius = territory.boundaries.circumradius();
    let severity = severity_for_value(territory.value);
    let description = format!(
        "{attacker} moved on {defender} in {}",
        territory.name
    );

    let event = create_event(
        state,
        NewEvent {
            kind: WorldEventKind::FactionWar,
            location: EventLocation { x, y, z: 0.0, radius },
            severity,
            duration_minutes: duration_for_severity(severity),
            affected_factions: BTreeSet::from([attacker.to_string(), defender.to_string()]),
            description: Some(description),
        },
        now,
        signals,
    );
    Ok(event)
}

/// Remove every event whose expiry is strictly before `now`, emitting one
/// `EventExpired` per removal. Returns the removed ids in ascending order.
pub fn process_active_events(
    state: &mut SimState,
    now: DateTime<Utc>,
    signals: &mut Vec<Signal>,
) -> Vec<u64> {
    let expired: Vec<u64> = state
        .events
        .values()
        .filter(|e| e.is_expired(now))
        .map(|e| e.id)
        .collect();

    for id in &expired {
        if let Some(event) = state.events.remove(id) {
            signals.push(Signal::EventExpired {
                event_id: event.id,
                kind: event.kind.to_string(),
            });
        }
    }

    if !expired.is_empty() {
        tracing::info!(count = expired.len(), remaining = state.events.len(), "expired world events swept");
    }
    expired
}

/// Periodic expiry sweep.
pub struct EventExpirySystem {
    interval: Duration,
}

impl EventExpirySystem {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl SimSystem for EventExpirySystem {
    fn name(&self) -> &str {
        "event_expiry"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        process_active_events(ctx.state, ctx.now, ctx.signals);
    }
}
