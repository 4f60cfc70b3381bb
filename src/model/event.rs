use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum WorldEventKind {
    FactionWar,
    TerritoryConflict,
    PoliceRaid,
    DrugBust,
    GangMeeting,
    StreetRace,
    Custom(String),
}

string_enum_open!(WorldEventKind, "world event kind", {
    FactionWar => "faction_war",
    TerritoryConflict => "territory_conflict",
    PoliceRaid => "police_raid",
    DrugBust => "drug_bust",
    GangMeeting => "gang_meeting",
    StreetRace => "street_race",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Severity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub x: f64,
    pub y: f64,
    /// Stored for clients; radius checks are planar.
    pub z: f64,
    pub radius: f64,
}

impl EventLocation {
    /// Planar (x, y) containment. `z` is deliberately not consulted.
    pub fn covers(&self, x: f64, y: f64) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt() <= self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: u64,
    pub kind: WorldEventKind,
    pub location: EventLocation,
    pub severity: Severity,
    pub duration_minutes: u32,
    pub affected_factions: BTreeSet<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WorldEvent {
    pub fn new(
        id: u64,
        kind: WorldEventKind,
        location: EventLocation,
        severity: Severity,
        duration_minutes: u32,
        affected_factions: BTreeSet<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let description = format!("{kind} ({severity})");
        Self {
            id,
            kind,
            location,
            severity,
            duration_minutes,
            affected_factions,
            description,
            created_at,
            expires_at: created_at + Duration::minutes(i64::from(duration_minutes)),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Strictly past: an event expiring exactly at `now` survives one more sweep.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
