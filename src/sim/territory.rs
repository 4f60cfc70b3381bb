//! Territory lookups and control changes.

use chrono::{DateTime, Utc};

use super::signal::Signal;
use crate::error::WorldError;
use crate::model::{SimState, Territory};

/// Result of a successful control update.
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryControlChange {
    pub territory: Territory,
    pub previous_faction: Option<String>,
}

pub fn get_territory<'a>(state: &'a SimState, id: &str) -> Option<&'a Territory> {
    state.territories.get(id)
}

pub fn all_territories(state: &SimState) -> Vec<Territory> {
    state.territories.values().cloned().collect()
}

/// First territory (in id order) whose rectangle contains the point.
pub fn territory_at_position(state: &SimState, x: f64, y: f64) -> Option<&Territory> {
    state
        .territories
        .values()
        .find(|t| t.boundaries.contains(x, y))
}

pub fn is_in_contested_territory(state: &SimState, x: f64, y: f64) -> bool {
    territory_at_position(state, x, y).is_some_and(|t| t.contested)
}

pub fn territories_controlled_by<'a>(state: &'a SimState, faction_id: &str) -> Vec<&'a Territory> {
    state
        .territories
        .values()
        .filter(|t| t.controlling_faction.as_deref() == Some(faction_id))
        .collect()
}

/// Hand a territory to `faction_id`.
///
/// A strategic territory changing hands becomes contested; any other update
/// (including re-asserting the current controller) clears the flag.
pub fn update_territory_control(
    state: &mut SimState,
    territory_id: &str,
    faction_id: &str,
    now: DateTime<Utc>,
    signals: &mut Vec<Signal>,
) -> Result<TerritoryControlChange, WorldError> {
    let territory = state
        .territories
        .get_mut(territory_id)
        .ok_or_else(|| WorldError::TerritoryNotFound(territory_id.to_string()))?;

    let previous_faction = territory.controlling_faction.take();
    let changed_hands = previous_faction.as_deref() != Some(faction_id);

    territory.controlling_faction = Some(faction_id.to_string());
    territory.contested = changed_hands && territory.strategic;
    territory.last_update = now;

    tracing::info!(
        territory = territory_id,
        from = previous_faction.as_deref().unwrap_or("none"),
        to = faction_id,
        contested = territory.contested,
        "territory control changed"
    );

    signals.push(Signal::TerritoryControlChanged {
        territory_id: territory_id.to_string(),
        previous_faction: previous_faction.clone(),
        new_faction: faction_id.to_string(),
        contested: territory.contested,
    });

    Ok(TerritoryControlChange {
        territory: territory.clone(),
        previous_faction,
    })
}
