//! Checkpointing simulation state into the cache and hydrating from it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::cache::Cache;
use crate::error::CacheError;
use crate::model::{EconomicState, MarketItem, SimState, Territory, WorldEvent};
use crate::worldgen;

pub const TERRITORIES_KEY: &str = "world:territories";
pub const EVENTS_KEY: &str = "world:events";
pub const ECONOMY_KEY: &str = "world:economic_state";
pub const MARKET_KEY: &str = "market:items";

/// An owned copy of the persistable parts of `SimState`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub territories: Vec<Territory>,
    pub events: Vec<WorldEvent>,
    pub economic: Option<EconomicState>,
    pub market: Vec<MarketItem>,
}

impl WorldSnapshot {
    pub fn capture(state: &SimState) -> Self {
        Self {
            territories: state.territories.values().cloned().collect(),
            events: state.events.values().cloned().collect(),
            economic: state.economic.clone(),
            market: state.market.values().cloned().collect(),
        }
    }
}

/// Read and decode one cached value.
///
/// `Ok(None)` is a miss; undecodable JSON is `CacheError::Corrupt`.
pub async fn load_part<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Result<Option<T>, CacheError> {
    let Some(raw) = cache.get_temporary(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })
}

async fn store_part<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let json = serde_json::to_string(value).map_err(|source| CacheError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    if !cache.set_temporary(key, &json, ttl_secs).await? {
        return Err(CacheError::Unavailable(format!("write to {key} was rejected")));
    }
    Ok(())
}

pub async fn save_territories(
    cache: &dyn Cache,
    territories: &[Territory],
    ttl_secs: u64,
) -> Result<(), CacheError> {
    store_part(cache, TERRITORIES_KEY, territories, ttl_secs).await
}

/// Write every part of the snapshot. Stops at the first failure.
pub async fn save_snapshot(cache: &dyn Cache, snapshot: &WorldSnapshot, ttl_secs: u64) -> Result<(), CacheError> {
    store_part(cache, TERRITORIES_KEY, &snapshot.territories, ttl_secs).await?;
    store_part(cache, EVENTS_KEY, &snapshot.events, ttl_secs).await?;
    if let Some(economic) = &snapshot.economic {
        store_part(cache, ECONOMY_KEY, economic, ttl_secs).await?;
    }
    store_part(cache, MARKET_KEY, &snapshot.market, ttl_secs).await?;
    Ok(())
}

/// Resolve one part: cached value, or the fallback on a miss or any error.
async fn part_or_default<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
    fallback: impl FnOnce() -> T,
) -> (T, bool) {
    match load_part(cache, key).await {
        Ok(Some(value)) => (value, true),
        Ok(None) => {
            tracing::info!(key, "cache miss; using defaults");
            (fallback(), false)
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "cache read failed; using defaults");
            (fallback(), false)
        }
    }
}

/// Build the starting state from the cache, part by part.
///
/// Territories, economic state and market items that cannot be read fall
/// back to the built-in seed data; missing events fall back to none. This
/// never fails.
pub async fn hydrate_state(cache: &dyn Cache, now: DateTime<Utc>) -> SimState {
    let (territories, territories_hit) =
        part_or_default(cache, TERRITORIES_KEY, || worldgen::default_territories(now)).await;
    let (events, _) = part_or_default::<Vec<WorldEvent>>(cache, EVENTS_KEY, Vec::new).await;
    let (economic, _) =
        part_or_default(cache, ECONOMY_KEY, || worldgen::default_economic_state(now)).await;
    let (market, _) = part_or_default(cache, MARKET_KEY, || worldgen::default_market(now)).await;

    let mut state = SimState::new();
    for territory in territories {
        state.insert_territory(territory);
    }
    for event in events {
        state.restore_event(event);
    }
    state.economic = Some(economic);
    for item in market {
        state.insert_item(item);
    }

    tracing::info!(
        territories = state.territories.len(),
        events = state.events.len(),
        items = state.market.len(),
        from_cache = territories_hit,
        "world state hydrated"
    );
    state
}
