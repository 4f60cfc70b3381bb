//! Built-in seed data used when nothing can be restored from the cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{Bounds, EconomicState, ItemCategory, MarketItem, SimState, Territory};

struct TerritorySeed {
    id: &'static str,
    name: &'static str,
    bounds: (f64, f64, f64, f64),
    value: f64,
    strategic: bool,
    faction: Option<&'static str>,
}

const TERRITORIES: &[TerritorySeed] = &[
    TerritorySeed {
        id: "downtown",
        name: "Downtown Los Santos",
        bounds: (-500.0, -1000.0, 500.0, 0.0),
        value: 15_000.0,
        strategic: true,
        faction: None,
    },
    TerritorySeed {
        id: "grove_street",
        name: "Grove Street",
        bounds: (-200.0, -1900.0, 200.0, -1500.0),
        value: 5_000.0,
        strategic: false,
        faction: Some("families"),
    },
    TerritorySeed {
        id: "ballas_turf",
        name: "Davis",
        bounds: (-100.0, -2400.0, 400.0, -1950.0),
        value: 4_500.0,
        strategic: false,
        faction: Some("ballas"),
    },
    TerritorySeed {
        id: "port",
        name: "Port of Los Santos",
        bounds: (500.0, -3300.0, 1500.0, -2700.0),
        value: 20_000.0,
        strategic: true,
        faction: None,
    },
    TerritorySeed {
        id: "vinewood",
        name: "Vinewood",
        bounds: (-500.0, 0.0, 500.0, 1000.0),
        value: 12_000.0,
        strategic: false,
        faction: None,
    },
    TerritorySeed {
        id: "sandy_shores",
        name: "Sandy Shores",
        bounds: (1500.0, 3500.0, 2200.0, 4000.0),
        value: 2_500.0,
        strategic: false,
        faction: Some("lost_mc"),
    },
];

struct ItemSeed {
    id: &'static str,
    name: &'static str,
    category: ItemCategory,
    base_price: f64,
    volatility: f64,
    supply: f64,
    demand: f64,
}

const ITEMS: &[ItemSeed] = &[
    ItemSeed {
        id: "weed",
        name: "Weed",
        category: ItemCategory::Drug,
        base_price: 50.0,
        volatility: 0.2,
        supply: 70.0,
        demand: 60.0,
    },
    ItemSeed {
        id: "cocaine",
        name: "Cocaine",
        category: ItemCategory::Drug,
        base_price: 200.0,
        volatility: 0.35,
        supply: 30.0,
        demand: 75.0,
    },
    ItemSeed {
        id: "meth",
        name: "Meth",
        category: ItemCategory::Drug,
        base_price: 150.0,
        volatility: 0.3,
        supply: 40.0,
        demand: 55.0,
    },
    ItemSeed {
        id: "pistol",
        name: "Pistol",
        category: ItemCategory::Weapon,
        base_price: 800.0,
        volatility: 0.1,
        supply: 50.0,
        demand: 50.0,
    },
    ItemSeed {
        id: "smg",
        name: "SMG",
        category: ItemCategory::Weapon,
        base_price: 2_500.0,
        volatility: 0.15,
        supply: 25.0,
        demand: 45.0,
    },
    ItemSeed {
        id: "ammo_box",
        name: "Ammo Box",
        category: ItemCategory::Ammunition,
        base_price: 60.0,
        volatility: 0.1,
        supply: 65.0,
        demand: 55.0,
    },
    ItemSeed {
        id: "lockpick",
        name: "Lockpick",
        category: ItemCategory::Tool,
        base_price: 25.0,
        volatility: 0.05,
        supply: 80.0,
        demand: 40.0,
    },
    ItemSeed {
        id: "stolen_goods",
        name: "Stolen Goods",
        category: ItemCategory::Contraband,
        base_price: 120.0,
        volatility: 0.25,
        supply: 45.0,
        demand: 50.0,
    },
];

pub fn default_territories(now: DateTime<Utc>) -> Vec<Territory> {
    TERRITORIES
        .iter()
        .filter_map(|seed| {
            let (x1, y1, x2, y2) = seed.bounds;
            let bounds = Bounds::new(x1, y1, x2, y2).ok()?;
            let mut territory = Territory::new(seed.id, seed.name, bounds, seed.value, now).ok()?;
            territory.strategic = seed.strategic;
            territory.controlling_faction = seed.faction.map(str::to_string);
            Some(territory)
        })
        .collect()
}

pub fn default_market(now: DateTime<Utc>) -> Vec<MarketItem> {
    ITEMS
        .iter()
        .map(|seed| {
            MarketItem::new(seed.id, seed.name, seed.category, seed.base_price, seed.volatility, now)
                .with_market(seed.supply, seed.demand)
        })
        .collect()
}

pub fn default_economic_state(now: DateTime<Utc>) -> EconomicState {
    let drug_prices: BTreeMap<String, f64> = ITEMS
        .iter()
        .filter(|seed| seed.category == ItemCategory::Drug)
        .map(|seed| (seed.id.to_string(), seed.base_price))
        .collect();
    EconomicState {
        drug_prices,
        weapon_availability: 50.0,
        law_enforcement_activity: 50.0,
        tourist_activity: 60.0,
        business_activity: 55.0,
        last_update: now,
    }
}

pub fn default_state(now: DateTime<Utc>) -> SimState {
    let mut state = SimState::new();
    for territory in default_territories(now) {
        state.insert_territory(territory);
    }
    for item in default_market(now) {
        state.insert_item(item);
    }
    state.economic = Some(default_economic_state(now));
    state
}
