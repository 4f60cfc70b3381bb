use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INDEX_MIN: f64 = 0.0;
pub const INDEX_MAX: f64 = 100.0;

pub fn clamp_index(v: f64) -> f64 {
    if v.is_nan() {
        return INDEX_MIN;
    }
    v.clamp(INDEX_MIN, INDEX_MAX)
}

/// The single city-wide economic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicState {
    /// Street price per drug item id.
    pub drug_prices: BTreeMap<String, f64>,
    pub weapon_availability: f64,
    pub law_enforcement_activity: f64,
    pub tourist_activity: f64,
    pub business_activity: f64,
    pub last_update: DateTime<Utc>,
}

impl EconomicState {
    pub fn clamp_indices(&mut self) {
        self.weapon_availability = clamp_index(self.weapon_availability);
        self.law_enforcement_activity = clamp_index(self.law_enforcement_activity);
        self.tourist_activity = clamp_index(self.tourist_activity);
        self.business_activity = clamp_index(self.business_activity);
    }
}

/// A partial update to `EconomicState`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicPatch {
    /// Entries are merged into the existing price map, not replacing it.
    pub drug_prices: Option<BTreeMap<String, f64>>,
    pub weapon_availability: Option<f64>,
    pub law_enforcement_activity: Option<f64>,
    pub tourist_activity: Option<f64>,
    pub business_activity: Option<f64>,
}

impl EconomicPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn apply_to(self, state: &mut EconomicState) {
        if let Some(prices) = self.drug_prices {
            state.drug_prices.extend(prices);
        }
        if let Some(v) = self.weapon_availability {
            state.weapon_availability = v;
        }
        if let Some(v) = self.law_enforcement_activity {
            state.law_enforcement_activity = v;
        }
        if let Some(v) = self.tourist_activity {
            state.tourist_activity = v;
        }
        if let Some(v) = self.business_activity {
            state.business_activity = v;
        }
        state.clamp_indices();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EconomicLevel {
    Poor,
    Average,
    Wealthy,
}

string_enum!(EconomicLevel, "economic level", {
    Poor => "poor",
    Average => "average",
    Wealthy => "wealthy",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CrimeLevel {
    Low,
    Medium,
    High,
}

string_enum!(CrimeLevel, "crime level", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// A recorded market shock. Positive `impact` is inflationary, negative deflationary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub description: String,
    pub impact: f64,
    pub recorded_at: DateTime<Utc>,
}

impl EconomicEvent {
    pub fn new(description: impl Into<String>, impact: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            impact,
            recorded_at,
        }
    }
}
