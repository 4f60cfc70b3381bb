use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::economy::clamp_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ItemCategory {
    Drug,
    Weapon,
    Ammunition,
    Tool,
    Contraband,
}

string_enum!(ItemCategory, "item category", {
    Drug => "drug",
    Weapon => "weapon",
    Ammunition => "ammunition",
    Tool => "tool",
    Contraband => "contraband",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub base_price: f64,
    pub current_price: f64,
    /// 0–100.
    pub supply: f64,
    /// 0–100.
    pub demand: f64,
    /// Fraction of price the item can swing in one tick at full market force.
    pub volatility: f64,
    pub last_update: DateTime<Utc>,
    /// Moving average of units traded per price tick.
    pub average_volume: f64,
    /// Units bought by players since the last price tick.
    #[serde(default)]
    pub pending_purchases: u64,
    /// Units sold by players since the last price tick.
    #[serde(default)]
    pub pending_sales: u64,
}

impl MarketItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ItemCategory,
        base_price: f64,
        volatility: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            base_price,
            current_price: base_price,
            supply: 50.0,
            demand: 50.0,
            volatility,
            last_update: now,
            average_volume: 0.0,
            pending_purchases: 0,
            pending_sales: 0,
        }
    }

    pub fn with_market(mut self, supply: f64, demand: f64) -> Self {
        self.supply = clamp_index(supply);
        self.demand = clamp_index(demand);
        self
    }

    pub fn clamp_levels(&mut self) {
        self.supply = clamp_index(self.supply);
        self.demand = clamp_index(self.demand);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TransactionKind {
    Purchase,
    Sale,
}

string_enum!(TransactionKind, "transaction kind", {
    Purchase => "purchase",
    Sale => "sale",
});

/// A completed trade as written to the player ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub player_id: String,
    pub item_id: String,
    pub kind: TransactionKind,
    pub quantity: i64,
    pub unit_price: f64,
    /// Amount debited (purchase) or credited (sale).
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_starts_at_base_price_in_equilibrium() {
        let item = MarketItem::new("weed", "Weed", ItemCategory::Drug, 50.0, 0.2, Utc::now());
        assert_eq!(item.current_price, 50.0);
        assert_eq!(item.supply, 50.0);
        assert_eq!(item.demand, 50.0);
    }

    #[test]
    fn with_market_clamps_levels() {
        let item = MarketItem::new("ammo", "Ammo", ItemCategory::Ammunition, 5.0, 0.1, Utc::now())
            .with_market(120.0, -3.0);
        assert_eq!(item.supply, 100.0);
        assert_eq!(item.demand, 0.0);
    }
}
