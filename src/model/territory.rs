use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Bounds {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, WorldError> {
        if !(x1 < x2 && y1 < y2) {
            return Err(WorldError::InvalidBounds { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Inclusive on the min edges, exclusive on the max edges, so a point on
    /// an edge shared by adjacent rectangles belongs to exactly one of them.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Distance from the center to a corner.
    pub fn circumradius(&self) -> f64 {
        let w = self.x2 - self.x1;
        let h = self.y2 - self.y1;
        (w * w + h * h).sqrt() / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub name: String,
    pub boundaries: Bounds,
    pub contested: bool,
    pub controlling_faction: Option<String>,
    /// Strategic territories become contested when control changes hands.
    #[serde(default)]
    pub strategic: bool,
    pub value: f64,
    pub last_update: DateTime<Utc>,
}

impl Territory {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        boundaries: Bounds,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, WorldError> {
        if !(value > 0.0) {
            return Err(WorldError::InvalidValue(value));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            boundaries,
            contested: false,
            controlling_faction: None,
            strategic: false,
            value,
            last_update: now,
        })
    }

    pub fn strategic(mut self) -> Self {
        self.strategic = true;
        self
    }

    pub fn controlled_by(mut self, faction_id: impl Into<String>) -> Self {
        self.controlling_faction = Some(faction_id.into());
        self
    }
}
