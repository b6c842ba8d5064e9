//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::types::WeekAdjacency;

/// Settings that change how streaks are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Rule used to decide whether two weekly periods are consecutive
    pub week_adjacency: WeekAdjacency,
}

impl StreakConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_week_adjacency(mut self, week_adjacency: WeekAdjacency) -> Self {
        self.week_adjacency = week_adjacency;
        self
    }
}
