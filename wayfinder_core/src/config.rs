// Data-driven route configuration.
//
// Every tunable used by graph construction, virtual start injection, and
// turn classification lives in `RouteConfig`, loadable from JSON. Algorithm
// code never hardcodes these numbers; it reads them from the config. All
// structs are `#[serde(default)]`, so a config file only needs the fields it
// overrides.
//
// See also: `builder.rs` (doorway penalty), `virtual_start.rs` (candidate
// radius, link cap, and scoring), `turn.rs` (turn bands and hysteresis).
//
// **Critical constraint: admissibility.** `doorway_penalty` must stay >= 1.0.
// The A* heuristic is straight-line distance, which is only admissible while
// no edge is cheaper than the geometric distance it spans. `validate()`
// rejects configs that break this.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Parameters for choosing and scoring the virtual start node's anchors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualStartConfig {
    /// Candidates farther than this from the live position are ignored.
    pub search_radius: f32,
    /// Maximum number of anchors the virtual node is linked to.
    pub max_links: usize,

    /// Proximity score is `max(0, proximity_base - proximity_falloff * d)`.
    pub proximity_base: f32,
    pub proximity_falloff: f32,

    /// Added to every doorway candidate that touches the start room.
    pub doorway_bonus: f32,
    /// Extra bonus when the start room is the doorway's `room_a` side.
    pub doorway_primary_bonus: f32,

    pub waypoint_bonus: f32,
    /// Bonus for beacons whose category equals `destination_category`.
    pub destination_bonus: f32,
    pub destination_category: String,

    /// Beacon categories that physically block the agent.
    pub obstacle_categories: Vec<String>,
    /// Obstacle beacons farther than this get `obstacle_penalty`; closer ones
    /// get `obstacle_near_bonus`.
    pub obstacle_near_distance: f32,
    pub obstacle_penalty: f32,
    pub obstacle_near_bonus: f32,

    /// Bonus for any other beacon category.
    pub beacon_bonus: f32,
}

impl Default for VirtualStartConfig {
    fn default() -> Self {
        Self {
            search_radius: 6.0,
            max_links: 3,
            proximity_base: 100.0,
            proximity_falloff: 15.0,
            doorway_bonus: 400.0,
            doorway_primary_bonus: 100.0,
            waypoint_bonus: 150.0,
            destination_bonus: 100.0,
            destination_category: "destination".to_string(),
            obstacle_categories: vec!["furniture".to_string(), "obstacle".to_string()],
            obstacle_near_distance: 2.0,
            obstacle_penalty: -100.0,
            obstacle_near_bonus: 20.0,
            beacon_bonus: 50.0,
        }
    }
}

/// Bearing-delta bands (degrees) for turn instructions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Below this |delta| the instruction is "straight".
    pub straight_deg: f32,
    /// Below this |delta| the instruction is a slight turn.
    pub slight_deg: f32,
    /// Below this |delta| the instruction is a sharp turn; at or above, a U-turn.
    pub sharp_deg: f32,
    /// How far past a band boundary the delta must move before the
    /// classifier abandons the band it is holding.
    pub hysteresis_deg: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            straight_deg: 20.0,
            slight_deg: 60.0,
            sharp_deg: 150.0,
            hysteresis_deg: 8.0,
        }
    }
}

/// Top-level configuration for the route core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Through-doorway edge weight is `distance * doorway_penalty`.
    pub doorway_penalty: f32,
    pub virtual_start: VirtualStartConfig,
    pub turn: TurnConfig,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            doorway_penalty: 1.2,
            virtual_start: VirtualStartConfig::default(),
            turn: TurnConfig::default(),
        }
    }
}

impl RouteConfig {
    /// Parse a config from JSON and validate it. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RouteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the search relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.doorway_penalty.is_nan() || self.doorway_penalty < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "doorway_penalty must be >= 1.0 (got {})",
                self.doorway_penalty
            )));
        }
        let vs = &self.virtual_start;
        if vs.search_radius.is_nan() || vs.search_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "virtual_start.search_radius must be positive (got {})",
                vs.search_radius
            )));
        }
        if vs.max_links == 0 {
            return Err(ConfigError::Invalid(
                "virtual_start.max_links must be at least 1".to_string(),
            ));
        }
        let t = &self.turn;
        let ordered = 0.0 <= t.straight_deg
            && t.straight_deg < t.slight_deg
            && t.slight_deg < t.sharp_deg
            && t.sharp_deg <= 180.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "turn bands must satisfy 0 <= straight < slight < sharp <= 180 (got {} / {} / {})",
                t.straight_deg, t.slight_deg, t.sharp_deg
            )));
        }
        if t.hysteresis_deg.is_nan() || t.hysteresis_deg < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "turn.hysteresis_deg must be non-negative (got {})",
                t.hysteresis_deg
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        RouteConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_serializes() {
        let config = RouteConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = RouteConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "doorway_penalty": 1.5,
            "virtual_start": { "max_links": 2 }
        }"#;
        let config = RouteConfig::from_json(json).unwrap();
        assert_eq!(config.doorway_penalty, 1.5);
        assert_eq!(config.virtual_start.max_links, 2);
        assert_eq!(config.virtual_start.search_radius, 6.0);
        assert_eq!(config.turn, TurnConfig::default());
    }

    #[test]
    fn rejects_discounted_doorways() {
        let err = RouteConfig::from_json(r#"{ "doorway_penalty": 0.9 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_links() {
        let err = RouteConfig::from_json(r#"{ "virtual_start": { "max_links": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unordered_turn_bands() {
        let err =
            RouteConfig::from_json(r#"{ "turn": { "straight_deg": 70.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RouteConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
