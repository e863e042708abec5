//! Game Configuration
//!
//! The JSON document a host loads before starting a game: map, tower and
//! enemy catalogues, wave list and optional settings. Everything here is
//! validated once, up front. A `Simulation` is never built from a config
//! that failed validation.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::Cell;
use crate::core::hash::{StateHash, StateHasher};
use crate::game::enemy::EnemyType;
use crate::game::map::MapDefinition;
use crate::game::tower::{TargetingPolicy, TowerType};
use crate::game::wave::WaveDefinition;

/// Default starting currency.
pub const DEFAULT_STARTING_MONEY: u32 = 200;

/// Default starting lives.
pub const DEFAULT_STARTING_LIVES: u32 = 20;

/// Largest frame delta the clock accepts (ms).
pub const DEFAULT_MAX_FRAME_DELTA_MS: f64 = 250.0;

/// Fraction of the invested money returned when selling a tower.
pub const DEFAULT_SELL_REFUND_RATIO: f64 = 0.5;

/// Ticks between recorded state checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 600;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON or does not match the schema
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// Map path has no cells
    #[error("map path is empty")]
    EmptyPath,

    /// Path cell lies outside the grid
    #[error("path cell {index} at {cell} is outside the map")]
    PathOutOfBounds {
        /// Position in the path
        index: usize,
        /// Offending cell
        cell: Cell,
    },

    /// Path cell is not one grid step from its predecessor
    #[error("path cell {index} at {cell} is not adjacent to the previous cell")]
    PathNotContiguous {
        /// Position in the path
        index: usize,
        /// Offending cell
        cell: Cell,
    },

    /// startPoint/endPoint disagree with the path
    #[error("map {which} does not match the path")]
    EndpointMismatch {
        /// `"startPoint"` or `"endPoint"`
        which: &'static str,
    },

    /// Two tower types share an id
    #[error("duplicate tower type: {id}")]
    DuplicateTowerType {
        /// Repeated id
        id: String,
    },

    /// Two enemy types share an id
    #[error("duplicate enemy type: {id}")]
    DuplicateEnemyType {
        /// Repeated id
        id: String,
    },

    /// A wave references an enemy type that does not exist
    #[error("wave {wave} references unknown enemy type: {id}")]
    UnknownEnemyType {
        /// Zero-based wave index
        wave: usize,
        /// Missing enemy type id
        id: String,
    },

    /// A numeric field is out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Optional tuning knobs; every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Currency at game start and after reset
    pub starting_money: u32,
    /// Lives at game start and after reset
    pub starting_lives: u32,
    /// How towers pick among enemies in range
    pub targeting: TargetingPolicy,
    /// Frame deltas are clamped to this many milliseconds
    pub max_frame_delta_ms: f64,
    /// Share of invested money refunded on sale
    pub sell_refund_ratio: f64,
    /// Ticks between replay checkpoints (0 disables them)
    pub checkpoint_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_money: DEFAULT_STARTING_MONEY,
            starting_lives: DEFAULT_STARTING_LIVES,
            targeting: TargetingPolicy::default(),
            max_frame_delta_ms: DEFAULT_MAX_FRAME_DELTA_MS,
            sell_refund_ratio: DEFAULT_SELL_REFUND_RATIO,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

// =============================================================================
// GAME CONFIG
// =============================================================================

/// The full configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Grid and path
    pub map: MapDefinition,
    /// Purchasable tower types
    pub towers: Vec<TowerType>,
    /// Enemy catalogue
    pub enemies: Vec<EnemyType>,
    /// Waves in play order
    pub waves: Vec<WaveDefinition>,
    /// Tuning knobs
    #[serde(default)]
    pub settings: Settings,
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Look up a tower type by id.
    pub fn tower_type(&self, id: &str) -> Option<&TowerType> {
        self.towers.iter().find(|t| t.id == id)
    }

    /// Look up an enemy type by id.
    pub fn enemy_type(&self, id: &str) -> Option<&EnemyType> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Check every cross-field invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map.validate()?;
        self.validate_settings()?;

        let mut tower_ids = BTreeSet::new();
        for tower in &self.towers {
            if !tower_ids.insert(tower.id.as_str()) {
                return Err(ConfigError::DuplicateTowerType { id: tower.id.clone() });
            }
            tower.validate()?;
        }

        let mut enemy_ids = BTreeSet::new();
        for enemy in &self.enemies {
            if !enemy_ids.insert(enemy.id.as_str()) {
                return Err(ConfigError::DuplicateEnemyType { id: enemy.id.clone() });
            }
            validate_enemy(enemy)?;
        }

        if self.waves.is_empty() {
            return Err(ConfigError::invalid("waves", "must contain at least one wave"));
        }
        for (wave, definition) in self.waves.iter().enumerate() {
            for group in &definition.enemies {
                if !enemy_ids.contains(group.enemy_type.as_str()) {
                    return Err(ConfigError::UnknownEnemyType {
                        wave,
                        id: group.enemy_type.clone(),
                    });
                }
                if !(group.delay.is_finite() && group.delay >= 0.0) {
                    return Err(ConfigError::invalid(
                        format!("waves[{}].delay", wave),
                        "must be a non-negative number",
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_settings(&self) -> Result<(), ConfigError> {
        let s = &self.settings;
        if s.starting_lives == 0 {
            return Err(ConfigError::invalid("settings.startingLives", "must be at least 1"));
        }
        if !(s.max_frame_delta_ms.is_finite() && s.max_frame_delta_ms > 0.0) {
            return Err(ConfigError::invalid("settings.maxFrameDeltaMs", "must be positive"));
        }
        if !(0.0..=1.0).contains(&s.sell_refund_ratio) {
            return Err(ConfigError::invalid("settings.sellRefundRatio", "must be within 0..=1"));
        }
        Ok(())
    }

    /// Deterministic fingerprint of every simulation-relevant field.
    ///
    /// Presentation-only fields (names, colors) are skipped, so recoloring
    /// a tower does not invalidate recorded transcripts.
    pub fn fingerprint(&self) -> StateHash {
        let mut h = StateHasher::for_config();

        let map = &self.map;
        h.update_u32(map.width);
        h.update_u32(map.height);
        h.update_f64(map.cell_size);
        h.update_u32(map.path.len() as u32);
        for cell in &map.path {
            h.update_cell(*cell);
        }

        h.update_u32(self.towers.len() as u32);
        for t in &self.towers {
            h.update_str(&t.id);
            h.update_u32(t.damage);
            h.update_f64(t.range);
            h.update_f64(t.fire_rate);
            h.update_u32(t.cost);
            h.update_f64(t.projectile_speed);
            h.update_f64(t.splash_radius);
            h.update_f64(t.splash_damage_percent);
            h.update_u32(t.multi_shot);
            h.update_f64(t.multi_shot_angle);
            h.update_f64(t.upgrade_multiplier);
            h.update_u32(t.max_level);
        }

        h.update_u32(self.enemies.len() as u32);
        for e in &self.enemies {
            h.update_str(&e.id);
            h.update_u32(e.health);
            h.update_f64(e.speed);
            h.update_u32(e.reward);
            h.update_u32(e.damage);
            h.update_f64(e.size);
        }

        h.update_u32(self.waves.len() as u32);
        for wave in &self.waves {
            h.update_u32(wave.enemies.len() as u32);
            for group in &wave.enemies {
                h.update_str(&group.enemy_type);
                h.update_u32(group.count);
                h.update_f64(group.delay);
            }
        }

        let s = &self.settings;
        h.update_u32(s.starting_money);
        h.update_u32(s.starting_lives);
        h.update_u8(s.targeting as u8);
        h.update_f64(s.max_frame_delta_ms);
        h.update_f64(s.sell_refund_ratio);

        h.finalize()
    }
}

fn validate_enemy(enemy: &EnemyType) -> Result<(), ConfigError> {
    let field = |name: &str| format!("enemies.{}.{}", enemy.id, name);
    if enemy.health == 0 {
        return Err(ConfigError::invalid(field("health"), "must be positive"));
    }
    if !(enemy.speed.is_finite() && enemy.speed >= 0.0) {
        return Err(ConfigError::invalid(field("speed"), "must be a non-negative number"));
    }
    if !(enemy.size.is_finite() && enemy.size > 0.0) {
        return Err(ConfigError::invalid(field("size"), "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"{
        "map": {
            "width": 5, "height": 3, "cellSize": 40,
            "startPoint": {"x": 0, "y": 1}, "endPoint": {"x": 4, "y": 1},
            "path": [{"x":0,"y":1},{"x":1,"y":1},{"x":2,"y":1},{"x":3,"y":1},{"x":4,"y":1}]
        },
        "towers": [
            {"id": "basic", "name": "Basic", "damage": 50, "range": 999,
             "fireRate": 1, "cost": 50, "color": "#00f", "projectileSpeed": 400}
        ],
        "enemies": [
            {"id": "grunt", "name": "Grunt", "health": 100, "speed": 50,
             "reward": 10, "damage": 1, "color": "#f00", "size": 20}
        ],
        "waves": [ { "enemies": [ {"type": "grunt", "count": 1, "delay": 0} ] } ]
    }"##;

    #[test]
    fn test_parses_with_defaults() {
        let config = GameConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.starting_money, 200);

        let tower = config.tower_type("basic").unwrap();
        assert_eq!(tower.splash_radius, 0.0);
        assert_eq!(tower.splash_damage_percent, 100.0);
        assert_eq!(tower.multi_shot, 1);
        assert_eq!(tower.upgrade_multiplier, 1.5);
        assert_eq!(tower.max_level, 3);
        assert_eq!(tower.color.as_deref(), Some("#00f"));
        assert!(config.enemy_type("grunt").is_some());
        assert!(config.enemy_type("ghost").is_none());
    }

    #[test]
    fn test_settings_override() {
        let json = MINIMAL.replacen(
            "\"waves\"",
            "\"settings\": {\"startingMoney\": 500, \"targeting\": \"mostProgressed\"}, \"waves\"",
            1,
        );
        let config = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(config.settings.starting_money, 500);
        assert_eq!(config.settings.starting_lives, 20);
        assert_eq!(config.settings.targeting, TargetingPolicy::MostProgressed);
    }

    #[test]
    fn test_rejects_unknown_enemy_in_wave() {
        let json = MINIMAL.replace("\"type\": \"grunt\"", "\"type\": \"ghost\"");
        match GameConfig::from_json_str(&json) {
            Err(ConfigError::UnknownEnemyType { wave, id }) => {
                assert_eq!(wave, 0);
                assert_eq!(id, "ghost");
            }
            other => panic!("expected UnknownEnemyType, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut config = GameConfig::from_json_str(MINIMAL).unwrap();
        config.towers.push(config.towers[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateTowerType { .. })));

        let mut config = GameConfig::from_json_str(MINIMAL).unwrap();
        config.enemies.push(config.enemies[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateEnemyType { .. })));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let mut config = GameConfig::from_json_str(MINIMAL).unwrap();
        config.towers[0].fire_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = GameConfig::from_json_str(MINIMAL).unwrap();
        config.enemies[0].health = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = GameConfig::from_json_str(MINIMAL).unwrap();
        config.settings.sell_refund_ratio = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_empty_wave_list() {
        let json = MINIMAL.replace(
            "[ { \"enemies\": [ {\"type\": \"grunt\", \"count\": 1, \"delay\": 0} ] } ]",
            "[]",
        );
        assert_ne!(json, MINIMAL);
        match GameConfig::from_json_str(&json) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "waves"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(GameConfig::from_json_str("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            GameConfig::from_path("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_fingerprint_ignores_presentation() {
        let config = GameConfig::from_json_str(MINIMAL).unwrap();
        let mut recolored = config.clone();
        recolored.towers[0].color = Some("#fff".into());
        recolored.enemies[0].name = "Renamed".into();
        assert_eq!(config.fingerprint(), recolored.fingerprint());

        let mut buffed = config.clone();
        buffed.towers[0].damage += 1;
        assert_ne!(config.fingerprint(), buffed.fingerprint());
    }
}
