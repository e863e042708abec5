//! Simulation Facade
//!
//! Owns a validated config, the runtime map and the game state, and
//! exposes the query/command surface a host or UI layer talks to.

use crate::core::grid::Cell;
use crate::core::hash::StateHash;
use crate::game::command::{self, Command, CommandError, CommandOutcome};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::enemy::Enemy;
use crate::game::events::GameEvent;
use crate::game::map::GameMap;
use crate::game::projectile::Projectile;
use crate::game::snapshot::GameSnapshot;
use crate::game::state::{GamePhase, GameState};
use crate::game::tick::{self, TickResult};
use crate::game::tower::{Tower, TowerId};

/// A running game.
///
/// `tick` and every command take `&mut self`, so ticks can never overlap.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: GameConfig,
    map: GameMap,
    state: GameState,
}

impl Simulation {
    /// Validate `config` and start a fresh game.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let map = GameMap::new(&config.map)?;
        let state = GameState::new(&config.settings);
        Ok(Self { config, map, state })
    }

    /// Parse, validate and start.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::new(GameConfig::from_json_str(json)?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Runtime map.
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Full game state (read-only).
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Current money.
    pub fn money(&self) -> u32 {
        self.state.money
    }

    /// Lives left.
    pub fn lives(&self) -> u32 {
        self.state.lives
    }

    /// Number of waves started so far.
    pub fn wave_number(&self) -> u32 {
        self.state.wave
    }

    /// Number of configured waves.
    pub fn total_waves(&self) -> u32 {
        self.config.waves.len() as u32
    }

    /// A wave is spawning or its enemies are still on the field.
    pub fn is_wave_in_progress(&self) -> bool {
        self.state.wave_in_progress()
    }

    /// Playing, game over or victory.
    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Towers in id order.
    pub fn towers(&self) -> impl Iterator<Item = &Tower> + '_ {
        self.state.towers.values()
    }

    /// Look up one tower.
    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.state.towers.get(&id)
    }

    /// Enemies on the field in id order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> + '_ {
        self.state.enemies.values()
    }

    /// Projectiles in flight, grouped by tower.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> + '_ {
        self.state.projectiles()
    }

    /// Serialisable view for rendering.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::capture(&self.state, self.total_waves())
    }

    /// Hash of the current state.
    pub fn state_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Drain events produced by commands since the last tick.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Buy a tower on `cell`.
    pub fn build_tower(&mut self, tower_type: &str, cell: Cell) -> Result<TowerId, CommandError> {
        command::build_tower(&mut self.state, &self.config, &self.map, tower_type, cell)
    }

    /// Level a tower up; returns the new level.
    pub fn upgrade_tower(&mut self, id: TowerId) -> Result<u32, CommandError> {
        command::upgrade_tower(&mut self.state, id)
    }

    /// Sell a tower; returns the refund.
    pub fn sell_tower(&mut self, id: TowerId) -> Result<u32, CommandError> {
        command::sell_tower(&mut self.state, &self.config, id)
    }

    /// Move a tower to another free buildable cell.
    pub fn move_tower(&mut self, id: TowerId, cell: Cell) -> Result<(), CommandError> {
        command::move_tower(&mut self.state, &self.map, id, cell)
    }

    /// Start the next wave; returns its number.
    pub fn start_next_wave(&mut self) -> Result<u32, CommandError> {
        command::start_next_wave(&mut self.state, &self.config)
    }

    /// Back to the starting money and lives, no towers, no enemies, wave 0.
    pub fn reset(&mut self) {
        self.state.reset(&self.config.settings);
    }

    /// Advance the simulation to host time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> TickResult {
        tick::tick(&mut self.state, &self.config, &self.map, now_ms)
    }

    /// Apply a recorded command.
    pub fn apply(&mut self, command: &Command) -> CommandOutcome {
        let result = match command {
            Command::BuildTower { tower_type, cell } => {
                self.build_tower(tower_type, *cell).map(CommandOutcome::TowerBuilt)
            }
            Command::UpgradeTower { tower_id } => {
                self.upgrade_tower(*tower_id).map(CommandOutcome::TowerUpgraded)
            }
            Command::SellTower { tower_id } => {
                self.sell_tower(*tower_id).map(CommandOutcome::TowerSold)
            }
            Command::MoveTower { tower_id, cell } => {
                self.move_tower(*tower_id, *cell).map(|_| CommandOutcome::TowerMoved)
            }
            Command::StartNextWave => self.start_next_wave().map(CommandOutcome::WaveStarted),
            Command::Reset => {
                self.reset();
                Ok(CommandOutcome::Reset)
            }
            Command::Tick { now_ms } => Ok(CommandOutcome::Ticked(self.tick(*now_ms))),
        };
        result.unwrap_or_else(CommandOutcome::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "map": {
            "width": 5, "height": 3, "cellSize": 40,
            "startPoint": {"x": 0, "y": 1}, "endPoint": {"x": 4, "y": 1},
            "path": [{"x":0,"y":1},{"x":1,"y":1},{"x":2,"y":1},{"x":3,"y":1},{"x":4,"y":1}]
        },
        "towers": [
            {"id": "basic", "name": "Basic", "damage": 50, "range": 999,
             "fireRate": 1, "cost": 50, "projectileSpeed": 400}
        ],
        "enemies": [
            {"id": "grunt", "name": "Grunt", "health": 100, "speed": 50,
             "reward": 10, "damage": 1, "size": 20}
        ],
        "waves": [ { "enemies": [ {"type": "grunt", "count": 1, "delay": 0} ] } ]
    }"#;

    #[test]
    fn test_queries_on_fresh_game() {
        let sim = Simulation::from_json_str(CONFIG).unwrap();
        assert_eq!(sim.money(), 200);
        assert_eq!(sim.lives(), 20);
        assert_eq!(sim.wave_number(), 0);
        assert_eq!(sim.total_waves(), 1);
        assert!(!sim.is_wave_in_progress());
        assert_eq!(sim.phase(), GamePhase::Playing);
        assert_eq!(sim.towers().count(), 0);
        assert_eq!(sim.enemies().count(), 0);
        assert_eq!(sim.projectiles().count(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let broken = CONFIG.replace("\"type\": \"grunt\"", "\"type\": \"nobody\"");
        assert!(matches!(
            Simulation::from_json_str(&broken),
            Err(ConfigError::UnknownEnemyType { .. })
        ));
    }

    #[test]
    fn test_apply_reports_rejections() {
        let mut sim = Simulation::from_json_str(CONFIG).unwrap();
        let outcome = sim.apply(&Command::BuildTower {
            tower_type: "basic".into(),
            cell: Cell::new(0, 1),
        });
        assert_eq!(
            outcome,
            CommandOutcome::Rejected(CommandError::UnbuildableCell { cell: Cell::new(0, 1) })
        );
        assert!(!outcome.is_ok());

        let outcome = sim.apply(&Command::BuildTower {
            tower_type: "basic".into(),
            cell: Cell::new(0, 0),
        });
        assert_eq!(outcome, CommandOutcome::TowerBuilt(TowerId(1)));
    }

    #[test]
    fn test_reset_restores_start() {
        let mut sim = Simulation::from_json_str(CONFIG).unwrap();
        let fresh = sim.state_hash();

        sim.build_tower("basic", Cell::new(2, 0)).unwrap();
        sim.tick(0.0);
        sim.start_next_wave().unwrap();
        sim.tick(16.0);
        assert_ne!(sim.state_hash(), fresh);

        sim.reset();
        assert_eq!(sim.state_hash(), fresh);
        assert_eq!(sim.money(), 200);
        assert_eq!(sim.towers().count(), 0);
        assert_eq!(sim.snapshot().enemies.len(), 0);
    }

    #[test]
    fn test_snapshot_serialises() {
        let mut sim = Simulation::from_json_str(CONFIG).unwrap();
        sim.build_tower("basic", Cell::new(2, 0)).unwrap();
        sim.tick(0.0);
        sim.start_next_wave().unwrap();
        sim.tick(16.0);

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.towers.len(), 1);
        assert_eq!(snapshot.towers[0].upgrade_cost, Some(38));
        assert_eq!(snapshot.enemies.len(), 1);
        assert_eq!(snapshot.projectiles.len(), 1);
        assert!(snapshot.wave_in_progress);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"waveInProgress\":true"));
        assert!(json.contains("\"healthPercent\""));
    }
}
