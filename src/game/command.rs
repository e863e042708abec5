//! Player Commands
//!
//! Building, upgrading, selling and moving towers, and starting waves.
//!
//! Every command validates first and mutates second: a rejected command
//! leaves the state untouched and reports why.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::grid::Cell;
use crate::game::config::GameConfig;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::map::GameMap;
use crate::game::state::GameState;
use crate::game::tick::TickResult;
use crate::game::tower::{Tower, TowerId};

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not enough money
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Price of the action
        needed: u32,
        /// Money on hand
        available: u32,
    },

    /// Another tower already stands there
    #[error("cell {cell} is occupied")]
    OccupiedCell {
        /// Requested cell
        cell: Cell,
    },

    /// Path cell or off the map
    #[error("cell {cell} is not buildable")]
    UnbuildableCell {
        /// Requested cell
        cell: Cell,
    },

    /// No tower type with this id
    #[error("unknown tower type: {id}")]
    UnknownTowerType {
        /// Requested type id
        id: String,
    },

    /// No tower with this id
    #[error("unknown tower: {id}")]
    UnknownTower {
        /// Requested tower
        id: TowerId,
    },

    /// Tower cannot level up further
    #[error("{id} is already at max level")]
    AlreadyMaxLevel {
        /// Requested tower
        id: TowerId,
    },

    /// A wave is still running
    #[error("a wave is already in progress")]
    WaveAlreadyInProgress,

    /// Every configured wave has been played
    #[error("all waves have been completed")]
    AllWavesCompleted,

    /// Game over or victory; only reset is accepted
    #[error("the game has ended")]
    GameEnded,
}

fn ensure_playing(state: &GameState) -> Result<(), CommandError> {
    if state.is_playing() {
        Ok(())
    } else {
        Err(CommandError::GameEnded)
    }
}

fn ensure_free_buildable(state: &GameState, map: &GameMap, cell: Cell) -> Result<(), CommandError> {
    if !map.is_buildable(cell) {
        return Err(CommandError::UnbuildableCell { cell });
    }
    if state.tower_at(cell).is_some() {
        return Err(CommandError::OccupiedCell { cell });
    }
    Ok(())
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Buy a tower of `tower_type` on `cell`.
pub fn build_tower(
    state: &mut GameState,
    config: &GameConfig,
    map: &GameMap,
    tower_type: &str,
    cell: Cell,
) -> Result<TowerId, CommandError> {
    ensure_playing(state)?;
    let kind = config
        .tower_type(tower_type)
        .ok_or_else(|| CommandError::UnknownTowerType { id: tower_type.to_string() })?;
    ensure_free_buildable(state, map, cell)?;
    if state.money < kind.cost {
        return Err(CommandError::InsufficientFunds { needed: kind.cost, available: state.money });
    }

    state.money -= kind.cost;
    let id = state.allocate_tower_id();
    state.towers.insert(id, Tower::new(id, kind, cell, map.cell_center_pixel(cell)));

    debug!("Built {} ({}) at {} for {}", id, kind.id, cell, kind.cost);
    state.push_event(GameEvent::new(
        state.tick,
        GameEventData::TowerBuilt {
            tower_id: id,
            tower_type: kind.id.clone(),
            cell,
            cost: kind.cost,
        },
    ));
    Ok(id)
}

/// Pay the tower's upgrade cost and raise it one level.
///
/// Returns the new level.
pub fn upgrade_tower(state: &mut GameState, tower_id: TowerId) -> Result<u32, CommandError> {
    ensure_playing(state)?;
    let money = state.money;
    let tower = state
        .towers
        .get_mut(&tower_id)
        .ok_or(CommandError::UnknownTower { id: tower_id })?;
    if tower.is_max_level() {
        return Err(CommandError::AlreadyMaxLevel { id: tower_id });
    }
    let cost = tower.upgrade_cost;
    if money < cost {
        return Err(CommandError::InsufficientFunds { needed: cost, available: money });
    }

    tower.upgrade();
    tower.total_invested += cost;
    let level = tower.level;
    state.money -= cost;

    debug!("Upgraded {} to level {} for {}", tower_id, level, cost);
    state.push_event(GameEvent::new(
        state.tick,
        GameEventData::TowerUpgraded { tower_id, level, cost },
    ));
    Ok(level)
}

/// Remove a tower and refund part of what was spent on it.
///
/// Its projectiles in flight disappear with it. Returns the refund.
pub fn sell_tower(
    state: &mut GameState,
    config: &GameConfig,
    tower_id: TowerId,
) -> Result<u32, CommandError> {
    ensure_playing(state)?;
    let tower = state
        .towers
        .remove(&tower_id)
        .ok_or(CommandError::UnknownTower { id: tower_id })?;

    let refund = (tower.total_invested as f64 * config.settings.sell_refund_ratio).round() as u32;
    state.money = state.money.saturating_add(refund);

    debug!("Sold {} for {}", tower_id, refund);
    state.push_event(GameEvent::new(state.tick, GameEventData::TowerSold { tower_id, refund }));
    Ok(refund)
}

/// Relocate a tower to another free buildable cell at no cost.
pub fn move_tower(
    state: &mut GameState,
    map: &GameMap,
    tower_id: TowerId,
    cell: Cell,
) -> Result<(), CommandError> {
    ensure_playing(state)?;
    let from = state
        .towers
        .get(&tower_id)
        .map(|t| t.cell)
        .ok_or(CommandError::UnknownTower { id: tower_id })?;
    if from == cell {
        return Ok(());
    }
    ensure_free_buildable(state, map, cell)?;

    if let Some(tower) = state.towers.get_mut(&tower_id) {
        tower.cell = cell;
        tower.position = map.cell_center_pixel(cell);
    }

    debug!("Moved {} from {} to {}", tower_id, from, cell);
    state.push_event(GameEvent::new(
        state.tick,
        GameEventData::TowerMoved { tower_id, from, to: cell },
    ));
    Ok(())
}

/// Start the next configured wave. Returns its 1-based number.
pub fn start_next_wave(state: &mut GameState, config: &GameConfig) -> Result<u32, CommandError> {
    ensure_playing(state)?;
    if state.wave_in_progress() {
        return Err(CommandError::WaveAlreadyInProgress);
    }
    let definition = config
        .waves
        .get(state.wave as usize)
        .ok_or(CommandError::AllWavesCompleted)?;

    state.spawner.start_wave(definition)?;
    state.wave += 1;

    let enemy_count = definition.total_enemies();
    info!("Wave {} started ({} enemies)", state.wave, enemy_count);
    state.push_event(GameEvent::new(
        state.tick,
        GameEventData::WaveStarted { wave: state.wave, enemy_count },
    ));
    Ok(state.wave)
}

// =============================================================================
// RECORDABLE COMMANDS
// =============================================================================

/// Every input a host can feed the simulation, in recordable form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    /// Buy a tower
    BuildTower {
        /// Tower type id
        tower_type: String,
        /// Target cell
        cell: Cell,
    },
    /// Level a tower up
    UpgradeTower {
        /// Tower to upgrade
        tower_id: TowerId,
    },
    /// Sell a tower
    SellTower {
        /// Tower to sell
        tower_id: TowerId,
    },
    /// Relocate a tower
    MoveTower {
        /// Tower to move
        tower_id: TowerId,
        /// Destination cell
        cell: Cell,
    },
    /// Start the next wave
    StartNextWave,
    /// Restart from scratch
    Reset,
    /// Advance the simulation to host time `now_ms`
    Tick {
        /// Host timestamp in milliseconds
        now_ms: f64,
    },
}

/// What applying a [`Command`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// New tower
    TowerBuilt(TowerId),
    /// New level
    TowerUpgraded(u32),
    /// Refund paid
    TowerSold(u32),
    /// Tower relocated
    TowerMoved,
    /// Wave number started
    WaveStarted(u32),
    /// State reset
    Reset,
    /// Tick ran
    Ticked(TickResult),
    /// Command refused; nothing changed
    Rejected(CommandError),
}

impl CommandOutcome {
    /// True unless the command was rejected.
    pub fn is_ok(&self) -> bool {
        !matches!(self, CommandOutcome::Rejected(_))
    }
}
