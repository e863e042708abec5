//! Snapshots
//!
//! Read-only, serialisable views of the game for a rendering layer.
//! Nothing here feeds back into the simulation.

#![allow(missing_docs)]

use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::game::enemy::{Enemy, EnemyId};
use crate::game::projectile::{Projectile, ProjectileId};
use crate::game::state::{GamePhase, GameState};
use crate::game::tower::{Tower, TowerId};

/// A placed tower as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerSnapshot {
    pub id: TowerId,
    pub tower_type: String,
    pub cell: Cell,
    pub x: f64,
    pub y: f64,
    pub level: u32,
    pub max_level: u32,
    pub damage: u32,
    pub range: f64,
    pub fire_rate: f64,
    pub splash_radius: f64,
    /// `None` once at max level
    pub upgrade_cost: Option<u32>,
    pub kills: u32,
}

impl From<&Tower> for TowerSnapshot {
    fn from(tower: &Tower) -> Self {
        Self {
            id: tower.id,
            tower_type: tower.type_id.clone(),
            cell: tower.cell,
            x: tower.position.x,
            y: tower.position.y,
            level: tower.level,
            max_level: tower.max_level,
            damage: tower.damage,
            range: tower.range,
            fire_rate: tower.fire_rate,
            splash_radius: tower.splash_radius,
            upgrade_cost: (!tower.is_max_level()).then_some(tower.upgrade_cost),
            kills: tower.kills,
        }
    }
}

/// An enemy on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySnapshot {
    pub id: EnemyId,
    pub enemy_type: String,
    pub x: f64,
    pub y: f64,
    pub health: u32,
    pub max_health: u32,
    pub health_percent: f64,
    pub size: f64,
    pub path_index: usize,
}

impl From<&Enemy> for EnemySnapshot {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            enemy_type: enemy.type_id.clone(),
            x: enemy.position.x,
            y: enemy.position.y,
            health: enemy.health,
            max_health: enemy.max_health,
            health_percent: enemy.health_percent(),
            size: enemy.size,
            path_index: enemy.path_index,
        }
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub tower_id: TowerId,
    pub target_id: EnemyId,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub level: u32,
    pub splash_radius: f64,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            tower_id: p.tower_id,
            target_id: p.target,
            x: p.position.x,
            y: p.position.y,
            angle: p.launch_angle,
            level: p.level,
            splash_radius: p.splash_radius,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub tick: u32,
    pub elapsed_ms: f64,
    pub phase: GamePhase,
    pub money: u32,
    pub lives: u32,
    pub wave: u32,
    pub total_waves: u32,
    pub wave_in_progress: bool,
    pub towers: Vec<TowerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}

impl GameSnapshot {
    /// Capture `state`. Entities are listed in id order.
    pub fn capture(state: &GameState, total_waves: u32) -> Self {
        Self {
            tick: state.tick,
            elapsed_ms: state.elapsed_ms,
            phase: state.phase,
            money: state.money,
            lives: state.lives,
            wave: state.wave,
            total_waves,
            wave_in_progress: state.wave_in_progress(),
            towers: state.towers.values().map(TowerSnapshot::from).collect(),
            enemies: state.enemies.values().map(EnemySnapshot::from).collect(),
            projectiles: state.projectiles().map(ProjectileSnapshot::from).collect(),
        }
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
