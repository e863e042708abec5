//! Game State
//!
//! The mutable aggregate a game is made of: economy, clock, wave runtime
//! and the live entity collections.
//!
//! Uses BTreeMap keyed by monotonic ids so every pass over towers or
//! enemies runs in the same order on every run.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::config::Settings;
use crate::game::enemy::{Enemy, EnemyId, EnemyStatus};
use crate::game::events::GameEvent;
use crate::game::projectile::Projectile;
use crate::game::tower::{Tower, TowerId};
use crate::game::wave::WaveSpawner;

/// Top-level game phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum GamePhase {
    /// Accepting commands and ticks
    #[default]
    Playing = 0,
    /// Lives ran out
    GameOver = 1,
    /// Every wave cleared
    Victory = 2,
}

impl GamePhase {
    /// Game over or victory.
    pub fn is_terminal(self) -> bool {
        self != GamePhase::Playing
    }
}

/// Complete mutable state of a game.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Advancing ticks so far
    pub tick: u32,

    /// Simulation clock: sum of clamped frame deltas (ms)
    pub elapsed_ms: f64,

    /// Host timestamp of the previous tick, `None` until the first tick
    pub last_now_ms: Option<f64>,

    /// Current phase
    pub phase: GamePhase,

    /// Currency (never negative)
    pub money: u32,

    /// Lives left
    pub lives: u32,

    /// Number of waves started (the current wave, 1-based)
    pub wave: u32,

    /// Spawn sequencing for the current wave
    pub spawner: WaveSpawner,

    /// Placed towers (own their projectiles)
    pub towers: BTreeMap<TowerId, Tower>,

    /// Enemies on the field
    pub enemies: BTreeMap<EnemyId, Enemy>,

    /// Last tower ID handed out
    pub next_tower_id: u32,

    /// Last enemy ID handed out
    pub next_enemy_id: u32,

    /// Last projectile ID handed out
    pub next_projectile_id: u32,

    /// Events not yet drained by a tick
    pub pending_events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh state with the configured starting money and lives.
    pub fn new(settings: &Settings) -> Self {
        Self {
            tick: 0,
            elapsed_ms: 0.0,
            last_now_ms: None,
            phase: GamePhase::Playing,
            money: settings.starting_money,
            lives: settings.starting_lives,
            wave: 0,
            spawner: WaveSpawner::new(),
            towers: BTreeMap::new(),
            enemies: BTreeMap::new(),
            next_tower_id: 0,
            next_enemy_id: 0,
            next_projectile_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Discard everything and start over.
    pub fn reset(&mut self, settings: &Settings) {
        *self = Self::new(settings);
    }

    /// True while neither game over nor victory.
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// A wave is spawning or its enemies are still on the field.
    pub fn wave_in_progress(&self) -> bool {
        self.spawner.is_spawning()
    }

    /// Tower standing on `cell`, if any.
    pub fn tower_at(&self, cell: Cell) -> Option<TowerId> {
        self.towers.values().find(|t| t.cell == cell).map(|t| t.id)
    }

    /// All projectiles in flight, grouped by tower.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> + '_ {
        self.towers.values().flat_map(|t| t.projectiles.iter())
    }

    /// Allocate the next tower id.
    pub fn allocate_tower_id(&mut self) -> TowerId {
        self.next_tower_id += 1;
        TowerId(self.next_tower_id)
    }

    /// Allocate the next enemy id.
    pub fn allocate_enemy_id(&mut self) -> EnemyId {
        self.next_enemy_id += 1;
        EnemyId(self.next_enemy_id)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.elapsed_ms, |hasher| {
            match self.last_now_ms {
                Some(now) => {
                    hasher.update_bool(true);
                    hasher.update_f64(now);
                }
                None => hasher.update_bool(false),
            }
            hasher.update_u8(self.phase as u8);
            hasher.update_u32(self.money);
            hasher.update_u32(self.lives);
            hasher.update_u32(self.wave);
            self.spawner.hash_into(hasher);

            hasher.update_u32(self.next_tower_id);
            hasher.update_u32(self.next_enemy_id);
            hasher.update_u32(self.next_projectile_id);

            // BTreeMap iteration is sorted by id
            hasher.update_u32(self.towers.len() as u32);
            for tower in self.towers.values() {
                hash_tower(hasher, tower);
            }

            hasher.update_u32(self.enemies.len() as u32);
            for enemy in self.enemies.values() {
                hash_enemy(hasher, enemy);
            }
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

fn hash_tower(hasher: &mut StateHasher, tower: &Tower) {
    hasher.update_u32(tower.id.0);
    hasher.update_str(&tower.type_id);
    hasher.update_cell(tower.cell);
    hasher.update_u32(tower.level);
    hasher.update_u32(tower.damage);
    hasher.update_f64(tower.range);
    hasher.update_f64(tower.fire_rate);
    hasher.update_f64(tower.splash_radius);
    hasher.update_u32(tower.upgrade_cost);
    hasher.update_u32(tower.total_invested);
    hasher.update_f64(tower.last_fire_ms.unwrap_or(-1.0));
    hasher.update_u32(tower.kills);

    hasher.update_u32(tower.projectiles.len() as u32);
    for p in &tower.projectiles {
        hasher.update_u32(p.id.0);
        hasher.update_vec2(p.position);
        hasher.update_u32(p.target.0);
        hasher.update_bool(p.hit);
        hasher.update_bool(p.to_remove);
    }
}

fn hash_enemy(hasher: &mut StateHasher, enemy: &Enemy) {
    hasher.update_u32(enemy.id.0);
    hasher.update_str(&enemy.type_id);
    hasher.update_u32(enemy.health);
    hasher.update_u32(enemy.path_index as u32);
    hasher.update_vec2(enemy.position);
    hasher.update_u8(match enemy.status {
        EnemyStatus::Alive => 0,
        EnemyStatus::Dead => 1,
        EnemyStatus::ReachedEnd => 2,
    });
}

// =============================================================================
// TESTS
// =============================================================================
