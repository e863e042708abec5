//! Wave Spawner
//!
//! Timed spawn sequencing within a wave.
//!
//! ```text
//!          start_wave            groups exhausted
//!   Idle ─────────────▶ Spawning ───────────────────▶ Completed
//!    ▲                     and no enemies left          │
//!    └──────────── reset ───────────────────────────────┤
//!                          start_wave ◀─────────────────┘
//! ```
//!
//! Each group waits `delay` seconds between spawns, measured from the
//! previous spawn. At most one enemy spawns per tick.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::game::command::CommandError;

/// One run of identical enemies inside a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Enemy type id
    #[serde(rename = "type")]
    pub enemy_type: String,
    /// How many to spawn
    pub count: u32,
    /// Seconds between spawns
    #[serde(default)]
    pub delay: f64,
}

/// A wave: spawn groups played in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Groups in spawn order
    pub enemies: Vec<SpawnGroup>,
}

impl WaveDefinition {
    /// Total enemies this wave spawns.
    pub fn total_enemies(&self) -> u32 {
        self.enemies.iter().map(|g| g.count).sum()
    }
}

/// Spawner lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpawnerPhase {
    /// No wave started yet (or after reset)
    #[default]
    Idle = 0,
    /// Spawning, or waiting for the field to clear
    Spawning = 1,
    /// Last wave finished
    Completed = 2,
}

/// Runtime state for the wave being played.
#[derive(Clone, Debug, Default)]
pub struct WaveSpawner {
    phase: SpawnerPhase,
    groups: Vec<SpawnGroup>,
    /// Current group, `None` once every group is exhausted
    group_index: Option<usize>,
    spawned_in_group: u32,
    since_last_spawn_ms: f64,
}

impl WaveSpawner {
    /// Create an idle spawner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SpawnerPhase {
        self.phase
    }

    /// True while a wave is spawning or its enemies are still on the field.
    pub fn is_spawning(&self) -> bool {
        self.phase == SpawnerPhase::Spawning
    }

    /// True once every group of the current wave has been spawned.
    pub fn is_exhausted(&self) -> bool {
        self.group_index.is_none()
    }

    /// Enemies still to spawn in the current wave.
    pub fn remaining(&self) -> u32 {
        let Some(index) = self.group_index else {
            return 0;
        };
        let current = self.groups[index].count.saturating_sub(self.spawned_in_group);
        let later: u32 = self.groups[index + 1..].iter().map(|g| g.count).sum();
        current + later
    }

    /// Begin spawning `wave`. Fails if a wave is already running.
    pub fn start_wave(&mut self, wave: &WaveDefinition) -> Result<(), CommandError> {
        if self.is_spawning() {
            return Err(CommandError::WaveAlreadyInProgress);
        }

        self.phase = SpawnerPhase::Spawning;
        self.groups = wave.enemies.clone();
        self.group_index = self.next_group_from(0);
        self.spawned_in_group = 0;
        self.since_last_spawn_ms = 0.0;
        Ok(())
    }

    /// Advance the spawn timer; returns the enemy type to spawn, if any.
    pub fn tick(&mut self, delta_ms: f64) -> Option<String> {
        if !self.is_spawning() {
            return None;
        }

        self.since_last_spawn_ms += delta_ms;

        let index = self.group_index?;
        let group = &self.groups[index];
        if self.since_last_spawn_ms <= group.delay * 1000.0 {
            return None;
        }

        let enemy_type = group.enemy_type.clone();
        self.since_last_spawn_ms = 0.0;
        self.spawned_in_group += 1;

        if self.spawned_in_group >= group.count {
            self.group_index = self.next_group_from(index + 1);
            self.spawned_in_group = 0;
        }

        Some(enemy_type)
    }

    /// Mark the wave complete once every group is exhausted and no enemy is
    /// left on the field. Returns true on the transition only.
    pub fn try_complete(&mut self, active_enemies: usize) -> bool {
        if self.is_spawning() && self.is_exhausted() && active_enemies == 0 {
            self.phase = SpawnerPhase::Completed;
            self.groups.clear();
            return true;
        }
        false
    }

    /// Back to idle, dropping any wave in progress.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the spawner state into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.phase as u8);
        hasher.update_u32(self.groups.len() as u32);
        match self.group_index {
            Some(index) => {
                hasher.update_bool(true);
                hasher.update_u32(index as u32);
            }
            None => hasher.update_bool(false),
        }
        hasher.update_u32(self.spawned_in_group);
        hasher.update_f64(self.since_last_spawn_ms);
    }

    /// First group at or after `from` that spawns anything.
    fn next_group_from(&self, from: usize) -> Option<usize> {
        (from..self.groups.len()).find(|&i| self.groups[i].count > 0)
    }
}
