//! Enemies
//!
//! Per-instance health and movement along the map's pixel path.
//!
//! ```text
//!            health hits 0
//!   Alive ─────────────────▶ Dead
//!     │
//!     └──────────────────▶ ReachedEnd
//!        last waypoint
//! ```
//!
//! Both terminal states are final; nothing leaves them.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::tower::TowerId;

/// Unique enemy identifier (monotonic counter).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

impl std::fmt::Display for EnemyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

/// Static enemy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyType {
    /// Type identifier referenced by waves
    pub id: String,
    /// Display name
    pub name: String,
    /// Starting (and maximum) health
    pub health: u32,
    /// Movement speed in pixels per second
    pub speed: f64,
    /// Money granted when killed
    pub reward: u32,
    /// Lives removed when it escapes
    pub damage: u32,
    /// Presentation color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Diameter in pixels; half of it is the hit radius
    pub size: f64,
}

/// Lifecycle state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyStatus {
    /// Walking the path
    Alive,
    /// Killed by tower fire
    Dead,
    /// Walked off the end of the path
    ReachedEnd,
}

/// Result of advancing an enemy one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Movement {
    /// Position or waypoint index changed
    pub moved: bool,
    /// The enemy is at the exit
    pub reached_end: bool,
}

/// Result of applying damage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    /// This call killed the enemy (reported exactly once)
    pub died: bool,
    /// Health left after the hit
    pub health: u32,
    /// Health left as a percentage of max health
    pub health_percent: f64,
}

/// A live enemy instance.
#[derive(Clone, Debug)]
pub struct Enemy {
    /// Unique ID
    pub id: EnemyId,
    /// Config type ID
    pub type_id: String,
    /// Health at spawn
    pub max_health: u32,
    /// Current health (never negative)
    pub health: u32,
    /// Pixels per second
    pub speed: f64,
    /// Money granted on death
    pub reward: u32,
    /// Lives removed on escape
    pub damage: u32,
    /// Diameter in pixels
    pub size: f64,
    /// Index of the last waypoint reached
    pub path_index: usize,
    /// Interpolated pixel position
    pub position: Vec2,
    /// Lifecycle state
    pub status: EnemyStatus,
    /// Tower whose fire landed the killing blow
    pub killed_by: Option<TowerId>,
}

impl Enemy {
    /// Spawn an enemy at the first waypoint of `path`.
    pub fn new(id: EnemyId, kind: &EnemyType, path: &[Vec2]) -> Self {
        Self {
            id,
            type_id: kind.id.clone(),
            max_health: kind.health,
            health: kind.health,
            speed: kind.speed,
            reward: kind.reward,
            damage: kind.damage,
            size: kind.size,
            path_index: 0,
            position: path.first().copied().unwrap_or_default(),
            status: EnemyStatus::Alive,
            killed_by: None,
        }
    }

    /// Neither dead nor escaped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.status == EnemyStatus::Alive
    }

    /// Killed by damage.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.status == EnemyStatus::Dead
    }

    /// Escaped through the exit.
    #[inline]
    pub fn has_reached_end(&self) -> bool {
        self.status == EnemyStatus::ReachedEnd
    }

    /// Hit radius in pixels.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Health as a percentage of max health.
    pub fn health_percent(&self) -> f64 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f64 / self.max_health as f64 * 100.0
    }

    /// Walk towards the next waypoint for `delta_ms` milliseconds.
    ///
    /// Reaching a waypoint snaps onto it and ends this tick's movement.
    /// Arriving on the last waypoint flips the enemy to `ReachedEnd`.
    pub fn advance(&mut self, delta_ms: f64, path: &[Vec2]) -> Movement {
        if !self.is_alive() {
            return Movement { moved: false, reached_end: self.has_reached_end() };
        }

        let last_index = path.len().saturating_sub(1);
        if self.path_index >= last_index {
            self.status = EnemyStatus::ReachedEnd;
            return Movement { moved: false, reached_end: true };
        }

        let step = self.speed * delta_ms / 1000.0;
        let waypoint = path[self.path_index + 1];
        let (position, arrived) = self.position.step_towards(waypoint, step);
        let moved = arrived || position != self.position;
        self.position = position;

        if arrived {
            self.path_index += 1;
            if self.path_index >= last_index {
                self.status = EnemyStatus::ReachedEnd;
                return Movement { moved, reached_end: true };
            }
        }

        Movement { moved, reached_end: false }
    }

    /// Subtract `amount` from health, flooring at zero.
    ///
    /// The first call that brings health to zero reports `died = true`;
    /// every call after that (or after escaping) is a no-op.
    pub fn apply_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.is_alive() {
            self.health = self.health.saturating_sub(amount);
            if self.health == 0 {
                self.status = EnemyStatus::Dead;
                return DamageOutcome { died: true, health: 0, health_percent: 0.0 };
            }
        }

        DamageOutcome {
            died: false,
            health: self.health,
            health_percent: self.health_percent(),
        }
    }

    /// How far along the path this enemy is: waypoint index plus the
    /// fraction of the current segment already covered.
    pub fn progress(&self, path: &[Vec2]) -> f64 {
        let base = self.path_index as f64;
        let (Some(from), Some(to)) = (path.get(self.path_index), path.get(self.path_index + 1)) else {
            return base;
        };
        let segment = from.distance(*to);
        if segment == 0.0 {
            return base;
        }
        base + (1.0 - self.position.distance(*to) / segment).clamp(0.0, 1.0)
    }
}
