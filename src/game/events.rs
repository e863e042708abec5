//! Game Events
//!
//! Events generated during simulation for the rendering layer, logging and
//! replay checks. Each tick returns its events in the order the pipeline
//! produced them; `Ord` gives a stable (tick, priority, subject) order
//! for consumers that want to group them.

use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::game::enemy::EnemyId;
use crate::game::projectile::ProjectileId;
use crate::game::tower::TowerId;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Game over / victory
    Terminal = 0,
    /// Enemies leaving play (money and lives change)
    EnemyRemoval = 1,
    /// Wave boundaries
    Wave = 2,
    /// Player commands
    Command = 3,
    /// Shots and hits
    Combat = 4,
    /// New enemies
    Spawn = 5,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A wave started spawning
    WaveStarted {
        /// 1-based wave number
        wave: u32,
        /// Enemies it will spawn
        enemy_count: u32,
    },

    /// An enemy entered the map
    EnemySpawned {
        enemy_id: EnemyId,
        enemy_type: String,
    },

    /// A tower launched a projectile
    ProjectileFired {
        tower_id: TowerId,
        projectile_id: ProjectileId,
        target_id: EnemyId,
        angle: f64,
    },

    /// An enemy lost health
    EnemyDamaged {
        enemy_id: EnemyId,
        tower_id: TowerId,
        amount: u32,
        health_percent: f64,
        /// Caught in a blast rather than hit directly
        splash: bool,
    },

    /// An enemy was killed and its reward paid
    EnemyDefeated {
        enemy_id: EnemyId,
        reward: u32,
        killed_by: Option<TowerId>,
    },

    /// An enemy escaped and cost lives
    EnemyReachedEnd {
        enemy_id: EnemyId,
        damage: u32,
        lives_left: u32,
    },

    /// Wave cleared and bonus paid
    WaveCompleted {
        wave: u32,
        bonus: u32,
    },

    /// Tower bought
    TowerBuilt {
        tower_id: TowerId,
        tower_type: String,
        cell: Cell,
        cost: u32,
    },

    /// Tower levelled up
    TowerUpgraded {
        tower_id: TowerId,
        level: u32,
        cost: u32,
    },

    /// Tower sold
    TowerSold {
        tower_id: TowerId,
        refund: u32,
    },

    /// Tower relocated
    TowerMoved {
        tower_id: TowerId,
        from: Cell,
        to: Cell,
    },

    /// Lives ran out
    GameOver {
        wave: u32,
    },

    /// Final wave cleared
    Victory {
        wave: u32,
        lives: u32,
    },
}

impl GameEventData {
    /// Processing priority of this kind of event.
    pub fn priority(&self) -> EventPriority {
        match self {
            GameEventData::GameOver { .. } | GameEventData::Victory { .. } => EventPriority::Terminal,
            GameEventData::EnemyDefeated { .. } | GameEventData::EnemyReachedEnd { .. } => {
                EventPriority::EnemyRemoval
            }
            GameEventData::WaveStarted { .. } | GameEventData::WaveCompleted { .. } => EventPriority::Wave,
            GameEventData::TowerBuilt { .. }
            | GameEventData::TowerUpgraded { .. }
            | GameEventData::TowerSold { .. }
            | GameEventData::TowerMoved { .. } => EventPriority::Command,
            GameEventData::ProjectileFired { .. } | GameEventData::EnemyDamaged { .. } => {
                EventPriority::Combat
            }
            GameEventData::EnemySpawned { .. } => EventPriority::Spawn,
        }
    }

    /// Entity id used to break ties within a priority.
    fn subject(&self) -> Option<u32> {
        match self {
            GameEventData::EnemySpawned { enemy_id, .. }
            | GameEventData::EnemyDamaged { enemy_id, .. }
            | GameEventData::EnemyDefeated { enemy_id, .. }
            | GameEventData::EnemyReachedEnd { enemy_id, .. } => Some(enemy_id.0),
            GameEventData::ProjectileFired { tower_id, .. }
            | GameEventData::TowerBuilt { tower_id, .. }
            | GameEventData::TowerUpgraded { tower_id, .. }
            | GameEventData::TowerSold { tower_id, .. }
            | GameEventData::TowerMoved { tower_id, .. } => Some(tower_id.0),
            _ => None,
        }
    }
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Entity involved (for tie-breaking)
    pub subject: Option<u32>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event; priority and subject come from the data.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self {
            tick,
            priority: data.priority(),
            subject: data.subject(),
            data,
        }
    }

    /// Create enemy defeated event.
    pub fn enemy_defeated(tick: u32, enemy_id: EnemyId, reward: u32, killed_by: Option<TowerId>) -> Self {
        Self::new(tick, GameEventData::EnemyDefeated { enemy_id, reward, killed_by })
    }

    /// Create enemy reached end event.
    pub fn enemy_reached_end(tick: u32, enemy_id: EnemyId, damage: u32, lives_left: u32) -> Self {
        Self::new(tick, GameEventData::EnemyReachedEnd { enemy_id, damage, lives_left })
    }

    /// Create enemy damaged event.
    pub fn enemy_damaged(
        tick: u32,
        enemy_id: EnemyId,
        tower_id: TowerId,
        amount: u32,
        health_percent: f64,
        splash: bool,
    ) -> Self {
        Self::new(
            tick,
            GameEventData::EnemyDamaged {
                enemy_id,
                tower_id,
                amount,
                health_percent,
                splash,
            },
        )
    }

    /// Create wave completed event.
    pub fn wave_completed(tick: u32, wave: u32, bonus: u32) -> Self {
        Self::new(tick, GameEventData::WaveCompleted { wave, bonus })
    }

    /// True for game over and victory.
    pub fn is_terminal(&self) -> bool {
        self.priority == EventPriority::Terminal
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.subject == other.subject
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then subject
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.subject.cmp(&other.subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let defeated = GameEvent::enemy_defeated(10, EnemyId(3), 10, None);
        let damaged = GameEvent::enemy_damaged(10, EnemyId(1), TowerId(1), 5, 50.0, false);
        let defeated_later = GameEvent::enemy_defeated(10, EnemyId(7), 10, None);
        let earlier = GameEvent::wave_completed(9, 1, 30);

        // Same tick, but removal < combat
        assert!(defeated < damaged);

        // Same tick and priority, lower enemy id first
        assert!(defeated < defeated_later);

        // Tick dominates
        assert!(earlier < defeated);
    }

    #[test]
    fn test_priority_from_data() {
        let over = GameEvent::new(1, GameEventData::GameOver { wave: 2 });
        assert!(over.is_terminal());
        assert_eq!(over.subject, None);

        let built = GameEvent::new(
            1,
            GameEventData::TowerBuilt {
                tower_id: TowerId(4),
                tower_type: "basic".into(),
                cell: Cell::new(1, 1),
                cost: 50,
            },
        );
        assert_eq!(built.priority, EventPriority::Command);
        assert_eq!(built.subject, Some(4));
    }
}
