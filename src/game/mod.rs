//! Game Logic Module
//!
//! All simulation code. No rendering, no I/O beyond config loading.
//!
//! ## Module Structure
//!
//! - `config`: JSON config schema, defaults and validation
//! - `map`: Grid, path and buildable mask
//! - `enemy`: Enemy types and the per-enemy state machine
//! - `tower`: Targeting, firing and upgrades
//! - `projectile`: Homing flight, impacts and splash
//! - `wave`: Wave spawner
//! - `state`: Game state aggregate
//! - `command`: Player commands
//! - `tick`: Ordered per-frame pipeline
//! - `events`: Game events for the UI layer and replay checks
//! - `snapshot`: Serialisable views for rendering
//! - `simulation`: Facade tying it all together

pub mod config;
pub mod map;
pub mod enemy;
pub mod tower;
pub mod projectile;
pub mod wave;
pub mod state;
pub mod command;
pub mod tick;
pub mod events;
pub mod snapshot;
pub mod simulation;

// Re-export key types
pub use config::{ConfigError, GameConfig, Settings};
pub use map::{GameMap, MapDefinition};
pub use enemy::{Enemy, EnemyId, EnemyType};
pub use tower::{TargetingPolicy, Tower, TowerId, TowerType};
pub use projectile::{Projectile, ProjectileId};
pub use wave::{SpawnGroup, WaveDefinition, WaveSpawner};
pub use state::{GamePhase, GameState};
pub use command::{Command, CommandError, CommandOutcome};
pub use tick::TickResult;
pub use events::{GameEvent, GameEventData};
pub use snapshot::GameSnapshot;
pub use simulation::Simulation;
