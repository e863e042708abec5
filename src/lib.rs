//! # Tower Siege
//!
//! Real-time tower-defense simulation core: a grid map with a fixed enemy
//! path, waves of enemies walking it, towers firing homing projectiles,
//! and the money/lives economy around them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TOWER SIEGE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/              - Primitives                             │
//! │  ├── vec2.rs        - 2D pixel-space vector                  │
//! │  ├── grid.rs        - Grid cells and pixel conversion        │
//! │  └── hash.rs        - State hashing for verification         │
//! │                                                              │
//! │  game/              - Game logic                             │
//! │  ├── config.rs      - JSON config and validation             │
//! │  ├── map.rs         - Path and buildable mask                │
//! │  ├── enemy.rs       - Enemy movement and damage              │
//! │  ├── tower.rs       - Targeting, firing, upgrades            │
//! │  ├── projectile.rs  - Homing flight and splash               │
//! │  ├── wave.rs        - Wave spawner                           │
//! │  ├── command.rs     - Player commands                        │
//! │  ├── events.rs      - Events emitted to hosts                │
//! │  ├── state.rs       - Mutable world state and phase          │
//! │  ├── snapshot.rs    - Read-only views for rendering          │
//! │  ├── tick.rs        - Ordered per-frame pipeline             │
//! │  └── simulation.rs  - Facade for hosts and UIs               │
//! │                                                              │
//! │  replay/            - Transcripts                            │
//! │  ├── transcript.rs  - Command log with hash checkpoints      │
//! │  ├── recorder.rs    - Records while playing                  │
//! │  └── verify.rs      - Replays and compares hashes            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The simulation is driven only by commands and host timestamps:
//! - Towers, enemies and projectiles live in id-ordered collections
//! - Ids are allocated from monotonic counters
//! - No randomness, no wall clock inside `game/`
//!
//! Replaying the same commands against the same config yields the same
//! state hash on the same platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::grid::Cell;
pub use crate::core::hash::StateHash;
pub use game::config::{ConfigError, GameConfig, Settings};
pub use game::command::{Command, CommandError, CommandOutcome};
pub use game::events::{GameEvent, GameEventData};
pub use game::simulation::Simulation;
pub use game::state::GamePhase;
pub use game::tick::TickResult;
pub use replay::{verify_transcript, Recorder, Transcript};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host frame rate the defaults are tuned for (Hz)
pub const REFERENCE_TICK_RATE: u32 = 60;
