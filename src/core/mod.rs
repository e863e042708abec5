//! Core primitives.
//!
//! Geometry, grid addressing and state hashing shared by every game module.
//! Nothing in here knows about towers or enemies.

pub mod vec2;
pub mod grid;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use grid::{Cell, cell_center, cell_from_pixel};
pub use hash::{StateHash, StateHasher, compute_state_hash};
