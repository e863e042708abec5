//! Grid Coordinates
//!
//! Integer cell addressing and the cell <-> pixel conversions shared by
//! the map, tower placement and the config loader.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// One grid cell, addressed by integer column (`x`) and row (`y`).
///
/// Ordered row-major so cells can key a BTreeMap/BTreeSet deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

impl Cell {
    /// Create a cell coordinate.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True if `other` is exactly one orthogonal grid step away.
    #[inline]
    pub fn is_adjacent(self, other: Cell) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }

    /// Pixel coordinates of this cell's center.
    #[inline]
    pub fn center(self, cell_size: f64) -> Vec2 {
        cell_center(self, cell_size)
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Pixel coordinates of the center of `cell`.
#[inline]
pub fn cell_center(cell: Cell, cell_size: f64) -> Vec2 {
    Vec2::new(
        (cell.x as f64 + 0.5) * cell_size,
        (cell.y as f64 + 0.5) * cell_size,
    )
}

/// Cell containing the pixel position `p` (floor division by `cell_size`).
#[inline]
pub fn cell_from_pixel(p: Vec2, cell_size: f64) -> Cell {
    Cell::new(
        (p.x / cell_size).floor() as i32,
        (p.y / cell_size).floor() as i32,
    )
}
