//! Grid Map
//!
//! Immutable map geometry: the grid, the enemy path, and the buildable mask.
//! The pixel polyline enemies walk is precomputed once from the cell path.

use serde::{Serialize, Deserialize};

use crate::core::grid::{Cell, cell_center, cell_from_pixel};
use crate::core::vec2::Vec2;
use crate::game::config::ConfigError;

/// Margin (pixels) a projectile may leave the board by before it is discarded.
pub const OUT_OF_BOUNDS_MARGIN: f64 = 50.0;

/// Largest accepted width or height, in cells.
pub const MAX_MAP_DIMENSION: u32 = 256;

/// Map section of the configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDefinition {
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
    /// Pixels per cell (coordinate conversion only)
    pub cell_size: f64,
    /// First path cell
    pub start_point: Cell,
    /// Last path cell
    pub end_point: Cell,
    /// Ordered path cells from start to end
    pub path: Vec<Cell>,
}

impl MapDefinition {
    /// Check the invariants every map must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::invalid("map.width", "must be positive"));
        }
        if self.height == 0 {
            return Err(ConfigError::invalid("map.height", "must be positive"));
        }
        if self.width > MAX_MAP_DIMENSION {
            return Err(ConfigError::invalid("map.width", format!("must be at most {}", MAX_MAP_DIMENSION)));
        }
        if self.height > MAX_MAP_DIMENSION {
            return Err(ConfigError::invalid("map.height", format!("must be at most {}", MAX_MAP_DIMENSION)));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::invalid("map.cellSize", "must be a positive number"));
        }

        let (first, last) = match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ConfigError::EmptyPath),
        };

        for (index, cell) in self.path.iter().enumerate() {
            if !self.contains(*cell) {
                return Err(ConfigError::PathOutOfBounds { index, cell: *cell });
            }
            if index > 0 && !self.path[index - 1].is_adjacent(*cell) {
                return Err(ConfigError::PathNotContiguous { index, cell: *cell });
            }
        }

        if first != self.start_point {
            return Err(ConfigError::EndpointMismatch { which: "startPoint" });
        }
        if last != self.end_point {
            return Err(ConfigError::EndpointMismatch { which: "endPoint" });
        }

        Ok(())
    }

    fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }
}

/// Runtime map with the buildable mask and pixel path precomputed.
#[derive(Clone, Debug)]
pub struct GameMap {
    definition: MapDefinition,
    /// Row-major: `buildable[y * width + x]`
    buildable: Vec<bool>,
    pixel_path: Vec<Vec2>,
}

impl GameMap {
    /// Build the runtime map from a definition, validating it first.
    pub fn new(definition: &MapDefinition) -> Result<Self, ConfigError> {
        definition.validate()?;

        let width = definition.width as usize;
        let mut buildable = vec![true; width * definition.height as usize];
        for cell in &definition.path {
            buildable[cell.y as usize * width + cell.x as usize] = false;
        }

        let pixel_path = definition
            .path
            .iter()
            .map(|cell| cell_center(*cell, definition.cell_size))
            .collect();

        Ok(Self {
            definition: definition.clone(),
            buildable,
            pixel_path,
        })
    }

    /// Width in cells.
    pub fn width(&self) -> u32 {
        self.definition.width
    }

    /// Height in cells.
    pub fn height(&self) -> u32 {
        self.definition.height
    }

    /// Pixels per cell.
    pub fn cell_size(&self) -> f64 {
        self.definition.cell_size
    }

    /// Board width in pixels.
    pub fn pixel_width(&self) -> f64 {
        self.definition.width as f64 * self.definition.cell_size
    }

    /// Board height in pixels.
    pub fn pixel_height(&self) -> f64 {
        self.definition.height as f64 * self.definition.cell_size
    }

    /// Start of the path.
    pub fn start_point(&self) -> Cell {
        self.definition.start_point
    }

    /// Exit of the path.
    pub fn end_point(&self) -> Cell {
        self.definition.end_point
    }

    /// Path cells in walking order.
    pub fn path(&self) -> &[Cell] {
        &self.definition.path
    }

    /// The underlying definition.
    pub fn definition(&self) -> &MapDefinition {
        &self.definition
    }

    /// Check if a cell lies on the grid.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.definition.contains(cell)
    }

    /// True for on-grid cells that are not part of the path.
    pub fn is_buildable(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.buildable[cell.y as usize * self.definition.width as usize + cell.x as usize]
    }

    /// True if the cell is part of the enemy path.
    pub fn is_path(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.is_buildable(cell)
    }

    /// Pixel coordinates of a cell's center.
    pub fn cell_center_pixel(&self, cell: Cell) -> Vec2 {
        cell_center(cell, self.definition.cell_size)
    }

    /// Cell containing a pixel position.
    pub fn cell_from_pixel(&self, p: Vec2) -> Cell {
        cell_from_pixel(p, self.definition.cell_size)
    }

    /// The polyline enemies walk (cell centers in path order).
    pub fn path_as_pixel_sequence(&self) -> &[Vec2] {
        &self.pixel_path
    }

    /// True if `p` is further than the allowed margin outside the board.
    pub fn is_far_out_of_bounds(&self, p: Vec2) -> bool {
        p.x < -OUT_OF_BOUNDS_MARGIN
            || p.y < -OUT_OF_BOUNDS_MARGIN
            || p.x > self.pixel_width() + OUT_OF_BOUNDS_MARGIN
            || p.y > self.pixel_height() + OUT_OF_BOUNDS_MARGIN
    }

    /// All buildable cells in row-major order.
    pub fn buildable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = self.definition.width as i32;
        let height = self.definition.height as i32;
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| Cell::new(x, y)))
            .filter(move |cell| self.is_buildable(*cell))
    }
}
