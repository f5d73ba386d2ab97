//! # Tile Grid
//!
//! The flat row-major tile array every pass paints into, and the conversions
//! between tile indices, tile coordinates and pixel positions.

use crate::config::MIN_GRID_DIMENSION;
use crate::{BurrowError, BurrowResult, Position, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of tiles a grid cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Walkable floor of a room or hall
    Ground,
    /// Solid rock
    Wall,
    /// Reserved; never produced by generation and never walkable
    Water,
}

impl TileType {
    /// Whether units and paths may occupy this tile.
    pub fn is_passable(self) -> bool {
        self == TileType::Ground
    }

    /// Character used by the text dump.
    pub fn glyph(self) -> char {
        match self {
            TileType::Ground => '.',
            TileType::Wall => '#',
            TileType::Water => '~',
        }
    }
}

/// An obstacle painted as wall onto the open arena grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obstacle {
    /// A single wall tile
    Tile { x: i32, y: i32 },
    /// A filled rectangle of wall tiles
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

impl Obstacle {
    /// Every tile coordinate this obstacle covers.
    pub fn positions(&self) -> Vec<Position> {
        match *self {
            Obstacle::Tile { x, y } => vec![Position::new(x, y)],
            Obstacle::Rect {
                x,
                y,
                width,
                height,
            } => (y..y + height)
                .flat_map(|row| (x..x + width).map(move |col| Position::new(col, row)))
                .collect(),
        }
    }
}

/// Fixed-size grid of tiles stored row-major.
///
/// # Examples
///
/// ```
/// use burrow::{Position, TileGrid, TileType};
///
/// let grid = TileGrid::arena(10, 8, 1.0, 1.0).unwrap();
/// let index = grid.coord_to_index(3, 2).unwrap();
/// assert_eq!(index, 3 + 2 * 10);
/// assert_eq!(grid.index_to_coord(index), Some(Position::new(3, 2)));
/// assert_eq!(grid.tile_at(index), Some(TileType::Ground));
/// assert_eq!(grid.coord_to_index(10, 0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    cols: i32,
    rows: i32,
    tile_width: f64,
    tile_height: f64,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Creates a grid of solid wall.
    ///
    /// `tile_width` and `tile_height` are the pixel size of one tile; they only
    /// affect pixel conversions and path costs, never the layout.
    pub fn new(cols: i32, rows: i32, tile_width: f64, tile_height: f64) -> BurrowResult<Self> {
        if cols < MIN_GRID_DIMENSION || rows < MIN_GRID_DIMENSION {
            return Err(BurrowError::InvalidDimensions { cols, rows });
        }
        if !(tile_width > 0.0 && tile_height > 0.0) {
            return Err(BurrowError::InvalidConfig(format!(
                "tile size must be positive, got {tile_width}x{tile_height}"
            )));
        }

        let tile_count = cols
            .checked_mul(rows)
            .ok_or(BurrowError::InvalidDimensions { cols, rows })?;

        Ok(Self {
            cols,
            rows,
            tile_width,
            tile_height,
            tiles: vec![TileType::Wall; tile_count as usize],
        })
    }

    /// Creates a wall grid whose tile size is derived from a window size.
    pub fn for_window(cols: i32, rows: i32, window_width: f64, window_height: f64) -> BurrowResult<Self> {
        if cols < MIN_GRID_DIMENSION || rows < MIN_GRID_DIMENSION {
            return Err(BurrowError::InvalidDimensions { cols, rows });
        }
        Self::new(cols, rows, window_width / cols as f64, window_height / rows as f64)
    }

    /// Creates an open arena: border walls around a ground interior.
    pub fn arena(cols: i32, rows: i32, tile_width: f64, tile_height: f64) -> BurrowResult<Self> {
        let mut grid = Self::new(cols, rows, tile_width, tile_height)?;
        grid.fill_arena();
        Ok(grid)
    }

    /// Resets every tile to wall.
    pub fn reset(&mut self) {
        self.tiles.fill(TileType::Wall);
    }

    /// Turns the grid back into an open arena.
    pub fn fill_arena(&mut self) {
        for index in 0..self.tiles.len() {
            let pos = self.index_position(index);
            self.tiles[index] = if self.is_border(pos) {
                TileType::Wall
            } else {
                TileType::Ground
            };
        }
    }

    /// Paints the given obstacles as wall.
    ///
    /// Fails without painting anything if any obstacle tile lies outside the grid.
    pub fn apply_obstacles(&mut self, obstacles: &[Obstacle]) -> BurrowResult<()> {
        let mut indices = Vec::new();
        for obstacle in obstacles {
            for pos in obstacle.positions() {
                let index = self
                    .position_to_index(pos)
                    .ok_or(BurrowError::InvalidCoordinate { x: pos.x, y: pos.y })?;
                indices.push(index);
            }
        }
        self.paint(indices, TileType::Wall);
        Ok(())
    }

    /// Number of tiles in one row.
    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Total tile count, `cols * rows`.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Pixel size of one tile as `(width, height)`.
    pub fn tile_size(&self) -> (f64, f64) {
        (self.tile_width, self.tile_height)
    }

    /// Raw tile storage in index order.
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// Gets the tile at an index.
    pub fn tile_at(&self, index: usize) -> Option<TileType> {
        self.tiles.get(index).copied()
    }

    /// Gets the tile at a coordinate.
    pub fn tile_at_position(&self, pos: Position) -> Option<TileType> {
        self.position_to_index(pos).map(|index| self.tiles[index])
    }

    /// Sets the tile at an index.
    pub fn set_tile(&mut self, index: usize, tile: TileType) -> BurrowResult<()> {
        let tile_count = self.tiles.len();
        let slot = self
            .tiles
            .get_mut(index)
            .ok_or(BurrowError::InvalidIndex { index, tile_count })?;
        *slot = tile;
        Ok(())
    }

    /// Sets the tile at a coordinate.
    pub fn set_tile_at(&mut self, pos: Position, tile: TileType) -> BurrowResult<()> {
        let index = self
            .position_to_index(pos)
            .ok_or(BurrowError::InvalidCoordinate { x: pos.x, y: pos.y })?;
        self.tiles[index] = tile;
        Ok(())
    }

    /// Sets every in-range index to `tile`; out-of-range indices are skipped.
    pub fn paint<I>(&mut self, indices: I, tile: TileType)
    where
        I: IntoIterator<Item = usize>,
    {
        for index in indices {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = tile;
            }
        }
    }

    /// Whether the coordinate lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.cols && pos.y < self.rows
    }

    /// Whether the coordinate is on the outermost ring.
    pub fn is_border(&self, pos: Position) -> bool {
        self.contains(pos)
            && (pos.x == 0 || pos.y == 0 || pos.x == self.cols - 1 || pos.y == self.rows - 1)
    }

    /// Whether the coordinate is at least `buffer` tiles clear of the border ring.
    pub fn is_clear_of_border(&self, pos: Position, buffer: i32) -> bool {
        pos.x > buffer && pos.y > buffer && pos.x < self.cols - buffer - 1 && pos.y < self.rows - buffer - 1
    }

    /// Whether the tile at `index` can be walked on.
    pub fn is_passable(&self, index: usize) -> bool {
        self.tile_at(index).is_some_and(TileType::is_passable)
    }

    /// Converts a coordinate to an index, or `None` when out of bounds.
    pub fn coord_to_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.cols || y >= self.rows {
            return None;
        }
        Some((x + y * self.cols) as usize)
    }

    /// Converts a position to an index, or `None` when out of bounds.
    pub fn position_to_index(&self, pos: Position) -> Option<usize> {
        self.coord_to_index(pos.x, pos.y)
    }

    /// Converts an index back to its coordinate, or `None` when out of bounds.
    pub fn index_to_coord(&self, index: usize) -> Option<Position> {
        (index < self.tiles.len()).then(|| self.index_position(index))
    }

    fn index_position(&self, index: usize) -> Position {
        let index = index as i32;
        Position::new(index % self.cols, index / self.cols)
    }

    /// Finds the tile under a pixel, or `None` outside the grid.
    pub fn pixel_to_index(&self, pixel_x: f64, pixel_y: f64) -> Option<usize> {
        // Also rejects NaN.
        if !(pixel_x >= 0.0 && pixel_y >= 0.0) {
            return None;
        }
        let x = (pixel_x / self.tile_width).floor();
        let y = (pixel_y / self.tile_height).floor();
        if x >= self.cols as f64 || y >= self.rows as f64 {
            return None;
        }
        self.coord_to_index(x as i32, y as i32)
    }

    /// Pixel position of a tile's top-left corner.
    pub fn tile_origin_pixel(&self, index: usize) -> Option<Vector2> {
        self.index_to_coord(index).map(|pos| {
            Vector2::new(
                pos.x as f64 * self.tile_width,
                pos.y as f64 * self.tile_height,
            )
        })
    }

    /// Pixel position of a tile's center.
    pub fn tile_center_pixel(&self, index: usize) -> Option<Vector2> {
        self.tile_origin_pixel(index).map(|origin| {
            origin + Vector2::new(self.tile_width / 2.0, self.tile_height / 2.0)
        })
    }

    /// Counts tiles of the given type.
    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.cols as usize) {
            let line: String = row.iter().map(|tile| tile.glyph()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
