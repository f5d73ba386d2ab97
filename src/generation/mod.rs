//! # Generation Module
//!
//! Procedural layout generation: room placement followed by two corridor
//! carving strategies that join the rooms into one traversable structure.
//!
//! All passes mutate a shared [`Layout`]: the tile grid, the placed rooms, the
//! carved halls and the room connectivity model.

pub mod connectivity;
pub mod dungeon;
pub mod gravity;
pub mod paired;
pub mod rooms;

pub use connectivity::*;
pub use dungeon::*;
pub use gravity::*;
pub use paired::*;
pub use rooms::*;

use crate::grid::{Position, TileGrid, TileType};
use crate::utils::Vector2;
use crate::{BurrowError, BurrowResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for procedural generation.
///
/// Controls room sizes and spacing, the placement stopping condition, and the
/// tuning of the gravity walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Minimum room size along either axis
    pub min_room_size: i32,
    /// Maximum room size along either axis
    pub max_room_size: i32,
    /// Width of the no-spawn buffer kept around every placed room
    pub clearance: i32,
    /// Failed placement attempts, counted over the whole run, before placement stops
    pub max_failures: u32,
    /// Tiles a door must keep between itself and the border ring
    pub border_buffer: i32,
    /// Multiplier turning walk weights into integers before sampling
    pub walk_weight_scale: f64,
    /// Factor applied to the weight of the previous walk direction
    pub inertia_factor: f64,
}

impl GenerationConfig {
    /// Creates the default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert_eq!(config.min_room_size, 2);
    /// assert!(config.max_room_size >= config.min_room_size);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        Self {
            min_room_size: 2,
            max_room_size: 6,
            clearance: 3,
            max_failures: 15,
            border_buffer: 1,
            walk_weight_scale: 1000.0,
            inertia_factor: 2.0,
        }
    }

    /// Creates a configuration for testing with tighter packing and a larger
    /// failure budget, so small grids still get several rooms.
    pub fn for_testing() -> Self {
        Self {
            min_room_size: 2,
            max_room_size: 4,
            clearance: 2,
            max_failures: 40,
            ..Self::new()
        }
    }

    /// Checks that the values describe a usable configuration.
    pub fn validate(&self) -> BurrowResult<()> {
        if self.min_room_size < 1 {
            return Err(BurrowError::InvalidConfig(format!(
                "min_room_size must be at least 1, got {}",
                self.min_room_size
            )));
        }
        if self.max_room_size < self.min_room_size {
            return Err(BurrowError::InvalidConfig(format!(
                "max_room_size {} is smaller than min_room_size {}",
                self.max_room_size, self.min_room_size
            )));
        }
        if self.clearance < 0 || self.border_buffer < 0 {
            return Err(BurrowError::InvalidConfig(
                "clearance and border_buffer must not be negative".to_string(),
            ));
        }
        if !(self.walk_weight_scale > 0.0) || !(self.inertia_factor > 0.0) {
            return Err(BurrowError::InvalidConfig(
                "walk_weight_scale and inertia_factor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identifier of a room: its index in the layout's room list.
pub type RoomId = usize;

/// A placed rectangular room.
///
/// Rooms are values owned by the [`Layout`]; they are created by placement
/// and cleared all at once when the layout is regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier for this room
    pub id: RoomId,
    /// Top-left tile of the room
    pub position: Position,
    /// Width in tiles
    pub width: i32,
    /// Height in tiles
    pub height: i32,
    /// Corridor anchors published by the last walk pass, for debug overlays
    pub doors: Vec<Position>,
}

impl Room {
    /// Creates a new room with the given parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::{Position, Room};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 4, 3);
    /// assert_eq!(room.id, 1);
    /// assert_eq!(room.area(), 12);
    /// assert!(room.contains(Position::new(8, 7)));
    /// assert!(!room.contains(Position::new(9, 7)));
    /// ```
    pub fn new(id: RoomId, position: Position, width: i32, height: i32) -> Self {
        Self {
            id,
            position,
            width,
            height,
            doors: Vec::new(),
        }
    }

    /// Gets the bottom-right tile of the room.
    pub fn bottom_right(&self) -> Position {
        Position::new(
            self.position.x + self.width - 1,
            self.position.y + self.height - 1,
        )
    }

    /// Geometric center in tile units (not snapped to a tile).
    pub fn center(&self) -> Vector2 {
        Vector2::new(
            self.position.x as f64 + self.width as f64 / 2.0,
            self.position.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Gets the area of the room in tiles.
    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Checks if a position is inside this room.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.position.x
            && pos.y >= self.position.y
            && pos.x < self.position.x + self.width
            && pos.y < self.position.y + self.height
    }

    /// Checks if a position is on the outermost ring of this room.
    pub fn is_boundary(&self, pos: Position) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let bottom_right = self.bottom_right();
        pos.x == self.position.x
            || pos.y == self.position.y
            || pos.x == bottom_right.x
            || pos.y == bottom_right.y
    }

    /// Gets all positions within this room, row by row.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(self.area().max(0) as usize);
        for y in self.position.y..self.position.y + self.height {
            for x in self.position.x..self.position.x + self.width {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Whether `pos` falls within `distance` tiles of this room on every axis.
    pub fn within_distance(&self, pos: Position, distance: i32) -> bool {
        pos.x >= self.position.x - distance
            && pos.y >= self.position.y - distance
            && pos.x < self.position.x + self.width + distance
            && pos.y < self.position.y + self.height + distance
    }

    /// Boundary tiles usable as door anchors by the paired connector.
    ///
    /// Top and bottom rows first, then the side columns without their corners.
    /// Tiles closer than `border_buffer` to the border ring are skipped.
    pub fn boundary_doors(&self, grid: &TileGrid, border_buffer: i32) -> Vec<Position> {
        let bottom_right = self.bottom_right();
        let mut doors = Vec::new();

        for y in edge_lines(self.position.y, bottom_right.y) {
            for x in self.position.x..=bottom_right.x {
                doors.push(Position::new(x, y));
            }
        }
        for x in edge_lines(self.position.x, bottom_right.x) {
            for y in (self.position.y + 1)..bottom_right.y {
                doors.push(Position::new(x, y));
            }
        }

        doors.retain(|&pos| grid.is_clear_of_border(pos, border_buffer));
        doors
    }

    /// Tiles just outside the room's four sides, used by the gravity walk.
    ///
    /// Corners are excluded; tiles closer than `border_buffer` to the border
    /// ring are skipped.
    pub fn outer_doors(&self, grid: &TileGrid, border_buffer: i32) -> Vec<Position> {
        let bottom_right = self.bottom_right();
        let mut doors = Vec::new();

        for y in [self.position.y - 1, bottom_right.y + 1] {
            for x in self.position.x..=bottom_right.x {
                doors.push(Position::new(x, y));
            }
        }
        for x in [self.position.x - 1, bottom_right.x + 1] {
            for y in self.position.y..=bottom_right.y {
                doors.push(Position::new(x, y));
            }
        }

        doors.retain(|&pos| grid.is_clear_of_border(pos, border_buffer));
        doors
    }
}

/// The first and last line of a span, once when they coincide.
fn edge_lines(first: i32, last: i32) -> Vec<i32> {
    if first == last {
        vec![first]
    } else {
        vec![first, last]
    }
}

/// A door candidate: a tile coordinate and the room it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Door {
    pub position: Position,
    pub room: RoomId,
}

impl Door {
    /// Creates a new door candidate.
    pub fn new(position: Position, room: RoomId) -> Self {
        Self { position, room }
    }
}

/// Which pass carved a hall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HallKind {
    /// Straight, L or Z corridor between two paired doors
    Paired,
    /// Gravity-biased random walk
    Walk,
}

/// A committed set of carved ground tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    /// Tile indices of the hall
    pub tiles: BTreeSet<usize>,
    /// Room the hall was carved from
    pub origin: RoomId,
    /// Pass that carved the hall
    pub kind: HallKind,
}

impl Hall {
    /// Whether the hall covers the given tile.
    pub fn contains(&self, index: usize) -> bool {
        self.tiles.contains(&index)
    }
}

/// Everything the generation passes share and mutate.
#[derive(Debug, Clone)]
pub struct Layout {
    /// The tile grid
    pub grid: TileGrid,
    /// Placed rooms, indexed by [`RoomId`]
    pub rooms: Vec<Room>,
    /// Committed halls in carving order
    pub halls: Vec<Hall>,
    /// Which rooms are known to be joined
    pub connectivity: RoomConnectivity,
}

impl Layout {
    /// Wraps a grid with no rooms or halls.
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            rooms: Vec::new(),
            halls: Vec::new(),
            connectivity: RoomConnectivity::new(0),
        }
    }

    /// Fills the grid with wall and forgets every room and hall.
    pub fn clear(&mut self) {
        self.grid.reset();
        self.rooms.clear();
        self.halls.clear();
        self.connectivity.reset(0);
    }

    /// Installs a freshly placed room list, each room its own component.
    pub fn set_rooms(&mut self, rooms: Vec<Room>) {
        self.connectivity.reset(rooms.len());
        self.rooms = rooms;
    }

    /// Paints a hall as ground and records it.
    pub fn commit_hall(&mut self, tiles: BTreeSet<usize>, origin: RoomId, kind: HallKind) {
        self.grid.paint(tiles.iter().copied(), TileType::Ground);
        self.halls.push(Hall {
            tiles,
            origin,
            kind,
        });
    }

    /// Index of the first hall covering `index`.
    pub fn hall_at(&self, index: usize) -> Option<usize> {
        self.halls.iter().position(|hall| hall.contains(index))
    }

    /// Whether every room shares one component.
    pub fn is_fully_connected(&self) -> bool {
        self.connectivity.is_fully_connected()
    }

    /// Number of room components.
    pub fn component_count(&self) -> usize {
        self.connectivity.component_count()
    }
}

/// Counters describing one connector pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStats {
    /// Halls committed to the grid
    pub halls_carved: usize,
    /// Doors taken from the pool
    pub doors_used: usize,
    /// Walks abandoned at a dead end, or doors dropped without a partner
    pub abandoned: usize,
    /// Components left when the pass finished
    pub components: usize,
}

/// Trait for corridor carving strategies.
///
/// Each connector joins still-disconnected rooms of a [`Layout`], carving
/// ground and merging connectivity as it goes. Running out of doors leaves the
/// layout partially connected; that is reported, not treated as an error.
pub trait Connector {
    /// Carves halls until every room is connected or the door pool runs dry.
    fn connect(&self, layout: &mut Layout, rng: &mut StdRng) -> ConnectorStats;

    /// Gets the connector type name for logging and debugging.
    fn connector_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Whether two rooms keep each other out of their no-spawn buffers.
    pub fn rooms_respect_clearance(first: &Room, second: &Room, clearance: i32) -> bool {
        !first
            .positions()
            .into_iter()
            .any(|pos| second.within_distance(pos, clearance))
            && !second
                .positions()
                .into_iter()
                .any(|pos| first.within_distance(pos, clearance))
    }

    /// Validates the invariants every generation pass must preserve.
    ///
    /// Border tiles are walls, rooms sit strictly inside the border and every
    /// room tile is ground.
    pub fn validate_layout(layout: &Layout) -> BurrowResult<()> {
        let grid = &layout.grid;

        for index in 0..grid.tile_count() {
            let pos = grid
                .index_to_coord(index)
                .ok_or_else(|| BurrowError::InvalidState(format!("tile {index} has no coordinate")))?;
            if grid.is_border(pos) && grid.tile_at(index) != Some(TileType::Wall) {
                return Err(BurrowError::InvalidState(format!(
                    "border tile ({}, {}) is not a wall",
                    pos.x, pos.y
                )));
            }
        }

        for room in &layout.rooms {
            let bottom_right = room.bottom_right();
            if room.position.x < 1
                || room.position.y < 1
                || bottom_right.x > grid.cols() - 2
                || bottom_right.y > grid.rows() - 2
            {
                return Err(BurrowError::InvalidState(format!(
                    "room {} at ({}, {}) leaves the interior",
                    room.id, room.position.x, room.position.y
                )));
            }
            if room
                .positions()
                .into_iter()
                .any(|pos| grid.tile_at_position(pos) != Some(TileType::Ground))
            {
                return Err(BurrowError::InvalidState(format!(
                    "room {} has a tile that is not ground",
                    room.id
                )));
            }
        }

        if layout.connectivity.len() != layout.rooms.len() {
            return Err(BurrowError::InvalidState(format!(
                "connectivity tracks {} rooms but the layout has {}",
                layout.connectivity.len(),
                layout.rooms.len()
            )));
        }

        Ok(())
    }
}
