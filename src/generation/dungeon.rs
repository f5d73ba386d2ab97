//! # Dungeon
//!
//! The simulation context: owns the layout and the random stream, runs the
//! generation passes in order and answers path queries on the result.
//!
//! Before the first generation the grid is an open arena with the configured
//! obstacles. Each generation pass resets every tile to wall, places rooms,
//! then runs the paired-door connector followed by the gravity-walk connector.

use crate::config::{
    DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_SEED, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, MIN_GRID_DIMENSION,
};
use crate::generation::utils::{create_rng, validate_layout};
use crate::generation::{
    Connector, ConnectorStats, GenerationConfig, GravityWalkConnector, Hall, Layout, PairedDoorConnector, Room,
    RoomId, RoomPlacer,
};
use crate::grid::{Obstacle, Position, TileGrid, TileType};
use crate::utils::{DiagonalPolicy, PathFinder, Vector2};
use crate::{BurrowError, BurrowResult};
use log::info;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time configuration for a [`Dungeon`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Tiles per row
    pub cols: i32,
    /// Tiles per column
    pub rows: i32,
    /// Window width in pixels; only sizes a tile
    pub window_width: f64,
    /// Window height in pixels; only sizes a tile
    pub window_height: f64,
    /// Wall shapes painted onto the arena before the first generation
    pub obstacles: Vec<Obstacle>,
    /// Corner-cutting rule for path queries
    pub diagonal_policy: DiagonalPolicy,
    /// Room placement and corridor tuning
    pub generation: GenerationConfig,
}

impl DungeonConfig {
    /// Creates a configuration for a grid of the given size with no obstacles.
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            obstacles: Vec::new(),
            ..Self::default()
        }
    }

    /// Creates a small configuration with packed rooms, for tests.
    pub fn for_testing() -> Self {
        Self {
            generation: GenerationConfig::for_testing(),
            ..Self::new(20, 20)
        }
    }

    /// Loads a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> BurrowResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses a configuration from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> BurrowResult<Self> {
        serde_json::from_str(json).map_err(BurrowError::from)
    }

    /// Checks dimensions, pixel scale and generation tuning.
    pub fn validate(&self) -> BurrowResult<()> {
        if self.cols < MIN_GRID_DIMENSION || self.rows < MIN_GRID_DIMENSION {
            return Err(BurrowError::InvalidDimensions {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !(self.window_width > 0.0 && self.window_height > 0.0) {
            return Err(BurrowError::InvalidConfig(format!(
                "window size must be positive, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        self.generation.validate()
    }
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            obstacles: vec![
                Obstacle::Rect {
                    x: 12,
                    y: 1,
                    width: 1,
                    height: 9,
                },
                Obstacle::Rect {
                    x: 13,
                    y: 9,
                    width: 3,
                    height: 1,
                },
            ],
            diagonal_policy: DiagonalPolicy::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Outcome of one generation pass.
///
/// Running out of placement attempts and ending with several components are
/// normal results, reported here rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Seed the stream was last reset with
    pub seed: u64,
    /// Rooms that fit on the grid
    pub rooms_placed: usize,
    /// Candidate rectangles drawn, successful or not
    pub placement_attempts: u32,
    /// Candidates that could not be placed
    pub placement_failures: u32,
    /// Paired-door connector counters
    pub paired: ConnectorStats,
    /// Gravity-walk connector counters
    pub walk: ConnectorStats,
    /// Room components after both connectors
    pub components: usize,
    /// Whether every room ended in one component
    pub fully_connected: bool,
}

/// Serializable view of a generated layout, for debug overlays and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    /// Seed the layout was generated from
    pub seed: u64,
    /// Tiles after every pass
    pub grid: TileGrid,
    /// Placed rooms, indexed by `RoomId`
    pub rooms: Vec<Room>,
    /// Halls from both connectors, in carving order
    pub halls: Vec<Hall>,
    /// Room ids grouped by connected component
    pub components: Vec<Vec<RoomId>>,
}

impl LayoutSnapshot {
    /// Renders the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> BurrowResult<String> {
        serde_json::to_string_pretty(self).map_err(BurrowError::from)
    }
}

/// Kinds of unit that can stand on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Player,
    Enemy,
}

/// A unit standing on one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    /// Tile index the unit occupies
    pub tile: usize,
}

impl Unit {
    /// Places a unit on an open tile.
    pub fn spawn(grid: &TileGrid, kind: UnitKind, tile: usize) -> BurrowResult<Self> {
        let mut unit = Self { kind, tile };
        if !unit.move_to(grid, tile)? {
            return Err(BurrowError::InvalidState(format!(
                "cannot spawn {kind:?} on blocked tile {tile}"
            )));
        }
        Ok(unit)
    }

    /// Moves the unit to `index` if that tile is open.
    ///
    /// Returns `Ok(false)` and leaves the unit where it was when the tile is
    /// blocked.
    pub fn move_to(&mut self, grid: &TileGrid, index: usize) -> BurrowResult<bool> {
        let tile = grid.tile_at(index).ok_or(BurrowError::InvalidIndex {
            index,
            tile_count: grid.tile_count(),
        })?;
        if !tile.is_passable() {
            return Ok(false);
        }
        self.tile = index;
        Ok(true)
    }

    /// Coordinate of the unit's tile.
    pub fn position(&self, grid: &TileGrid) -> Option<Position> {
        grid.index_to_coord(self.tile)
    }
}

/// Generated dungeon: the layout plus the random stream that produced it.
///
/// # Examples
///
/// ```
/// use burrow::{Dungeon, DungeonConfig};
///
/// let mut dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
/// let first = dungeon.reset_generator(42).unwrap();
/// let tiles = dungeon.grid().tiles().to_vec();
///
/// // The same seed replays the same layout
/// let again = dungeon.reset_generator(42).unwrap();
/// assert_eq!(first, again);
/// assert_eq!(dungeon.grid().tiles(), &tiles[..]);
/// ```
#[derive(Debug, Clone)]
pub struct Dungeon {
    config: DungeonConfig,
    layout: Layout,
    rng: StdRng,
    seed: u64,
}

impl Dungeon {
    /// Builds the open arena described by `config`, seeded with the default seed.
    pub fn new(config: DungeonConfig) -> BurrowResult<Self> {
        config.validate()?;
        let mut grid = TileGrid::for_window(config.cols, config.rows, config.window_width, config.window_height)?;
        grid.fill_arena();
        grid.apply_obstacles(&config.obstacles)?;

        Ok(Self {
            config,
            layout: Layout::new(grid),
            rng: create_rng(DEFAULT_SEED),
            seed: DEFAULT_SEED,
        })
    }

    /// Reseeds the random stream, then regenerates.
    pub fn reset_generator(&mut self, seed: u64) -> BurrowResult<GenerationReport> {
        self.seed = seed;
        self.rng = create_rng(seed);
        self.regenerate()
    }

    /// Regenerates the layout, continuing the current random stream.
    ///
    /// Repeated calls produce different layouts; use
    /// [`reset_generator`](Self::reset_generator) to replay one.
    pub fn regenerate(&mut self) -> BurrowResult<GenerationReport> {
        let generation = &self.config.generation;
        self.layout.clear();

        let placement = RoomPlacer::new().place_rooms(&mut self.layout.grid, generation, &mut self.rng);
        let rooms_placed = placement.rooms.len();
        self.layout.set_rooms(placement.rooms);

        let paired = PairedDoorConnector::new(generation.border_buffer).connect(&mut self.layout, &mut self.rng);
        let walk = GravityWalkConnector::new(generation).connect(&mut self.layout, &mut self.rng);

        validate_layout(&self.layout)?;

        let report = GenerationReport {
            seed: self.seed,
            rooms_placed,
            placement_attempts: placement.attempts,
            placement_failures: placement.failures,
            paired,
            walk,
            components: self.layout.component_count(),
            fully_connected: self.layout.is_fully_connected(),
        };
        info!(
            "Generated {} rooms and {} halls ({} components, seed {})",
            report.rooms_placed,
            self.layout.halls.len(),
            report.components,
            report.seed
        );
        Ok(report)
    }

    /// Finds a path between two tile indices with the configured diagonal policy.
    pub fn find_path(&self, start: usize, end: usize) -> BurrowResult<Vec<usize>> {
        PathFinder::new(self.config.diagonal_policy).find_path(&self.layout.grid, start, end)
    }

    /// Finds a path from one unit's tile to another's.
    pub fn path_between(&self, from: &Unit, to: &Unit) -> BurrowResult<Vec<usize>> {
        self.find_path(from.tile, to.tile)
    }

    /// Player in the first room and enemy in the last, or `None` with no rooms.
    pub fn spawn_units(&self) -> BurrowResult<Option<(Unit, Unit)>> {
        let (Some(first), Some(last)) = (self.layout.rooms.first(), self.layout.rooms.last()) else {
            return Ok(None);
        };
        let grid = &self.layout.grid;
        let player_tile = grid
            .position_to_index(first.position)
            .ok_or(BurrowError::InvalidCoordinate {
                x: first.position.x,
                y: first.position.y,
            })?;
        let corner = last.bottom_right();
        let enemy_tile = grid
            .position_to_index(corner)
            .ok_or(BurrowError::InvalidCoordinate { x: corner.x, y: corner.y })?;

        Ok(Some((
            Unit::spawn(grid, UnitKind::Player, player_tile)?,
            Unit::spawn(grid, UnitKind::Enemy, enemy_tile)?,
        )))
    }

    /// Serializable view of the current layout.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            seed: self.seed,
            grid: self.layout.grid.clone(),
            rooms: self.layout.rooms.clone(),
            halls: self.layout.halls.clone(),
            components: self.layout.connectivity.components(),
        }
    }

    /// Configuration the dungeon was built with.
    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    /// Current tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.layout.grid
    }

    /// Rooms placed by the last generation.
    pub fn rooms(&self) -> &[Room] {
        &self.layout.rooms
    }

    /// Halls carved by the last generation.
    pub fn halls(&self) -> &[Hall] {
        &self.layout.halls
    }

    /// Full layout, including connectivity.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Seed the stream was last reset with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Tile at an index, or `None` outside the grid.
    pub fn tile_at(&self, index: usize) -> Option<TileType> {
        self.layout.grid.tile_at(index)
    }

    /// Pixel center of a tile, or `None` outside the grid.
    pub fn tile_center_pixel(&self, index: usize) -> Option<Vector2> {
        self.layout.grid.tile_center_pixel(index)
    }

    /// Whether all rooms share one component.
    pub fn is_fully_connected(&self) -> bool {
        self.layout.is_fully_connected()
    }

    /// Number of room components; zero rooms give zero.
    pub fn component_count(&self) -> usize {
        self.layout.component_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DungeonConfig::default();
        assert_eq!((config.cols, config.rows), (25, 25));
        assert_eq!(config.obstacles.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            DungeonConfig::new(2, 10).validate(),
            Err(BurrowError::InvalidDimensions { cols: 2, rows: 10 })
        ));

        let mut config = DungeonConfig::new(10, 10);
        config.window_width = 0.0;
        assert!(matches!(config.validate(), Err(BurrowError::InvalidConfig(_))));

        let mut config = DungeonConfig::new(10, 10);
        config.generation.min_room_size = 0;
        assert!(Dungeon::new(config).is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = DungeonConfig::from_json(r#"{"cols": 30, "generation": {"clearance": 2}}"#).unwrap();
        assert_eq!(config.cols, 30);
        assert_eq!(config.rows, 25);
        assert_eq!(config.generation.clearance, 2);
        assert_eq!(config.generation.max_failures, 15);

        assert!(matches!(
            DungeonConfig::from_json("{not json"),
            Err(BurrowError::Serde(_))
        ));
        assert!(matches!(
            DungeonConfig::from_json_file("/nonexistent/burrow.json"),
            Err(BurrowError::Io(_))
        ));
    }

    #[test]
    fn test_arena_start_state() {
        let dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
        let grid = dungeon.grid();

        assert_eq!(grid.tile_size(), (32.0, 32.0));
        assert_eq!(dungeon.tile_at(grid.coord_to_index(12, 5).unwrap()), Some(TileType::Wall));
        assert_eq!(dungeon.tile_at(grid.coord_to_index(14, 9).unwrap()), Some(TileType::Wall));
        assert_eq!(dungeon.tile_at(grid.coord_to_index(5, 5).unwrap()), Some(TileType::Ground));
        assert_eq!(dungeon.tile_at(0), Some(TileType::Wall));
        assert!(dungeon.rooms().is_empty());
        assert_eq!(dungeon.seed(), DEFAULT_SEED);

        let center = dungeon.tile_center_pixel(grid.coord_to_index(1, 2).unwrap()).unwrap();
        assert_eq!(center, Vector2::new(48.0, 80.0));
    }

    #[test]
    fn test_obstacle_outside_grid_rejected() {
        let mut config = DungeonConfig::new(10, 10);
        config.obstacles.push(Obstacle::Tile { x: 12, y: 3 });
        assert!(matches!(
            Dungeon::new(config),
            Err(BurrowError::InvalidCoordinate { x: 12, y: 3 })
        ));
    }

    #[test]
    fn test_generation_clears_arena() {
        let mut dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
        let report = dungeon.reset_generator(2024).unwrap();

        assert!(report.rooms_placed >= 1);
        assert_eq!(report.placement_failures, 15);
        assert_eq!(report.components, dungeon.component_count());
        assert_eq!(report.fully_connected, dungeon.is_fully_connected());
        assert_eq!(dungeon.rooms().len(), report.rooms_placed);
        assert!(validate_layout(dungeon.layout()).is_ok());
    }

    #[test]
    fn test_accessors_agree_with_layout() {
        let mut dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
        let report = dungeon.reset_generator(31).unwrap();
        let layout = dungeon.layout();

        assert_eq!(dungeon.config(), &DungeonConfig::default());
        assert_eq!(dungeon.grid(), &layout.grid);
        assert_eq!(dungeon.rooms(), layout.rooms.as_slice());
        assert_eq!(dungeon.halls(), layout.halls.as_slice());
        assert_eq!(
            report.placement_attempts,
            report.placement_failures + report.rooms_placed as u32
        );
        assert_eq!(report.fully_connected, report.components <= 1);

        let count = dungeon.grid().tile_count();
        assert_eq!(dungeon.tile_at(count), None);
        assert_eq!(dungeon.tile_center_pixel(count), None);
    }

    #[test]
    fn test_regenerate_replays_after_reset() {
        let mut replay = Dungeon::new(DungeonConfig::default()).unwrap();
        replay.reset_generator(9).unwrap();
        replay.regenerate().unwrap();
        let second = replay.grid().clone();

        let mut other = Dungeon::new(DungeonConfig::default()).unwrap();
        other.reset_generator(9).unwrap();
        other.regenerate().unwrap();
        assert_eq!(other.grid(), &second);
        assert_eq!(other.seed(), 9);
    }

    #[test]
    fn test_units_and_paths() {
        let mut dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
        dungeon.reset_generator(31).unwrap();
        let (player, enemy) = dungeon.spawn_units().unwrap().unwrap();

        assert_eq!(player.kind, UnitKind::Player);
        assert_eq!(enemy.kind, UnitKind::Enemy);
        assert_eq!(dungeon.path_between(&player, &player).unwrap(), vec![player.tile]);

        let last_room = dungeon.rooms().len() - 1;
        if dungeon.layout().connectivity.connected(0, last_room) {
            let path = dungeon.path_between(&enemy, &player).unwrap();
            assert_eq!(path.first(), Some(&enemy.tile));
            assert_eq!(path.last(), Some(&player.tile));
        }
    }

    #[test]
    fn test_unit_move_rules() {
        let grid = TileGrid::arena(6, 6, 1.0, 1.0).unwrap();
        let mut unit = Unit::spawn(&grid, UnitKind::Player, 7).unwrap();

        assert!(unit.move_to(&grid, 8).unwrap());
        assert_eq!(unit.tile, 8);
        assert!(!unit.move_to(&grid, 0).unwrap());
        assert_eq!(unit.tile, 8);
        assert!(matches!(
            unit.move_to(&grid, 36),
            Err(BurrowError::InvalidIndex { index: 36, .. })
        ));
        assert_eq!(unit.position(&grid), Some(Position::new(2, 1)));
        assert!(Unit::spawn(&grid, UnitKind::Enemy, 5).is_err());
    }

    #[test]
    fn test_no_rooms_without_units() {
        let dungeon = Dungeon::new(DungeonConfig::new(8, 8)).unwrap();
        assert_eq!(dungeon.spawn_units().unwrap(), None);
    }

    #[test]
    fn test_snapshot_json() {
        let mut dungeon = Dungeon::new(DungeonConfig::for_testing()).unwrap();
        dungeon.reset_generator(3).unwrap();
        let snapshot = dungeon.snapshot();

        assert_eq!(snapshot.rooms.len(), dungeon.rooms().len());
        assert_eq!(snapshot.components.len(), dungeon.component_count());
        let json = snapshot.to_json().unwrap();
        let parsed: LayoutSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
