//! # Burrow
//!
//! Procedural tile-grid dungeon layouts and shortest paths across them.
//!
//! ## Architecture Overview
//!
//! Everything operates on one shared [`TileGrid`]:
//!
//! - **Room placement**: randomized rectangles kept apart by a no-spawn buffer
//! - **Paired doors**: straight, L and Z corridors between randomly paired room doors
//! - **Gravity walks**: biased random walks that mop up rooms still left disconnected
//! - **Pathfinding**: best-first search between two tiles of the finished grid
//!
//! A [`Dungeon`] owns the grid, the rooms, the carved halls, the connectivity
//! model and the random stream, and runs the passes in order.
//!
//! ```
//! use burrow::{Dungeon, DungeonConfig};
//!
//! let mut dungeon = Dungeon::new(DungeonConfig::default()).unwrap();
//! let report = dungeon.reset_generator(7).unwrap();
//! assert!(report.rooms_placed >= 1);
//! ```

pub mod generation;
pub mod grid;
pub mod utils;

// Core module re-exports
pub use generation::*;
pub use grid::*;
pub use utils::*;

/// Core error type for the Burrow dungeon engine.
#[derive(thiserror::Error, Debug)]
pub enum BurrowError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration values are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grid dimensions too small to hold a border
    #[error("Invalid grid dimensions: {cols}x{rows}")]
    InvalidDimensions { cols: i32, rows: i32 },

    /// Tile coordinate outside the grid
    #[error("Coordinate ({x}, {y}) is outside the grid")]
    InvalidCoordinate { x: i32, y: i32 },

    /// Tile index outside the grid
    #[error("Tile index {index} is outside a grid of {tile_count} tiles")]
    InvalidIndex { index: usize, tile_count: usize },

    /// Search exhausted its frontier without reaching the target
    #[error("No path from tile {start} to tile {end}")]
    PathNotFound { start: usize, end: usize },

    /// The grid or layout violates one of its invariants
    #[error("Invalid layout state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Burrow codebase.
pub type BurrowResult<T> = Result<T, BurrowError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants.
pub mod config {
    /// Default tiles per row
    pub const DEFAULT_COLS: i32 = 25;

    /// Default tiles per column
    pub const DEFAULT_ROWS: i32 = 25;

    /// Default window width in pixels, used only to size a tile
    pub const DEFAULT_WINDOW_WIDTH: f64 = 800.0;

    /// Default window height in pixels
    pub const DEFAULT_WINDOW_HEIGHT: f64 = 800.0;

    /// Smallest grid that still has an interior inside its border
    pub const MIN_GRID_DIMENSION: i32 = 3;

    /// Seed in effect before the caller supplies one
    pub const DEFAULT_SEED: u64 = 1;
}
