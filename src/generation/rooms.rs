//! # Room Placement
//!
//! Randomized room layout. Candidates are drawn at random and rejected when
//! they touch the no-spawn buffer of an earlier room; placement stops once the
//! failure budget is spent, so the room count is whatever fit.

use crate::generation::{GenerationConfig, Room};
use crate::grid::{Position, TileGrid, TileType};
use log::{debug, trace};
use rand::{rngs::StdRng, Rng};
use std::collections::HashSet;

/// Rooms produced by one placement run, with its attempt counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Rooms in placement order; each id is its index
    pub rooms: Vec<Room>,
    /// Candidates drawn
    pub attempts: u32,
    /// Candidates rejected
    pub failures: u32,
}

/// Randomized, constraint-respecting room layout generator.
#[derive(Debug, Clone, Default)]
pub struct RoomPlacer;

impl RoomPlacer {
    /// Creates a new room placer.
    pub fn new() -> Self {
        Self
    }

    /// Places rooms onto `grid` until `config.max_failures` candidates fail.
    ///
    /// Each accepted room is painted as ground and surrounded by a buffer of
    /// `config.clearance` tiles in which no later room may spawn. Failures are
    /// counted over the whole run; an accepted room does not refund them.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::{GenerationConfig, RoomPlacer, TileGrid};
    /// use burrow::generation::utils::create_rng;
    ///
    /// let mut grid = TileGrid::new(25, 25, 1.0, 1.0).unwrap();
    /// let mut rng = create_rng(3);
    /// let placement = RoomPlacer::new().place_rooms(&mut grid, &GenerationConfig::new(), &mut rng);
    /// assert!(!placement.rooms.is_empty());
    /// assert_eq!(placement.failures, 15);
    /// ```
    pub fn place_rooms(&self, grid: &mut TileGrid, config: &GenerationConfig, rng: &mut StdRng) -> Placement {
        let mut rooms = Vec::new();
        let mut no_spawn = HashSet::new();
        let mut attempts = 0;
        let mut failures = 0;

        let max_x = grid.cols() - config.min_room_size - 1;
        let max_y = grid.rows() - config.min_room_size - 1;
        if max_x < 1 || max_y < 1 {
            debug!(
                "Grid {}x{} cannot hold a {}-tile room",
                grid.cols(),
                grid.rows(),
                config.min_room_size
            );
            return Placement {
                rooms,
                attempts,
                failures,
            };
        }

        while failures < config.max_failures {
            attempts += 1;
            match self.try_place_room(grid, config, rng, &no_spawn, rooms.len(), (max_x, max_y)) {
                Some(room) => {
                    self.carve_room(grid, &room);
                    self.mark_no_spawn(grid, &room, config.clearance, &mut no_spawn);
                    trace!(
                        "Placed room {} at ({}, {}) size {}x{}",
                        room.id,
                        room.position.x,
                        room.position.y,
                        room.width,
                        room.height
                    );
                    rooms.push(room);
                }
                None => failures += 1,
            }
        }

        debug!(
            "Placed {} rooms in {} attempts ({} failures)",
            rooms.len(),
            attempts,
            failures
        );

        Placement {
            rooms,
            attempts,
            failures,
        }
    }

    /// Draws one candidate; `None` if it shrinks below minimum or hits a buffer.
    fn try_place_room(
        &self,
        grid: &TileGrid,
        config: &GenerationConfig,
        rng: &mut StdRng,
        no_spawn: &HashSet<usize>,
        id: usize,
        (max_x, max_y): (i32, i32),
    ) -> Option<Room> {
        let x = rng.gen_range(1..=max_x);
        let y = rng.gen_range(1..=max_y);

        let width = rng
            .gen_range(config.min_room_size..=config.max_room_size)
            .min(grid.cols() - 1 - x);
        if width < config.min_room_size {
            return None;
        }

        let height = rng
            .gen_range(config.min_room_size..=config.max_room_size)
            .min(grid.rows() - 1 - y);
        if height < config.min_room_size {
            return None;
        }

        let room = Room::new(id, Position::new(x, y), width, height);
        let blocked = room
            .positions()
            .into_iter()
            .any(|pos| grid.position_to_index(pos).map_or(true, |index| no_spawn.contains(&index)));
        if blocked {
            return None;
        }

        Some(room)
    }

    /// Carves out a room by setting its tiles to ground.
    fn carve_room(&self, grid: &mut TileGrid, room: &Room) {
        let indices: Vec<usize> = room
            .positions()
            .into_iter()
            .filter_map(|pos| grid.position_to_index(pos))
            .collect();
        grid.paint(indices, TileType::Ground);
    }

    /// Marks the room and `clearance` tiles on every side as no-spawn.
    fn mark_no_spawn(&self, grid: &TileGrid, room: &Room, clearance: i32, no_spawn: &mut HashSet<usize>) {
        for y in (room.position.y - clearance)..(room.position.y + room.height + clearance) {
            for x in (room.position.x - clearance)..(room.position.x + room.width + clearance) {
                if let Some(index) = grid.coord_to_index(x, y) {
                    no_spawn.insert(index);
                }
            }
        }
    }
}
