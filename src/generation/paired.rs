//! # Paired Door Corridors
//!
//! Connects rooms by pairing a random door with a random door of another room
//! and carving a straight, L-shaped or Z-shaped corridor between them, chosen
//! from the doors' relative offset and randomly drawn facings.

use crate::generation::{Connector, ConnectorStats, Door, HallKind, Layout, RoomId};
use crate::grid::{Direction, Position, TileGrid};
use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng};
use std::collections::BTreeSet;

/// Deterministic geometric corridor carving between randomly paired doors.
#[derive(Debug, Clone)]
pub struct PairedDoorConnector {
    /// Tiles a door must keep between itself and the border ring
    pub border_buffer: i32,
}

impl PairedDoorConnector {
    /// Creates a connector with the given door border margin.
    pub fn new(border_buffer: i32) -> Self {
        Self { border_buffer }
    }

    /// Collects boundary door candidates for every room.
    fn collect_doors(&self, layout: &Layout) -> Vec<Door> {
        layout
            .rooms
            .iter()
            .flat_map(|room| {
                room.boundary_doors(&layout.grid, self.border_buffer)
                    .into_iter()
                    .map(move |position| Door::new(position, room.id))
            })
            .collect()
    }

    /// Removes and returns a random door of a room other than `room`.
    ///
    /// Re-rolls over a disposable list of candidates so same-room doors stay in
    /// the main pool.
    fn take_partner(&self, doors: &mut Vec<Door>, room: RoomId, rng: &mut StdRng) -> Option<Door> {
        let mut candidates: Vec<usize> = (0..doors.len()).collect();
        while !candidates.is_empty() {
            let pick = rng.gen_range(0..candidates.len());
            let index = candidates[pick];
            if doors[index].room == room {
                candidates.remove(pick);
                continue;
            }
            return Some(doors.remove(index));
        }
        None
    }

    /// Carves the tiles of a corridor from `from` toward `to`.
    ///
    /// `to` itself is excluded from the straight and Z shapes; it is a room
    /// tile and already ground.
    pub fn carve_hall(&self, grid: &TileGrid, from: Position, to: Position, rng: &mut StdRng) -> BTreeSet<usize> {
        let offset = to - from;
        let mut hall = BTreeSet::new();
        let mut head = from;

        // Aligned doors
        if offset.x == 0 || offset.y == 0 {
            let direction = if offset.x == 0 {
                Direction::vertical_toward(offset.y)
            } else {
                Direction::horizontal_toward(offset.x)
            };
            carve_run(grid, &mut hall, &mut head, direction, offset.x.abs() + offset.y.abs());
            return hall;
        }

        // Face each door along an axis, longer offsets being likelier
        let span = offset.x.abs() + offset.y.abs();
        let from_facing = if rng.gen_range(0..span) < offset.x.abs() {
            Direction::horizontal_toward(offset.x)
        } else {
            Direction::vertical_toward(offset.y)
        };
        let to_facing = if rng.gen_range(0..span) < offset.x.abs() {
            Direction::horizontal_toward(offset.x).opposite()
        } else {
            Direction::vertical_toward(offset.y).opposite()
        };

        match (from_facing.is_horizontal(), to_facing.is_horizontal()) {
            (true, true) => {
                let run = offset.x.abs();
                let split = rng.gen_range(0..run);
                carve_run(grid, &mut hall, &mut head, from_facing, split);
                carve_run(grid, &mut hall, &mut head, Direction::vertical_toward(offset.y), offset.y.abs());
                carve_run(grid, &mut hall, &mut head, from_facing, run - split);
            }
            (false, false) => {
                let run = offset.y.abs();
                let split = rng.gen_range(0..run);
                carve_run(grid, &mut hall, &mut head, from_facing, split);
                carve_run(grid, &mut hall, &mut head, Direction::horizontal_toward(offset.x), offset.x.abs());
                carve_run(grid, &mut hall, &mut head, from_facing, run - split);
            }
            _ => {
                let (first_leg, second_leg) = if from_facing.is_horizontal() {
                    (offset.x.abs(), offset.y.abs())
                } else {
                    (offset.y.abs(), offset.x.abs())
                };
                // First leg runs through the corner tile
                carve_run(grid, &mut hall, &mut head, from_facing, first_leg + 1);
                head = to;
                carve_run(grid, &mut hall, &mut head, to_facing, second_leg);
            }
        }

        hall
    }
}

impl Default for PairedDoorConnector {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Records `steps` tiles starting at `head`, leaving `head` one past the last.
fn carve_run(grid: &TileGrid, hall: &mut BTreeSet<usize>, head: &mut Position, direction: Direction, steps: i32) {
    for _ in 0..steps {
        if let Some(index) = grid.position_to_index(*head) {
            hall.insert(index);
        }
        *head = head.step(direction);
    }
}

impl Connector for PairedDoorConnector {
    fn connect(&self, layout: &mut Layout, rng: &mut StdRng) -> ConnectorStats {
        let mut stats = ConnectorStats::default();
        let mut doors = self.collect_doors(layout);

        while !layout.is_fully_connected() {
            if doors.is_empty() {
                break;
            }

            let current = doors.remove(rng.gen_range(0..doors.len()));
            stats.doors_used += 1;

            let Some(target) = self.take_partner(&mut doors, current.room, rng) else {
                trace!("Door {:?} of room {} has no partner", current.position, current.room);
                stats.abandoned += 1;
                continue;
            };
            stats.doors_used += 1;

            let hall = self.carve_hall(&layout.grid, current.position, target.position, rng);
            trace!(
                "Paired hall of {} tiles from room {} to room {}",
                hall.len(),
                current.room,
                target.room
            );
            layout.commit_hall(hall, current.room, HallKind::Paired);
            layout.connectivity.union(current.room, target.room);
            stats.halls_carved += 1;
        }

        stats.components = layout.component_count();
        if layout.rooms.len() > 1 && !layout.is_fully_connected() {
            warn!(
                "{} left {} components after exhausting its doors",
                self.connector_type(),
                stats.components
            );
        }
        debug!(
            "{} carved {} halls using {} doors",
            self.connector_type(),
            stats.halls_carved,
            stats.doors_used
        );
        stats
    }

    fn connector_type(&self) -> &'static str {
        "PairedDoorConnector"
    }
}
