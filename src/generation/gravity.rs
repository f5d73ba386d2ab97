//! # Gravity Walk Corridors
//!
//! Mops up rooms the paired pass left disconnected. A walk starts on the tile
//! just outside a room and steps one tile at a time, each direction weighted
//! by an inverse-square pull toward every room's center. The origin room
//! pushes instead of pulls. A walk succeeds when it lands on an existing hall
//! or on another room's door, and is discarded when it corners itself.

use crate::generation::{Connector, ConnectorStats, Door, GenerationConfig, HallKind, Layout, RoomId};
use crate::grid::{Direction, Position};
use crate::utils::Vector2;
use log::{debug, trace, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{rngs::StdRng, Rng};
use std::collections::BTreeSet;

/// How a single walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkOutcome {
    /// Reached a tile of the hall at this index in the layout
    JoinedHall { tiles: BTreeSet<usize>, hall: usize },
    /// Reached the door at this index in the pool
    JoinedDoor { tiles: BTreeSet<usize>, door: usize },
    /// Every direction was blocked
    DeadEnd { steps: usize },
}

/// Biased random-walk corridor carving using an inverse-square gravity model.
#[derive(Debug, Clone)]
pub struct GravityWalkConnector {
    /// Tiles a door must keep between itself and the border ring
    pub border_buffer: i32,
    /// Multiplier turning weights into integers before sampling
    pub weight_scale: f64,
    /// Factor applied to the weight of the previous step's direction
    pub inertia_factor: f64,
}

impl GravityWalkConnector {
    /// Creates a connector tuned by the generation config.
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            border_buffer: config.border_buffer,
            weight_scale: config.walk_weight_scale,
            inertia_factor: config.inertia_factor,
        }
    }

    /// Recomputes each room's outer door anchors and pools them.
    fn collect_doors(&self, layout: &mut Layout) -> Vec<Door> {
        let mut doors = Vec::new();
        for room in &mut layout.rooms {
            room.doors = room.outer_doors(&layout.grid, self.border_buffer);
            doors.extend(room.doors.iter().map(|&position| Door::new(position, room.id)));
        }
        doors
    }

    /// Gravity weights for stepping East, West, South and North from `head`.
    ///
    /// Every room pulls toward its center with its area over the squared
    /// distance; `origin` pushes with the same magnitude. The four weights are
    /// shifted up so the smallest is zero when any is negative.
    pub fn gravity_weights(&self, layout: &Layout, origin: RoomId, head: Position) -> [f64; 4] {
        let mut weights = [0.0; 4];
        let head_center = Vector2::new(head.x as f64 + 0.5, head.y as f64 + 0.5);

        for room in &layout.rooms {
            let mass = if room.id == origin {
                -(room.area() as f64)
            } else {
                room.area() as f64
            };
            let offset = room.center() - head_center;
            let distance = offset.length();
            if distance == 0.0 {
                continue;
            }
            let pull = mass / (distance * distance * distance);

            if offset.x > 0.0 {
                weights[0] += pull * offset.x.abs();
            } else if offset.x < 0.0 {
                weights[1] += pull * offset.x.abs();
            }
            if offset.y > 0.0 {
                weights[2] += pull * offset.y.abs();
            } else if offset.y < 0.0 {
                weights[3] += pull * offset.y.abs();
            }
        }

        let lowest = weights.iter().copied().fold(f64::INFINITY, f64::min);
        if lowest < 0.0 {
            for weight in &mut weights {
                *weight -= lowest;
            }
        }
        weights
    }

    /// Gravity weights with blocked directions zeroed and inertia applied.
    ///
    /// A step is blocked when it lands inside the origin room, on one of its
    /// doors, on or past the border ring, or on a tile this walk already took.
    pub fn step_weights(
        &self,
        layout: &Layout,
        origin: RoomId,
        head: Position,
        visited: &BTreeSet<usize>,
        last: Option<Direction>,
    ) -> [f64; 4] {
        let mut weights = self.gravity_weights(layout, origin, head);
        let origin_room = &layout.rooms[origin];

        for (weight, direction) in weights.iter_mut().zip(Direction::CARDINAL) {
            let next = head.step(direction);
            let blocked = origin_room.contains(next)
                || origin_room.doors.contains(&next)
                || !layout.grid.contains(next)
                || layout.grid.is_border(next)
                || layout
                    .grid
                    .position_to_index(next)
                    .is_some_and(|index| visited.contains(&index));

            if blocked {
                *weight = 0.0;
            } else if last == Some(direction) {
                *weight *= self.inertia_factor;
            }
        }
        weights
    }

    /// Runs one walk from `doors[pick]` and applies its outcome.
    ///
    /// The starting door always leaves the pool. A walk that reaches another
    /// room's door consumes that door too.
    fn walk_from(
        &self,
        layout: &mut Layout,
        doors: &mut Vec<Door>,
        pick: usize,
        rng: &mut StdRng,
        stats: &mut ConnectorStats,
    ) {
        let door = doors[pick];

        match self.walk(layout, door, doors, rng) {
            WalkOutcome::DeadEnd { steps } => {
                trace!("Walk from {:?} dead-ended after {} steps", door.position, steps);
                doors.remove(pick);
                stats.abandoned += 1;
            }
            WalkOutcome::JoinedHall { tiles, hall } => {
                let joined = layout.halls[hall].origin;
                trace!(
                    "Walk of {} tiles from room {} joined a hall of room {}",
                    tiles.len(),
                    door.room,
                    joined
                );
                layout.commit_hall(tiles, door.room, HallKind::Walk);
                layout.connectivity.union(door.room, joined);
                doors.remove(pick);
                stats.doors_used += 1;
                stats.halls_carved += 1;
            }
            WalkOutcome::JoinedDoor { tiles, door: target } => {
                let joined = doors[target].room;
                trace!(
                    "Walk of {} tiles from room {} reached a door of room {}",
                    tiles.len(),
                    door.room,
                    joined
                );
                layout.commit_hall(tiles, door.room, HallKind::Walk);
                layout.connectivity.union(door.room, joined);
                doors.remove(pick.max(target));
                doors.remove(pick.min(target));
                stats.doors_used += 2;
                stats.halls_carved += 1;
            }
        }
    }

    /// Walks from `door` until it joins something or dead-ends.
    fn walk(&self, layout: &Layout, door: Door, doors: &[Door], rng: &mut StdRng) -> WalkOutcome {
        let mut head = door.position;
        let mut tiles = BTreeSet::new();
        let mut last = None;
        let mut steps = 0;

        let Some(start) = layout.grid.position_to_index(head) else {
            return WalkOutcome::DeadEnd { steps };
        };
        tiles.insert(start);

        loop {
            let weights = self.step_weights(layout, door.room, head, &tiles, last);
            let scaled = weights.map(|weight| (weight * self.weight_scale) as u64);
            let Ok(distribution) = WeightedIndex::new(scaled) else {
                return WalkOutcome::DeadEnd { steps };
            };

            let direction = Direction::CARDINAL[distribution.sample(rng)];
            head = head.step(direction);
            last = Some(direction);
            steps += 1;

            let Some(index) = layout.grid.position_to_index(head) else {
                return WalkOutcome::DeadEnd { steps };
            };
            tiles.insert(index);

            if let Some(hall) = layout.hall_at(index) {
                return WalkOutcome::JoinedHall { tiles, hall };
            }
            if let Some(target) = doors
                .iter()
                .position(|other| other.position == head && other.room != door.room)
            {
                return WalkOutcome::JoinedDoor { tiles, door: target };
            }
        }
    }
}

impl Default for GravityWalkConnector {
    fn default() -> Self {
        Self::new(&GenerationConfig::default())
    }
}

impl Connector for GravityWalkConnector {
    fn connect(&self, layout: &mut Layout, rng: &mut StdRng) -> ConnectorStats {
        let mut stats = ConnectorStats::default();
        let mut doors = self.collect_doors(layout);

        while !layout.is_fully_connected() {
            if doors.is_empty() {
                break;
            }

            let pick = rng.gen_range(0..doors.len());
            self.walk_from(layout, &mut doors, pick, rng, &mut stats);
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
            "{} carved {} halls, abandoned {} walks",
            self.connector_type(),
            stats.halls_carved,
            stats.abandoned
        );
        stats
    }

    fn connector_type(&self) -> &'static str {
        "GravityWalkConnector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::generation::Room;
    use crate::grid::{TileGrid, TileType};
    use std::collections::{HashSet, VecDeque};

    fn layout_with_rooms(cols: i32, rows: i32, rooms: Vec<Room>) -> Layout {
        let grid = TileGrid::new(cols, rows, 1.0, 1.0).unwrap();
        let mut layout = Layout::new(grid);
        for room in &rooms {
            for pos in room.positions() {
                layout.grid.set_tile_at(pos, TileType::Ground).unwrap();
            }
        }
        layout.set_rooms(rooms);
        layout
    }

    fn ground_reachable(layout: &Layout, from: Position, to: Position) -> bool {
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(pos) = queue.pop_front() {
            if pos == to {
                return true;
            }
            for next in pos.cardinal_adjacent_positions() {
                if layout.grid.tile_at_position(next) == Some(TileType::Ground) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn argmax(weights: [f64; 4]) -> usize {
        (0..4)
            .max_by(|&a, &b| weights[a].partial_cmp(&weights[b]).unwrap())
            .unwrap()
    }

    #[test]
    fn test_gravity_pulls_toward_other_room() {
        let layout = layout_with_rooms(
            20,
            10,
            vec![
                Room::new(0, Position::new(2, 4), 2, 2),
                Room::new(1, Position::new(12, 4), 2, 2),
            ],
        );
        let connector = GravityWalkConnector::default();
        let weights = connector.gravity_weights(&layout, 0, Position::new(4, 4));

        assert_eq!(Direction::CARDINAL[argmax(weights)], Direction::East);
        assert_eq!(weights[1], 0.0);
        assert!(weights.iter().all(|&weight| weight >= 0.0));
    }

    #[test]
    fn test_lone_room_repels() {
        let layout = layout_with_rooms(20, 20, vec![Room::new(0, Position::new(5, 5), 2, 2)]);
        let connector = GravityWalkConnector::default();
        // East of the room: pushed east, never west
        let weights = connector.gravity_weights(&layout, 0, Position::new(9, 5));
        assert!(weights[0] > 0.0);
        assert_eq!(weights[1], 0.0);
    }

    #[test]
    fn test_blocked_steps_have_zero_weight() {
        let mut layout = layout_with_rooms(5, 5, vec![Room::new(0, Position::new(1, 1), 1, 3)]);
        let connector = GravityWalkConnector::default();
        connector.collect_doors(&mut layout);
        assert_eq!(layout.rooms[0].doors, vec![Position::new(2, 2)]);

        let visited: BTreeSet<usize> = [(2, 2), (3, 2), (2, 1), (2, 3)]
            .into_iter()
            .map(|(x, y)| layout.grid.coord_to_index(x, y).unwrap())
            .collect();
        let weights = connector.step_weights(&layout, 0, Position::new(2, 2), &visited, None);
        assert_eq!(weights, [0.0; 4]);
    }

    #[test]
    fn test_border_and_origin_door_block() {
        let mut layout = layout_with_rooms(12, 12, vec![Room::new(0, Position::new(3, 3), 3, 3)]);
        let connector = GravityWalkConnector::default();
        connector.collect_doors(&mut layout);

        // (6, 4) has origin doors above and below and the room to the west
        let weights = connector.step_weights(&layout, 0, Position::new(6, 4), &BTreeSet::new(), None);
        assert_eq!(weights[1], 0.0);
        assert_eq!(weights[2], 0.0);
        assert_eq!(weights[3], 0.0);
        assert!(weights[0] > 0.0);

        // Next to the border ring only three directions stay open
        let weights = connector.step_weights(&layout, 0, Position::new(10, 8), &BTreeSet::new(), None);
        assert_eq!(weights[0], 0.0);
    }

    #[test]
    fn test_inertia_doubles_previous_direction() {
        let layout = layout_with_rooms(
            30,
            12,
            vec![
                Room::new(0, Position::new(2, 4), 2, 2),
                Room::new(1, Position::new(24, 4), 2, 2),
            ],
        );
        let connector = GravityWalkConnector::default();
        let head = Position::new(10, 4);
        let plain = connector.step_weights(&layout, 0, head, &BTreeSet::new(), None);
        let carried = connector.step_weights(&layout, 0, head, &BTreeSet::new(), Some(Direction::East));
        assert!(plain[0] > 0.0);
        assert_eq!(carried[0], plain[0] * 2.0);
        assert_eq!(carried[2], plain[2]);
    }

    #[test]
    fn test_connects_two_rooms() {
        let mut layout = layout_with_rooms(
            20,
            10,
            vec![
                Room::new(0, Position::new(3, 4), 2, 2),
                Room::new(1, Position::new(14, 4), 2, 2),
            ],
        );
        let mut rng = create_rng(11);
        let stats = GravityWalkConnector::default().connect(&mut layout, &mut rng);

        assert_eq!(stats.components, layout.component_count());
        assert!(layout.is_fully_connected());
        assert_eq!(stats.halls_carved, 1);
        assert_eq!(stats.doors_used, 2);
        assert_eq!(layout.halls.len(), 1);
        assert_eq!(layout.halls[0].kind, HallKind::Walk);
        assert!(ground_reachable(&layout, Position::new(3, 4), Position::new(15, 5)));
        for index in 0..layout.grid.tile_count() {
            let pos = layout.grid.index_to_coord(index).unwrap();
            if layout.grid.is_border(pos) {
                assert_eq!(layout.grid.tile_at(index), Some(TileType::Wall));
            }
        }
    }

    #[test]
    fn test_connected_rooms_are_reachable() {
        for seed in 0..30 {
            let rooms = vec![
                Room::new(0, Position::new(2, 2), 3, 2),
                Room::new(1, Position::new(12, 3), 2, 3),
                Room::new(2, Position::new(4, 11), 4, 2),
                Room::new(3, Position::new(15, 12), 2, 2),
            ];
            let mut layout = layout_with_rooms(22, 18, rooms);
            let mut rng = create_rng(seed);
            let stats = GravityWalkConnector::default().connect(&mut layout, &mut rng);

            assert!(layout.is_fully_connected(), "seed {seed}");
            assert!(stats.halls_carved >= 3, "seed {seed}");
            for a in 0..4 {
                for b in (a + 1)..4 {
                    assert!(
                        ground_reachable(&layout, layout.rooms[a].position, layout.rooms[b].position),
                        "seed {seed}: rooms {a} and {b} not reachable"
                    );
                }
            }
        }
    }

    #[test]
    fn test_joins_existing_hall() {
        let mut layout = layout_with_rooms(
            20,
            12,
            vec![
                Room::new(0, Position::new(3, 4), 2, 2),
                Room::new(1, Position::new(14, 4), 2, 2),
            ],
        );
        // A vertical hall owned by room 1 cutting across the whole interior
        let hall: BTreeSet<usize> = (1..11).map(|y| layout.grid.coord_to_index(9, y).unwrap()).collect();
        layout.commit_hall(hall, 1, HallKind::Paired);

        let mut rng = create_rng(5);
        GravityWalkConnector::default().connect(&mut layout, &mut rng);

        assert!(layout.is_fully_connected());
        // Every eastward walk from room 0 must stop on the hall's column
        let grid = &layout.grid;
        assert!(layout.halls.iter().any(|hall| {
            hall.kind == HallKind::Walk
                && hall.origin == 0
                && hall
                    .tiles
                    .iter()
                    .any(|&index| grid.index_to_coord(index).is_some_and(|pos| pos.x == 9))
        }));
        assert!(ground_reachable(&layout, Position::new(3, 4), Position::new(9, 1)));
    }

    #[test]
    fn test_boxed_in_door_dead_ends() {
        let mut layout = layout_with_rooms(4, 5, vec![Room::new(0, Position::new(1, 1), 1, 3)]);
        let connector = GravityWalkConnector {
            border_buffer: 0,
            ..GravityWalkConnector::default()
        };
        let mut doors = connector.collect_doors(&mut layout);
        let positions: Vec<Position> = doors.iter().map(|door| door.position).collect();
        assert_eq!(
            positions,
            vec![Position::new(2, 1), Position::new(2, 2), Position::new(2, 3)]
        );

        // Border to the east, room to the west, origin doors above and below
        let boxed = doors[1];
        let mut rng = create_rng(3);
        assert_eq!(
            connector.walk(&layout, boxed, &doors, &mut rng),
            WalkOutcome::DeadEnd { steps: 0 }
        );

        let mut stats = ConnectorStats::default();
        connector.walk_from(&mut layout, &mut doors, 1, &mut rng, &mut stats);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.halls_carved, 0);
        assert_eq!(stats.doors_used, 0);
        assert!(layout.halls.is_empty());
        assert_eq!(layout.grid.count(TileType::Ground), 3);
        assert_eq!(doors.len(), 2);
        assert!(!doors.contains(&boxed));
    }

    #[test]
    fn test_no_rooms_is_noop() {
        let mut layout = layout_with_rooms(10, 10, Vec::new());
        let mut rng = create_rng(1);
        let stats = GravityWalkConnector::default().connect(&mut layout, &mut rng);
        assert_eq!(stats, ConnectorStats::default());
        assert!(layout.halls.is_empty());
    }

    #[test]
    fn test_single_room_publishes_doors() {
        let mut layout = layout_with_rooms(10, 10, vec![Room::new(0, Position::new(3, 3), 2, 2)]);
        let mut rng = create_rng(1);
        let stats = GravityWalkConnector::default().connect(&mut layout, &mut rng);
        assert_eq!(stats.halls_carved, 0);
        assert_eq!(layout.rooms[0].doors.len(), 8);
    }
}
