//! Property tests over grids, generation and pathfinding

use burrow::generation::utils::{rooms_respect_clearance, validate_layout};
use burrow::{Dungeon, DungeonConfig, PathFinder, Position, TileGrid, TileType};
use proptest::prelude::*;

fn grid_and_coord() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    (3i32..48, 3i32..48).prop_flat_map(|(cols, rows)| (Just(cols), Just(rows), 0..cols, 0..rows))
}

fn generated(cols: i32, rows: i32, seed: u64) -> Dungeon {
    let mut dungeon = Dungeon::new(DungeonConfig::new(cols, rows)).unwrap();
    dungeon.reset_generator(seed).unwrap();
    dungeon
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_coordinate_round_trip((cols, rows, x, y) in grid_and_coord()) {
        let grid = TileGrid::new(cols, rows, 1.0, 1.0).unwrap();
        let index = grid.coord_to_index(x, y).unwrap();
        prop_assert_eq!(index, (x + y * cols) as usize);
        prop_assert_eq!(grid.index_to_coord(index), Some(Position::new(x, y)));
        prop_assert_eq!(grid.coord_to_index(cols, y), None);
        prop_assert_eq!(grid.coord_to_index(x, -1), None);
    }

    #[test]
    fn test_pixel_lookup_matches_center((cols, rows, x, y) in grid_and_coord(), size in 1.0f64..64.0) {
        let grid = TileGrid::new(cols, rows, size, size).unwrap();
        let index = grid.coord_to_index(x, y).unwrap();
        let center = grid.tile_center_pixel(index).unwrap();
        prop_assert_eq!(grid.pixel_to_index(center.x, center.y), Some(index));
    }

    #[test]
    fn test_generation_invariants(cols in 5i32..40, rows in 5i32..40, seed in any::<u64>()) {
        let dungeon = generated(cols, rows, seed);
        let grid = dungeon.grid();
        prop_assert!(validate_layout(dungeon.layout()).is_ok());

        for index in 0..grid.tile_count() {
            let pos = grid.index_to_coord(index).unwrap();
            if grid.is_border(pos) {
                prop_assert_eq!(grid.tile_at(index), Some(TileType::Wall));
            }
        }

        let clearance = dungeon.config().generation.clearance;
        let rooms = dungeon.rooms();
        for (i, room) in rooms.iter().enumerate() {
            let bottom_right = room.bottom_right();
            prop_assert!(room.position.x >= 1 && room.position.y >= 1);
            prop_assert!(bottom_right.x <= cols - 2 && bottom_right.y <= rows - 2);
            for other in &rooms[i + 1..] {
                prop_assert!(rooms_respect_clearance(room, other, clearance));
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout(seed in any::<u64>()) {
        let first = generated(25, 25, seed);
        let second = generated(25, 25, seed);
        prop_assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn test_paths_avoid_walls(seed in any::<u64>(), picks in proptest::collection::vec(any::<prop::sample::Index>(), 2)) {
        let dungeon = generated(25, 25, seed);
        let grid = dungeon.grid();
        let open: Vec<usize> = (0..grid.tile_count()).filter(|&index| grid.is_passable(index)).collect();
        prop_assume!(!open.is_empty());

        let start = open[picks[0].index(open.len())];
        let end = open[picks[1].index(open.len())];
        prop_assert_eq!(dungeon.find_path(start, start).unwrap(), vec![start]);

        if let Ok(path) = dungeon.find_path(start, end) {
            prop_assert_eq!(path.first(), Some(&start));
            prop_assert_eq!(path.last(), Some(&end));
            prop_assert!(path.iter().all(|&tile| grid.is_passable(tile)));
            for pair in path.windows(2) {
                let a = grid.index_to_coord(pair[0]).unwrap();
                let b = grid.index_to_coord(pair[1]).unwrap();
                prop_assert!((a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_connected_rooms_are_reachable(seed in any::<u64>()) {
        let dungeon = generated(25, 25, seed);
        let grid = dungeon.grid();
        let rooms = dungeon.rooms();
        for a in 0..rooms.len() {
            for b in (a + 1)..rooms.len() {
                if dungeon.layout().connectivity.connected(a, b) {
                    let start = grid.position_to_index(rooms[a].position).unwrap();
                    let end = grid.position_to_index(rooms[b].position).unwrap();
                    prop_assert!(PathFinder::default().find_path(grid, start, end).is_ok());
                }
            }
        }
    }
}
