//! # Pathfinding
//!
//! A* search over a [`TileGrid`]. Steps may go to any of the eight
//! neighbours; step costs and the heuristic are both straight-line distances
//! between tile centers in pixel space, so the heuristic never overestimates.
//!
//! Among frontier tiles with equal f-score the lowest tile index is expanded
//! first, which keeps results stable across runs.

use crate::grid::{Position, TileGrid};
use crate::utils::Vector2;
use crate::{BurrowError, BurrowResult};
use log::trace;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Whether a diagonal step may squeeze between two blocked orthogonal tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagonalPolicy {
    /// Diagonal steps only need the destination tile to be open
    #[default]
    AllowCornerCutting,
    /// Diagonal steps also need both orthogonal neighbours to be open
    NoCornerCutting,
}

/// Best-first shortest path search between two tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathFinder {
    pub policy: DiagonalPolicy,
}

impl PathFinder {
    /// Creates a path finder with the given diagonal policy.
    pub fn new(policy: DiagonalPolicy) -> Self {
        Self { policy }
    }

    /// Finds a shortest path from `start` to `end`, both inclusive.
    ///
    /// Returns `[start]` when the two are the same open tile. Fails with
    /// [`BurrowError::InvalidIndex`] when either index is outside the grid and
    /// with [`BurrowError::PathNotFound`] when either endpoint is blocked or
    /// the frontier empties first.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::{PathFinder, TileGrid};
    ///
    /// let grid = TileGrid::arena(5, 5, 1.0, 1.0).unwrap();
    /// let start = grid.coord_to_index(1, 1).unwrap();
    /// let end = grid.coord_to_index(3, 3).unwrap();
    ///
    /// let path = PathFinder::default().find_path(&grid, start, end).unwrap();
    /// assert_eq!(path, vec![start, grid.coord_to_index(2, 2).unwrap(), end]);
    /// ```
    pub fn find_path(&self, grid: &TileGrid, start: usize, end: usize) -> BurrowResult<Vec<usize>> {
        let tile_count = grid.tile_count();
        for index in [start, end] {
            if index >= tile_count {
                return Err(BurrowError::InvalidIndex { index, tile_count });
            }
        }
        if !grid.is_passable(start) || !grid.is_passable(end) {
            return Err(BurrowError::PathNotFound { start, end });
        }
        if start == end {
            return Ok(vec![start]);
        }

        let goal = center(grid, end)?;
        let mut g_score = vec![f64::INFINITY; tile_count];
        let mut came_from: Vec<Option<usize>> = vec![None; tile_count];
        // Walls start closed so they are never expanded
        let mut closed: Vec<bool> = (0..tile_count).map(|index| !grid.is_passable(index)).collect();
        let mut open_set = BinaryHeap::new();

        g_score[start] = 0.0;
        open_set.push(SearchNode {
            index: start,
            f_score: center(grid, start)?.distance(goal),
        });

        while let Some(current) = open_set.pop() {
            let index = current.index;
            if closed[index] {
                continue;
            }
            if index == end {
                let path = reconstruct(&came_from, end);
                trace!("Path {} -> {} found with {} tiles", start, end, path.len());
                return Ok(path);
            }
            closed[index] = true;

            let position = grid
                .index_to_coord(index)
                .ok_or(BurrowError::InvalidIndex { index, tile_count })?;
            let here = center(grid, index)?;

            for neighbor in position.adjacent_positions() {
                let Some(next) = grid.position_to_index(neighbor) else {
                    continue;
                };
                if closed[next] || !self.can_step(grid, position, neighbor) {
                    continue;
                }

                let there = center(grid, next)?;
                let tentative = g_score[index] + here.distance(there);
                if tentative < g_score[next] {
                    came_from[next] = Some(index);
                    g_score[next] = tentative;
                    open_set.push(SearchNode {
                        index: next,
                        f_score: tentative + there.distance(goal),
                    });
                }
            }
        }

        Err(BurrowError::PathNotFound { start, end })
    }

    /// Pixel length of a path, summing the distances between tile centers.
    pub fn path_cost(grid: &TileGrid, path: &[usize]) -> BurrowResult<f64> {
        let mut cost = 0.0;
        for pair in path.windows(2) {
            cost += center(grid, pair[0])?.distance(center(grid, pair[1])?);
        }
        Ok(cost)
    }

    fn can_step(&self, grid: &TileGrid, from: Position, to: Position) -> bool {
        if grid.tile_at_position(to).map_or(true, |tile| !tile.is_passable()) {
            return false;
        }
        let delta = to - from;
        if self.policy == DiagonalPolicy::NoCornerCutting && delta.x != 0 && delta.y != 0 {
            let open = |pos: Position| grid.tile_at_position(pos).is_some_and(|tile| tile.is_passable());
            return open(Position::new(to.x, from.y)) && open(Position::new(from.x, to.y));
        }
        true
    }
}

fn center(grid: &TileGrid, index: usize) -> BurrowResult<Vector2> {
    grid.tile_center_pixel(index).ok_or(BurrowError::InvalidIndex {
        index,
        tile_count: grid.tile_count(),
    })
}

fn reconstruct(came_from: &[Option<usize>], end: usize) -> Vec<usize> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(previous) = came_from[current] {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Frontier entry for the A* search.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    index: usize,
    f_score: f64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap, lowest index first on ties
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.index.cmp(&self.index))
    }
}
