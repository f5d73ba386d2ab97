//! # Room Connectivity
//!
//! Disjoint-set forest over room ids. Two rooms are connected when they share
//! a root; merging is amortized near-constant with path halving and union by
//! size.

use crate::generation::RoomId;
use serde::{Deserialize, Serialize};

/// Union-find over the rooms of one layout.
///
/// # Examples
///
/// ```
/// use burrow::RoomConnectivity;
///
/// let mut connectivity = RoomConnectivity::new(3);
/// assert_eq!(connectivity.component_count(), 3);
///
/// connectivity.union(0, 2);
/// assert!(connectivity.connected(0, 2));
/// assert!(!connectivity.connected(0, 1));
/// assert_eq!(connectivity.component_size(2), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConnectivity {
    parent: Vec<RoomId>,
    size: Vec<usize>,
    components: usize,
}

impl RoomConnectivity {
    /// Creates `rooms` singleton components.
    pub fn new(rooms: usize) -> Self {
        Self {
            parent: (0..rooms).collect(),
            size: vec![1; rooms],
            components: rooms,
        }
    }

    /// Forgets every merge and resizes to `rooms` singletons.
    pub fn reset(&mut self, rooms: usize) {
        *self = Self::new(rooms);
    }

    /// Number of rooms tracked.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether no rooms are tracked.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Finds the representative of `room`, compressing the path on the way.
    pub fn find(&mut self, room: RoomId) -> RoomId {
        let mut current = room;
        while self.parent[current] != current {
            let grandparent = self.parent[self.parent[current]];
            self.parent[current] = grandparent;
            current = grandparent;
        }
        current
    }

    /// Finds the representative of `room` without compressing.
    pub fn root(&self, room: RoomId) -> RoomId {
        let mut current = room;
        while self.parent[current] != current {
            current = self.parent[current];
        }
        current
    }

    /// Merges the components of `first` and `second`.
    ///
    /// Returns `false` when they were already connected.
    pub fn union(&mut self, first: RoomId, second: RoomId) -> bool {
        let mut a = self.find(first);
        let mut b = self.find(second);
        if a == b {
            return false;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
        self.components -= 1;
        true
    }

    /// Whether two rooms share a component.
    pub fn connected(&self, first: RoomId, second: RoomId) -> bool {
        self.root(first) == self.root(second)
    }

    /// Number of rooms in the component containing `room`.
    pub fn component_size(&self, room: RoomId) -> usize {
        self.size[self.root(room)]
    }

    /// Number of disjoint components.
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Whether at most one component remains.
    pub fn is_fully_connected(&self) -> bool {
        self.components <= 1
    }

    /// Rooms grouped by component, each group and the group list sorted by id.
    pub fn components(&self) -> Vec<Vec<RoomId>> {
        let mut groups: Vec<Vec<RoomId>> = Vec::new();
        let mut group_of_root = vec![usize::MAX; self.len()];
        for room in 0..self.len() {
            let root = self.root(room);
            if group_of_root[root] == usize::MAX {
                group_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[group_of_root[root]].push(room);
        }
        groups
    }
}
