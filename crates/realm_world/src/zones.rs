//! Zone groups used for interest management.
//!
//! The map is cut into fixed 28x12 tile cells. An entity belongs to the cell
//! containing it and is visible from every cell adjacent to that one. Groups
//! live in a flat arena indexed by their grid coordinates, with the adjacency
//! of every cell computed once when the arena is built.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::types::{EntityId, Position};

pub const ZONE_WIDTH: i32 = 28;
pub const ZONE_HEIGHT: i32 = 12;

/// Grid coordinates of a zone group, displayed as `"x-y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId {
    pub x: i32,
    pub y: i32,
}

impl GroupId {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Group containing a tile position.
    pub fn from_position(position: Position) -> Self {
        Self {
            x: (position.x - 1).div_euclid(ZONE_WIDTH),
            y: (position.y - 1).div_euclid(ZONE_HEIGHT),
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

/// Membership of one zone group.
#[derive(Debug, Clone, Default)]
pub struct Group {
    /// Entities visible from this group.
    pub entities: BTreeSet<EntityId>,
    /// Players standing in this group.
    pub players: Vec<EntityId>,
    /// Entities that became visible since the last spawn announcement.
    pub incoming: Vec<EntityId>,
}

/// Groups adjacent to `id`: the 3x3 block around it followed by groups
/// linked to it through doors, without duplicates and within the grid.
pub fn adjacent_groups(
    id: GroupId,
    columns: i32,
    rows: i32,
    links: &HashMap<GroupId, Vec<GroupId>>,
) -> Vec<GroupId> {
    let mut list = Vec::with_capacity(9);
    for dy in -1..=1 {
        for dx in -1..=1 {
            list.push(GroupId::new(id.x + dx, id.y + dy));
        }
    }

    if let Some(connected) = links.get(&id) {
        for group in connected {
            if !list.contains(group) {
                list.push(*group);
            }
        }
    }

    list.retain(|g| g.x >= 0 && g.y >= 0 && g.x < columns && g.y < rows);
    list
}

/// Arena of every zone group of a map.
#[derive(Debug, Clone)]
pub struct ZoneGroups {
    columns: i32,
    rows: i32,
    slots: Vec<Group>,
    adjacency: Vec<Vec<GroupId>>,
}

impl ZoneGroups {
    pub fn new(columns: i32, rows: i32, links: &HashMap<GroupId, Vec<GroupId>>) -> Self {
        let columns = columns.max(0);
        let rows = rows.max(0);
        let count = (columns * rows) as usize;

        let mut adjacency = Vec::with_capacity(count);
        for y in 0..rows {
            for x in 0..columns {
                adjacency.push(adjacent_groups(GroupId::new(x, y), columns, rows, links));
            }
        }

        Self {
            columns,
            rows,
            slots: vec![Group::default(); count],
            adjacency,
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    fn slot(&self, id: GroupId) -> Option<usize> {
        if id.x < 0 || id.y < 0 || id.x >= self.columns || id.y >= self.rows {
            return None;
        }
        Some((id.y * self.columns + id.x) as usize)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.slot(id).map(|slot| &self.slots[slot])
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.slot(id).map(move |slot| &mut self.slots[slot])
    }

    /// Precomputed neighbours of a group; empty for groups off the grid.
    pub fn adjacent(&self, id: GroupId) -> &[GroupId] {
        match self.slot(id) {
            Some(slot) => &self.adjacency[slot],
            None => &[],
        }
    }

    /// Every group id, column by column.
    pub fn ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.columns).flat_map(move |x| (0..self.rows).map(move |y| GroupId::new(x, y)))
    }
}
