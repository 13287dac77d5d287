//! # Core Type Definitions
//!
//! Fundamental value types shared by every part of the simulation.
//!
//! ## Key Types
//!
//! - [`EntityId`] - Unique identifier of an entity while it is alive in a world
//! - [`EntityType`] - Category tag carried by every entity
//! - [`Orientation`] - One of the four cardinal directions a character faces
//! - [`Position`] - Integer grid coordinates

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity in a world.
///
/// Ids are numeric because they travel on the wire as plain JSON numbers.
/// Players and world objects are allocated from the same counter, so an id
/// never refers to two live entities at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Category tag of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Player,
    Mob,
    Npc,
    Item,
    Chest,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Player => "player",
            EntityType::Mob => "mob",
            EntityType::Npc => "npc",
            EntityType::Item => "item",
            EntityType::Chest => "chest",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction a character is facing. Wire values are 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::Left,
        Orientation::Right,
    ];

    /// Picks one of the four directions uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Integer grid coordinates on the world map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Largest axis delta between two positions.
    ///
    /// Characters move one tile at a time in any of the four directions, so
    /// this is the distance used to decide when a chasing mob is too far
    /// from home.
    pub fn distance_to(&self, other: Position) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }

    /// One of the four tiles touching this one, chosen uniformly.
    pub fn random_neighbour<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        match rng.gen_range(0..4) {
            0 => Position::new(self.x, self.y - 1),
            1 => Position::new(self.x, self.y + 1),
            2 => Position::new(self.x - 1, self.y),
            _ => Position::new(self.x + 1, self.y),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
