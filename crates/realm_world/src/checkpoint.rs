//! Checkpoints: rectangles players respawn in.

use rand::Rng;
use serde::Deserialize;

use crate::types::Position;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Checkpoint {
    pub id: i64,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "w")]
    pub width: i32,
    #[serde(rename = "h")]
    pub height: i32,
    /// `1` marks an area new players may start in.
    #[serde(default, rename = "s")]
    pub starting: i32,
}

impl Checkpoint {
    pub fn new(id: i64, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            starting: 0,
        }
    }

    pub fn is_starting_area(&self) -> bool {
        self.starting == 1
    }

    /// Uniform position in `[x, x + width) x [y, y + height)`.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position::new(
            self.x + rng.gen_range(0..self.width.max(1)),
            self.y + rng.gen_range(0..self.height.max(1)),
        )
    }
}
