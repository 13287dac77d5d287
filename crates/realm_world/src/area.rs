//! Spawn control regions.
//!
//! An [`Area`] tracks its live entities and reports the moment
//! it runs dry. A [`MobArea`] keeps a fixed population of one mob kind
//! roaming inside its bounds. A [`ChestArea`] rewards players with a chest
//! once every mob guarding it is dead.

use rand::Rng;

use crate::kinds::Kind;
use crate::types::{EntityId, Position};

/// Attempts made to find a valid random tile before giving up.
const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Rectangle owning a bounded population of entities.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: i64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Live entities only. Dead ones are removed.
    members: Vec<EntityId>,
    nb_entities: Option<usize>,
    has_completely_respawned: bool,
}

impl Area {
    pub fn new(id: i64, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            members: Vec::new(),
            nb_entities: None,
            has_completely_respawned: true,
        }
    }

    pub fn set_number_of_entities(&mut self, nb: usize) {
        self.nb_entities = Some(nb);
    }

    pub fn number_of_entities(&self) -> Option<usize> {
        self.nb_entities
    }

    pub fn has_completely_respawned(&self) -> bool {
        self.has_completely_respawned
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    pub fn owns(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Registers a live entity. Reaching capacity re-arms the empty notice.
    pub fn add_to_area(&mut self, id: EntityId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }

        if self.is_full() {
            self.has_completely_respawned = true;
        }
    }

    /// Removes an entity. Returns `true` when this removal emptied an area
    /// that had completely respawned, which happens once per depletion.
    pub fn remove_from_area(&mut self, id: EntityId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        if self.members.len() == before {
            return false;
        }

        if self.is_empty() && self.has_completely_respawned {
            self.has_completely_respawned = false;
            return true;
        }
        false
    }

    /// No owned entity is alive.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        !self.is_empty() && self.nb_entities == Some(self.members.len())
    }

    /// Inclusive lower bound, exclusive upper bound.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.x
            && position.y >= self.y
            && position.x < self.x + self.width
            && position.y < self.y + self.height
    }
}

/// Area keeping `nb` mobs of one kind alive.
#[derive(Debug, Clone)]
pub struct MobArea {
    pub area: Area,
    pub kind: Kind,
    pub nb: usize,
}

impl MobArea {
    pub fn new(id: i64, nb: usize, kind: Kind, x: i32, y: i32, width: i32, height: i32) -> Self {
        let mut area = Area::new(id, x, y, width, height);
        area.set_number_of_entities(nb);
        Self { area, kind, nb }
    }

    /// Rejection samples a tile in `[x, x + width] x [y, y + height]` that
    /// `is_valid` accepts.
    pub fn random_position<R, F>(&self, rng: &mut R, is_valid: F) -> Option<Position>
    where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        let area = &self.area;
        (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| {
                Position::new(
                    area.x + rng.gen_range(0..=area.width.max(0)),
                    area.y + rng.gen_range(0..=area.height.max(0)),
                )
            })
            .find(|pos| is_valid(*pos))
    }

    /// Chooses spawn positions for the whole population. Fewer than `nb`
    /// positions come back when the area has no valid tile.
    pub fn spawn_positions<R, F>(&self, rng: &mut R, is_valid: F) -> Vec<Position>
    where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        (0..self.nb)
            .filter_map(|_| self.random_position(rng, &is_valid))
            .collect()
    }
}

/// Area that drops a chest at a fixed spot once its guards are dead.
#[derive(Debug, Clone)]
pub struct ChestArea {
    pub area: Area,
    pub chest_position: Position,
    pub items: Vec<Kind>,
}

impl ChestArea {
    pub fn new(area: Area, chest_position: Position, items: Vec<Kind>) -> Self {
        Self {
            area,
            chest_position,
            items,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.area.contains(position)
    }
}
