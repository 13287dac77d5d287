//! Server side world map.
//!
//! Maps are exported as JSON by the level tooling. Only the parts the server
//! needs are read: dimensions, collisions, doors, checkpoints and the spawn
//! layout of mobs, chests and static entities.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::checkpoint::Checkpoint;
use crate::error::MapError;
use crate::types::Position;
use crate::zones::{self, GroupId, ZONE_HEIGHT, ZONE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Door {
    pub x: i32,
    pub y: i32,
    pub tx: i32,
    pub ty: i32,
}

/// Region populated with roaming mobs of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoamingArea {
    pub id: i64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub nb: usize,
}

/// Region rewarding a chest at `(tx, ty)` once its mobs are dead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChestAreaData {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Kind ids the chest may contain.
    pub i: Vec<i64>,
    pub tx: i32,
    pub ty: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticChest {
    pub x: i32,
    pub y: i32,
    pub i: Vec<i64>,
}

/// Raw map file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapData {
    pub width: i32,
    pub height: i32,
    /// Zero based tile indexes that cannot be walked on.
    pub collisions: Vec<usize>,
    pub doors: Vec<Door>,
    pub checkpoints: Vec<Checkpoint>,
    pub roaming_areas: Vec<RoamingArea>,
    pub chest_areas: Vec<ChestAreaData>,
    pub static_chests: Vec<StaticChest>,
    /// One based tile index to kind name.
    pub static_entities: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Map {
    width: i32,
    height: i32,
    grid: Vec<bool>,
    group_columns: i32,
    group_rows: i32,
    connected_groups: HashMap<GroupId, Vec<GroupId>>,
    checkpoints: BTreeMap<i64, Checkpoint>,
    starting_areas: Vec<i64>,
    pub roaming_areas: Vec<RoamingArea>,
    pub chest_areas: Vec<ChestAreaData>,
    pub static_chests: Vec<StaticChest>,
    pub static_entities: Vec<(u32, String)>,
}

impl Map {
    pub fn load(path: impl AsRef<Path>) -> Result<Map, MapError> {
        let text = std::fs::read_to_string(path)?;
        Map::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Map, MapError> {
        let data: MapData = serde_json::from_str(text)?;
        Map::new(data)
    }

    pub fn new(data: MapData) -> Result<Map, MapError> {
        if data.width <= 0 || data.height <= 0 {
            return Err(MapError::Invalid(format!(
                "dimensions must be positive, got {}x{}",
                data.width, data.height
            )));
        }

        let width = data.width;
        let height = data.height;
        let mut grid = vec![false; (width * height) as usize];
        for index in data.collisions {
            if let Some(cell) = grid.get_mut(index) {
                *cell = true;
            }
        }

        let mut connected_groups: HashMap<GroupId, Vec<GroupId>> = HashMap::new();
        for door in &data.doors {
            let from = GroupId::from_position(Position::new(door.x, door.y));
            let to = GroupId::from_position(Position::new(door.tx, door.ty));
            connected_groups.entry(from).or_default().push(to);
        }

        let starting_areas = data
            .checkpoints
            .iter()
            .filter(|cp| cp.is_starting_area())
            .map(|cp| cp.id)
            .collect();
        let checkpoints = data.checkpoints.into_iter().map(|cp| (cp.id, cp)).collect();

        let static_entities = data
            .static_entities
            .into_iter()
            .filter_map(|(tile, kind)| tile.parse::<u32>().ok().map(|t| (t, kind)))
            .collect();

        Ok(Map {
            width,
            height,
            grid,
            group_columns: div_ceil(width, ZONE_WIDTH),
            group_rows: div_ceil(height, ZONE_HEIGHT),
            connected_groups,
            checkpoints,
            starting_areas,
            roaming_areas: data.roaming_areas,
            chest_areas: data.chest_areas,
            static_chests: data.static_chests,
            static_entities,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Row and column zero are outside the playable area.
    pub fn is_out_of_bounds(&self, x: i32, y: i32) -> bool {
        x <= 0 || x >= self.width || y <= 0 || y >= self.height
    }

    pub fn is_colliding(&self, x: i32, y: i32) -> bool {
        if self.is_out_of_bounds(x, y) {
            return false;
        }
        self.grid[(y * self.width + x) as usize]
    }

    /// Converts a one based tile number to grid coordinates.
    pub fn tile_index_to_grid_position(&self, tile: u32) -> Position {
        let index = (tile as i32 - 1).max(0);
        Position::new(index % self.width, index / self.width)
    }

    pub fn grid_position_to_tile_index(&self, position: Position) -> u32 {
        (position.y * self.width + position.x + 1) as u32
    }

    pub fn group_id_from_position(&self, position: Position) -> GroupId {
        GroupId::from_position(position)
    }

    pub fn group_columns(&self) -> i32 {
        self.group_columns
    }

    pub fn group_rows(&self) -> i32 {
        self.group_rows
    }

    /// Door links, from the group holding a door to the group it leads to.
    pub fn connected_groups(&self) -> &HashMap<GroupId, Vec<GroupId>> {
        &self.connected_groups
    }

    pub fn adjacent_group_positions(&self, id: GroupId) -> Vec<GroupId> {
        zones::adjacent_groups(id, self.group_columns, self.group_rows, &self.connected_groups)
    }

    pub fn checkpoint(&self, id: i64) -> Option<&Checkpoint> {
        self.checkpoints.get(&id)
    }

    pub fn starting_areas(&self) -> impl Iterator<Item = &Checkpoint> {
        self.starting_areas
            .iter()
            .filter_map(|id| self.checkpoints.get(id))
    }

    /// Random position inside a random starting checkpoint.
    pub fn random_starting_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        if self.starting_areas.is_empty() {
            return None;
        }
        let id = self.starting_areas[rng.gen_range(0..self.starting_areas.len())];
        self.checkpoints.get(&id).map(|cp| cp.random_position(rng))
    }
}

fn div_ceil(value: i32, divisor: i32) -> i32 {
    (value + divisor - 1) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn sample() -> Map {
        let data = json!({
            "width": 60,
            "height": 30,
            "collisions": [65, 121],
            "doors": [{ "x": 2, "y": 2, "tx": 55, "ty": 28, "to": "u" }],
            "checkpoints": [
                { "id": 1, "x": 5, "y": 5, "w": 4, "h": 3, "s": 1 },
                { "id": 2, "x": 40, "y": 20, "w": 2, "h": 2, "s": 0 }
            ],
            "roamingAreas": [
                { "id": 0, "x": 10, "y": 10, "width": 3, "height": 3, "type": "rat", "nb": 2 }
            ],
            "chestAreas": [],
            "staticChests": [],
            "staticEntities": { "62": "guard" }
        });
        Map::from_json(&data.to_string()).unwrap()
    }

    #[test]
    fn bounds_and_collisions() {
        let map = sample();
        assert!(map.is_out_of_bounds(0, 5));
        assert!(map.is_out_of_bounds(5, 30));
        assert!(!map.is_out_of_bounds(1, 1));
        assert!(map.is_colliding(5, 1));
        assert!(map.is_colliding(1, 2));
        assert!(!map.is_colliding(6, 1));
        assert!(!map.is_colliding(-3, -3));
    }

    #[test]
    fn tile_indexes_are_one_based() {
        let map = sample();
        assert_eq!(map.tile_index_to_grid_position(1), Position::new(0, 0));
        assert_eq!(map.tile_index_to_grid_position(60), Position::new(59, 0));
        assert_eq!(map.tile_index_to_grid_position(62), Position::new(1, 1));
        assert_eq!(map.grid_position_to_tile_index(Position::new(1, 1)), 62);
        assert_eq!(map.static_entities, vec![(62, "guard".to_string())]);
    }

    #[test]
    fn group_grid_covers_partial_zones() {
        let map = sample();
        assert_eq!(map.group_columns(), 3);
        assert_eq!(map.group_rows(), 3);
    }

    #[test]
    fn doors_link_groups() {
        let map = sample();
        let adjacent = map.adjacent_group_positions(GroupId::new(0, 0));
        assert!(adjacent.contains(&GroupId::new(1, 2)));
        assert!(!map
            .adjacent_group_positions(GroupId::new(2, 2))
            .contains(&GroupId::new(0, 0)));
    }

    #[test]
    fn starting_positions_come_from_starting_checkpoints() {
        let map = sample();
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(map.starting_areas().count(), 1);
        for _ in 0..100 {
            let pos = map.random_starting_position(&mut rng).unwrap();
            assert!((5..9).contains(&pos.x) && (5..8).contains(&pos.y));
        }
        assert!(map.checkpoint(2).is_some());
        assert!(map.checkpoint(3).is_none());
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            Map::from_json(r#"{"width": 0, "height": 10}"#),
            Err(MapError::Invalid(_))
        ));
        assert!(matches!(Map::from_json("not json"), Err(MapError::Parse(_))));
    }
}
