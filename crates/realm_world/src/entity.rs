//! Entity records and the capability traits shared by concrete entities.
//!
//! Every entity embeds an [`EntityBase`]. Characters (players and mobs)
//! additionally embed a [`CharacterState`]. Behavior is layered through
//! small traits instead of a type hierarchy:
//!
//! - [`Entity`] - identity, position and spawn/despawn notifications
//! - [`Targetable`] - orientation, target and attacker bookkeeping
//! - [`Damageable`] - hit points, damage and regeneration
//!
//! Mob hatred and player sessions have their own traits next to those types.

use std::collections::HashSet;

use rand::Rng;
use serde_json::{json, Value};

use crate::kinds::Kind;
use crate::message::Message;
use crate::types::{EntityId, EntityType, Orientation, Position};
use crate::zones::GroupId;

/// Fields every entity carries.
#[derive(Debug, Clone)]
pub struct EntityBase {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub kind: Kind,
    pub position: Position,
    /// Zone group the entity is registered in, if any.
    pub group: Option<GroupId>,
    /// Groups left during the last membership change that the new group
    /// does not overlap.
    pub recently_left_groups: Vec<GroupId>,
}

impl EntityBase {
    pub fn new(id: EntityId, entity_type: EntityType, kind: Kind, position: Position) -> Self {
        Self {
            id,
            entity_type,
            kind,
            position,
            group: None,
            recently_left_groups: Vec::new(),
        }
    }

    pub fn state(&self) -> Vec<Value> {
        vec![
            json!(self.id.0),
            json!(self.kind.id()),
            json!(self.position.x),
            json!(self.position.y),
        ]
    }
}

pub trait Entity {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    fn id(&self) -> EntityId {
        self.base().id
    }

    fn entity_type(&self) -> EntityType {
        self.base().entity_type
    }

    fn kind(&self) -> Kind {
        self.base().kind
    }

    fn position(&self) -> Position {
        self.base().position
    }

    /// Moves the entity. Validity is the caller's concern.
    fn set_position(&mut self, position: Position) {
        self.base_mut().position = position;
    }

    fn group(&self) -> Option<GroupId> {
        self.base().group
    }

    /// Ordered fields used for full state synchronization.
    fn state(&self) -> Vec<Value> {
        self.base().state()
    }

    fn spawn(&self) -> Message {
        Message::Spawn(self.state())
    }

    fn despawn(&self) -> Message {
        Message::Despawn(self.id())
    }
}

/// Combat related state of players and mobs.
#[derive(Debug, Clone)]
pub struct CharacterState {
    pub orientation: Orientation,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub target: Option<EntityId>,
    pub attackers: HashSet<EntityId>,
}

impl CharacterState {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, max_hit_points: i32) -> Self {
        Self {
            orientation: Orientation::random(rng),
            hit_points: max_hit_points,
            max_hit_points,
            target: None,
            attackers: HashSet::new(),
        }
    }
}

pub trait Targetable: Entity {
    fn character(&self) -> &CharacterState;
    fn character_mut(&mut self) -> &mut CharacterState;

    fn orientation(&self) -> Orientation {
        self.character().orientation
    }

    fn target(&self) -> Option<EntityId> {
        self.character().target
    }

    fn has_target(&self) -> bool {
        self.character().target.is_some()
    }

    fn set_target(&mut self, target: EntityId) {
        self.character_mut().target = Some(target);
    }

    fn clear_target(&mut self) {
        self.character_mut().target = None;
    }

    fn add_attacker(&mut self, attacker: EntityId) {
        self.character_mut().attackers.insert(attacker);
    }

    fn remove_attacker(&mut self, attacker: EntityId) -> bool {
        self.character_mut().attackers.remove(&attacker)
    }

    fn is_attacked_by(&self, attacker: EntityId) -> bool {
        self.character().attackers.contains(&attacker)
    }

    /// Snapshot of the current attackers, in id order.
    fn attackers(&self) -> Vec<EntityId> {
        let mut attackers: Vec<_> = self.character().attackers.iter().copied().collect();
        attackers.sort();
        attackers
    }

    /// Base state followed by orientation and, when set, the target.
    fn character_state(&self) -> Vec<Value> {
        let mut state = self.base().state();
        state.push(json!(self.orientation().id()));
        if let Some(target) = self.target() {
            state.push(json!(target.0));
        }
        state
    }

    fn attack(&self) -> Message {
        Message::Attack {
            attacker: self.id(),
            target: self.target(),
        }
    }
}

pub trait Damageable: Targetable {
    fn hit_points(&self) -> i32 {
        self.character().hit_points
    }

    fn max_hit_points(&self) -> i32 {
        self.character().max_hit_points
    }

    /// Sets a new maximum and heals to it.
    fn reset_hit_points(&mut self, max_hit_points: i32) {
        let character = self.character_mut();
        character.max_hit_points = max_hit_points;
        character.hit_points = max_hit_points;
    }

    /// Heals by `amount`, never past the maximum.
    fn regen_health_by(&mut self, amount: i32) {
        let character = self.character_mut();
        character.hit_points = (character.hit_points + amount).min(character.max_hit_points);
    }

    fn has_full_health(&self) -> bool {
        self.hit_points() >= self.max_hit_points()
    }

    fn receive_damage(&mut self, amount: i32) {
        self.character_mut().hit_points -= amount;
    }

    fn is_alive(&self) -> bool {
        self.hit_points() > 0
    }

    fn health(&self) -> Message {
        Message::Health {
            points: self.hit_points(),
            regen: false,
        }
    }

    fn regen(&self) -> Message {
        Message::Health {
            points: self.hit_points(),
            regen: true,
        }
    }
}
