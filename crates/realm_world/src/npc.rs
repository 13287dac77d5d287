//! Non player characters. They stand still and never fight.

use crate::entity::{Entity, EntityBase};
use crate::kinds::Kind;
use crate::types::{EntityId, EntityType, Position};

#[derive(Debug, Clone)]
pub struct Npc {
    base: EntityBase,
}

impl Npc {
    pub fn new(id: EntityId, kind: Kind, position: Position) -> Self {
        Self {
            base: EntityBase::new(id, EntityType::Npc, kind, position),
        }
    }
}

impl Entity for Npc {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
