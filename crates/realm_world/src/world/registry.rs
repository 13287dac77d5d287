//! Adding, removing and respawning entities.

use rand::Rng;
use tracing::{debug, info, warn};

use super::World;
use crate::area::{Area, ChestArea, MobArea};
use crate::entity::{Damageable, Entity, Targetable};
use crate::item::{Chest, Item};
use crate::kinds::Kind;
use crate::message::Message;
use crate::mob::{AreaRef, HateTracking, Mob};
use crate::npc::Npc;
use crate::player::SessionBound;
use crate::timer::Timer;
use crate::types::{EntityId, EntityType, Position};

impl World {
    /// Spawns everything the map describes.
    pub(super) fn populate(&mut self) {
        for data in self.map.chest_areas.clone() {
            let items = data.i.iter().filter_map(|id| Kind::from_id(*id)).collect();
            let index = self.chest_areas.len() as i64;
            self.chest_areas.push(ChestArea::new(
                Area::new(index, data.x, data.y, data.w, data.h),
                Position::new(data.tx, data.ty),
                items,
            ));
        }

        for data in self.map.roaming_areas.clone() {
            let Some(kind) = Kind::from_name(&data.kind).filter(|k| k.is_mob()) else {
                warn!("Skipping roaming area {} with unknown mob kind '{}'", data.id, data.kind);
                continue;
            };
            let index = self.mob_areas.len();
            let mob_area = MobArea::new(
                data.id, data.nb, kind, data.x, data.y, data.width, data.height,
            );

            let map = &self.map;
            let positions = mob_area.spawn_positions(&mut self.rng, |p| {
                !map.is_out_of_bounds(p.x, p.y) && !map.is_colliding(p.x, p.y)
            });
            if positions.len() < mob_area.nb {
                warn!(
                    "Roaming area {} only found room for {} of {} {}",
                    data.id,
                    positions.len(),
                    mob_area.nb,
                    kind.name()
                );
            }
            self.mob_areas.push(mob_area);

            for position in positions {
                let id = self.allocate_id();
                let mut mob = Mob::new(&mut self.rng, id, kind, position);
                mob.area = Some(AreaRef::Mob(index));
                self.mob_areas[index].area.add_to_area(id);
                self.add_mob(mob);
            }
        }

        for data in self.map.static_chests.clone() {
            let items = data.i.iter().filter_map(|id| Kind::from_id(*id)).collect();
            let id = self.allocate_id();
            let mut chest = Chest::new(id, Position::new(data.x, data.y), items);
            chest.item.is_static = true;
            self.add_chest(chest);
        }

        for (tile, name) in self.map.static_entities.clone() {
            let Some(kind) = Kind::from_name(&name) else {
                warn!("Unknown static entity kind '{}' at tile {}", name, tile);
                continue;
            };
            let tile_position = self.map.tile_index_to_grid_position(tile);
            let position = Position::new(tile_position.x + 1, tile_position.y);
            let id = self.allocate_id();

            if kind.is_npc() {
                self.add_npc(Npc::new(id, kind, position));
            } else if kind.is_mob() {
                let mut mob = Mob::new(&mut self.rng, id, kind, position);
                if let Some(index) = self.chest_areas.iter().position(|a| a.contains(position)) {
                    mob.area = Some(AreaRef::Chest(index));
                    self.chest_areas[index].area.add_to_area(id);
                }
                self.add_mob(mob);
            } else if kind.is_item() {
                let mut item = Item::new(id, kind, position);
                item.is_static = true;
                self.add_item(item);
            }
        }

        // A chest area is guarded by the static mobs standing in it.
        for chest_area in &mut self.chest_areas {
            let guards = chest_area.area.len();
            chest_area.area.set_number_of_entities(guards);
        }

        info!(
            "Populated world with {} mobs, {} items, {} chests and {} npcs",
            self.mobs.len(),
            self.items.len(),
            self.chests.len(),
            self.npcs.len()
        );
    }

    pub(super) fn add_mob(&mut self, mob: Mob) {
        let id = mob.id();
        self.mobs.insert(id, mob);
        self.entities.insert(id, EntityType::Mob);
        self.handle_entity_group_membership(id);
    }

    pub(super) fn add_item(&mut self, item: Item) -> EntityId {
        let id = item.id();
        self.items.insert(id, item);
        self.entities.insert(id, EntityType::Item);
        self.handle_entity_group_membership(id);
        id
    }

    pub(super) fn add_chest(&mut self, chest: Chest) -> EntityId {
        let id = chest.id();
        self.chests.insert(id, chest);
        self.entities.insert(id, EntityType::Chest);
        self.handle_entity_group_membership(id);
        id
    }

    pub(super) fn add_npc(&mut self, npc: Npc) {
        let id = npc.id();
        self.npcs.insert(id, npc);
        self.entities.insert(id, EntityType::Npc);
        self.handle_entity_group_membership(id);
    }

    /// Puts a session's player into the world.
    pub(super) fn add_player(&mut self, id: EntityId) {
        if !self.players.contains_key(&id) {
            return;
        }
        self.entities.insert(id, EntityType::Player);
        self.outgoing.entry(id).or_default();
        self.handle_entity_group_membership(id);
    }

    /// Creates a dynamic item lying at `position`.
    pub(super) fn create_item(&mut self, kind: Kind, position: Position) -> Item {
        let id = self.allocate_id();
        Item::new(id, kind, position)
    }

    pub(super) fn add_item_from_chest(&mut self, kind: Kind, position: Position) -> EntityId {
        let mut item = self.create_item(kind, position);
        item.is_from_chest = true;
        self.add_item(item)
    }

    /// Removes an entity from the world, cancelling whatever it had pending.
    ///
    /// Mobs go to the dead pool until they respawn, static items and chests
    /// wait for their respawn timer, players stay connected as dead
    /// sessions.
    pub(super) fn remove_entity(&mut self, id: EntityId) {
        let Some(entity_type) = self.entities.get(&id).copied() else {
            debug!("Cannot remove unknown entity {}", id);
            return;
        };
        self.remove_from_groups(id);
        self.entities.remove(&id);

        match entity_type {
            EntityType::Mob => self.remove_mob(id),
            EntityType::Item => {
                if let Some(mut item) = self.items.remove(&id) {
                    let respawn = item.destroy(&mut self.scheduler, self.config.item_respawn_delay_ms);
                    if respawn.is_some() {
                        self.respawning_items.insert(id, item);
                    }
                }
            }
            EntityType::Chest => {
                if let Some(mut chest) = self.chests.remove(&id) {
                    let respawn = chest
                        .item
                        .destroy(&mut self.scheduler, self.config.item_respawn_delay_ms);
                    if respawn.is_some() {
                        self.respawning_chests.insert(id, chest);
                    }
                }
            }
            EntityType::Player => self.release_player(id),
            EntityType::Npc => {
                self.npcs.remove(&id);
            }
        }

        debug!("Removed {} {}", entity_type, id);
    }

    fn remove_mob(&mut self, id: EntityId) {
        self.clear_mob_aggro_link(id);
        self.clear_mob_hate_links(id);
        for player in self.players.values_mut() {
            if player.target() == Some(id) {
                player.clear_target();
            }
        }

        let Some(mut mob) = self.mobs.remove(&id) else {
            return;
        };
        mob.destroy(&mut self.scheduler);

        let delay = self.config.mob_respawn_delay_ms;
        let timer = match mob.area {
            Some(AreaRef::Mob(area)) => {
                if let Some(mob_area) = self.mob_areas.get_mut(area) {
                    mob_area.area.remove_from_area(id);
                }
                Timer::MobAreaRespawn { area, mob: id }
            }
            Some(AreaRef::Chest(area)) => {
                let emptied = self
                    .chest_areas
                    .get_mut(area)
                    .is_some_and(|chest_area| chest_area.area.remove_from_area(id));
                if emptied {
                    self.handle_empty_chest_area(area);
                }
                Timer::MobRespawn(id)
            }
            None => Timer::MobRespawn(id),
        };
        mob.respawn_timer = Some(self.scheduler.schedule_in(delay, timer));
        self.dead_mobs.insert(id, mob);
    }

    /// Detaches a dead or leaving player from the mobs around it.
    fn release_player(&mut self, id: EntityId) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        let attackers = player.attackers();
        let haters: Vec<EntityId> = player.haters.iter().copied().collect();
        player.character_mut().attackers.clear();
        player.haters.clear();

        for mob_id in attackers {
            if let Some(mob) = self.mobs.get_mut(&mob_id) {
                mob.clear_target();
            }
        }
        let delay = self.config.return_to_spawn_delay_ms;
        for mob_id in haters {
            if let Some(mob) = self.mobs.get_mut(&mob_id) {
                mob.forget_player(id, delay, &mut self.scheduler);
            }
        }
    }

    pub(super) fn respawn_mob(&mut self, id: EntityId) {
        let Some(mut mob) = self.dead_mobs.remove(&id) else {
            return;
        };
        let home = mob.spawning_position;
        mob.revive(home);
        if let Some(AreaRef::Chest(area)) = mob.area {
            if let Some(chest_area) = self.chest_areas.get_mut(area) {
                chest_area.area.add_to_area(id);
            }
        }
        self.add_mob(mob);
    }

    pub(super) fn respawn_area_mob(&mut self, area: usize, id: EntityId) {
        let Some(mut mob) = self.dead_mobs.remove(&id) else {
            return;
        };
        let position = match self.mob_areas.get(area) {
            Some(mob_area) => {
                let map = &self.map;
                mob_area
                    .random_position(&mut self.rng, |p| {
                        !map.is_out_of_bounds(p.x, p.y) && !map.is_colliding(p.x, p.y)
                    })
                    .unwrap_or(mob.spawning_position)
            }
            None => mob.spawning_position,
        };
        mob.revive(position);
        if let Some(mob_area) = self.mob_areas.get_mut(area) {
            mob_area.area.add_to_area(id);
        }
        self.add_mob(mob);
    }

    pub(super) fn respawn_static_item(&mut self, id: EntityId) {
        if let Some(item) = self.respawning_items.remove(&id) {
            self.add_item(item);
        } else if let Some(chest) = self.respawning_chests.remove(&id) {
            self.add_chest(chest);
        }
    }

    /// Starts the blink and despawn countdown of a dropped item or chest.
    pub(super) fn handle_item_despawn(&mut self, id: EntityId) {
        let before_blink = self.config.item_before_blink_ms;
        let blinking = self.config.item_blinking_ms;
        if let Some(item) = self.items.get_mut(&id) {
            item.handle_despawn(&mut self.scheduler, before_blink, blinking);
        } else if let Some(chest) = self.chests.get_mut(&id) {
            chest
                .item
                .handle_despawn(&mut self.scheduler, before_blink, blinking);
        }
    }

    pub(super) fn blink_item(&mut self, id: EntityId) {
        let group = if let Some(item) = self.items.get_mut(&id) {
            item.blinked();
            item.group()
        } else if let Some(chest) = self.chests.get_mut(&id) {
            chest.item.blinked();
            chest.group()
        } else {
            return;
        };
        self.push_to_adjacent_groups(group, &Message::Blink(id), None);
    }

    pub(super) fn despawn_item(&mut self, id: EntityId) {
        let Some(entity) = self.entity(id) else {
            return;
        };
        let group = entity.group();
        self.push_to_adjacent_groups(group, &Message::Destroy(id), None);
        self.remove_entity(id);
    }

    /// Places an entity without telling anyone; group membership follows.
    pub(super) fn move_entity(&mut self, id: EntityId, position: Position) {
        if let Some(entity) = self.entity_mut(id) {
            entity.set_position(position);
            self.handle_entity_group_membership(id);
        }
    }

    /// Moves a mob and shows the move to everyone around it.
    pub(super) fn move_mob(&mut self, id: EntityId, position: Position) {
        let Some(mob) = self.mobs.get_mut(&id) else {
            return;
        };
        mob.set_position(position);
        let group = mob.group();
        let message = Message::Move { id, position };
        self.push_to_adjacent_groups(group, &message, None);
        self.handle_entity_group_membership(id);
    }

    pub(super) fn finish_mob_return(&mut self, id: EntityId) {
        let Some(mob) = self.mobs.get_mut(&id) else {
            return;
        };
        mob.finish_return();
        let home = mob.position();
        self.move_mob(id, home);
    }

    pub(super) fn expire_firepotion(&mut self, id: EntityId) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.firepotion_expired();
        if !player.is_active() {
            return;
        }
        let message = player.equip(player.armor);
        let group = player.group();
        self.push_to_adjacent_groups(group, &message, Some(id));
    }

    /// Items a dead mob leaves behind, rolled against its drop table.
    pub(super) fn dropped_item(&mut self, mob_id: EntityId) -> Option<EntityId> {
        let mob = self.mobs.get(&mob_id)?;
        let position = mob.position();
        let drops = mob.kind().mob_properties()?.drops;

        let roll: u32 = self.rng.gen_range(0..100);
        let mut cumulative = 0;
        for (kind, chance) in drops {
            cumulative += chance;
            if roll <= cumulative {
                let item = self.create_item(*kind, position);
                return Some(self.add_item(item));
            }
        }
        None
    }

    /// Mobs hating a player, for assertions and admin tooling.
    pub fn haters_of(&self, player: EntityId) -> Vec<EntityId> {
        self.mobs
            .values()
            .filter(|mob| mob.hates(player))
            .map(|mob| mob.id())
            .collect()
    }

    pub(super) fn is_live_mob(&self, id: EntityId) -> bool {
        self.mobs.get(&id).is_some_and(|mob| mob.is_alive() && !mob.is_dead)
    }
}
