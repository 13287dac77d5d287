//! Hate, targeting and damage between players and mobs.
//!
//! A mob and a player are linked two ways. The hate link lives in the
//! mob's hate list and the player's hater set; the aggro link is the mob's
//! target and the player's attacker set. Both sides are kept in step here.

use tracing::debug;

use super::World;
use crate::entity::{Damageable, Entity, Targetable};
use crate::message::Message;
use crate::mob::HateTracking;
use crate::types::EntityId;

impl World {
    /// Makes `mob` hate `player` a little more and lets it pick its target.
    ///
    /// A mob that was just dealt its killing blow still records the hate, so
    /// the killer is among the players its loot is dropped for.
    pub(super) fn handle_mob_hate(&mut self, mob_id: EntityId, player_id: EntityId, points: i32) {
        let known = self.mobs.get(&mob_id).is_some_and(|mob| !mob.is_dead);
        if !known || self.live_player(player_id).is_none() {
            debug!("Ignoring hate from {} towards {}", mob_id, player_id);
            return;
        }

        let Some(mob) = self.mobs.get_mut(&mob_id) else {
            return;
        };
        mob.increase_hate_for(player_id, points, &mut self.scheduler);
        let alive = mob.hit_points() > 0;

        if let Some(player) = self.players.get_mut(&player_id) {
            player.add_hater(mob_id);
        }
        if alive {
            self.choose_mob_target(mob_id, None);
        }
    }

    /// Points a mob at the player of the given hate rank, the most hated
    /// one by default. Nothing changes when that player is already under
    /// attack by this mob.
    pub(super) fn choose_mob_target(&mut self, mob_id: EntityId, rank: Option<usize>) {
        let Some(player_id) = self.mobs.get(&mob_id).and_then(|m| m.hated_player_id(rank)) else {
            return;
        };
        match self.live_player(player_id) {
            Some(player) if !player.is_attacked_by(mob_id) => {}
            _ => return,
        }

        self.clear_mob_aggro_link(mob_id);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.add_attacker(mob_id);
        }
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.set_target(player_id);
        }
        self.broadcast_attacker(mob_id);
    }

    /// Detaches a mob from the player it is attacking.
    pub(super) fn clear_mob_aggro_link(&mut self, mob_id: EntityId) {
        let Some(target) = self.mobs.get(&mob_id).and_then(|m| m.target()) else {
            return;
        };
        if let Some(player) = self.players.get_mut(&target) {
            player.remove_attacker(mob_id);
        }
    }

    /// Removes a mob from the hater set of every player it hates.
    pub(super) fn clear_mob_hate_links(&mut self, mob_id: EntityId) {
        let Some(mob) = self.mobs.get(&mob_id) else {
            return;
        };
        for player_id in mob.hater_ids() {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.remove_hater(mob_id);
            }
        }
    }

    /// Shows a character's current attack to everyone around it.
    pub(super) fn broadcast_attacker(&mut self, id: EntityId) {
        let (group, message) = if let Some(mob) = self.mobs.get(&id) {
            (mob.group(), mob.attack())
        } else if let Some(player) = self.live_player(id) {
            (player.group(), player.attack())
        } else {
            return;
        };
        self.push_to_adjacent_groups(group, &message, Some(id));
    }

    /// Reports damage dealt to `target` and handles its death.
    ///
    /// A dying mob is announced as killed to its attacker, then despawned
    /// for everyone around before its loot is dropped.
    pub(super) fn handle_hurt_entity(
        &mut self,
        target: EntityId,
        attacker: Option<EntityId>,
        damage: i32,
    ) {
        if let Some(player) = self.live_player(target) {
            let health = player.health();
            self.push_to_player(target, &health);
        }

        let Some(entity) = self.entity(target) else {
            return;
        };
        let group = entity.group();
        let despawn = entity.despawn();

        if let Some(mob) = self.mobs.get(&target) {
            let dead = mob.hit_points() <= 0;
            let kind = mob.kind();
            let haters = mob.hater_ids();

            if let Some(attacker) = attacker {
                self.push_to_player(attacker, &Message::Damage { id: target, points: damage });
            }
            if !dead {
                return;
            }

            let item = self.dropped_item(target);
            if let Some(attacker) = attacker {
                self.push_to_player(attacker, &Message::Kill(kind));
            }
            self.push_to_adjacent_groups(group, &despawn, None);
            if let Some(item_id) = item {
                if let Some(item_kind) = self.items.get(&item_id).map(|i| i.kind()) {
                    let drop = Message::Drop {
                        mob: target,
                        item: item_id,
                        kind: item_kind,
                        haters,
                    };
                    self.push_to_adjacent_groups(group, &drop, None);
                    self.handle_item_despawn(item_id);
                }
            }
            self.remove_entity(target);
        } else if let Some(player) = self.live_player(target) {
            if player.hit_points() > 0 {
                return;
            }
            self.handle_player_vanish(target);
            let group = self.live_player(target).and_then(|p| p.group());
            self.push_to_adjacent_groups(group, &despawn, None);
            self.remove_entity(target);
        }
    }

    /// Mobs attacking a player that died or teleported move on to their
    /// next most hated player and forget this one.
    pub(super) fn handle_player_vanish(&mut self, player_id: EntityId) {
        let attackers = match self.players.get(&player_id) {
            Some(player) => player.attackers(),
            None => return,
        };

        for mob_id in &attackers {
            self.choose_mob_target(*mob_id, Some(2));
        }

        let delay = self.config.forget_on_vanish_delay_ms;
        for mob_id in attackers {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.remove_attacker(mob_id);
                player.remove_hater(mob_id);
            }
            if let Some(mob) = self.mobs.get_mut(&mob_id) {
                if mob.target() == Some(player_id) {
                    mob.clear_target();
                }
                mob.forget_player(player_id, delay, &mut self.scheduler);
            }
        }

        self.handle_entity_group_membership(player_id);
    }

    /// Drags the mobs attacking a player along after it moved. Mobs pulled
    /// too far from home give up the chase.
    pub(super) fn chase_attackers(&mut self, player_id: EntityId) {
        let attackers = match self.live_player(player_id) {
            Some(player) => player.attackers(),
            None => return,
        };

        for mob_id in attackers {
            let Some(target) = self.mobs.get(&mob_id).and_then(|m| m.target()) else {
                continue;
            };
            let Some(target_position) = self.entity(target).map(|e| e.position()) else {
                continue;
            };
            let Some(position) = self.find_position_next_to(target_position) else {
                continue;
            };

            let too_far = self
                .mobs
                .get(&mob_id)
                .is_some_and(|m| m.distance_to_spawning_point(position) > self.config.max_chase_distance);
            if too_far {
                self.clear_mob_hate_links(mob_id);
                if let Some(mob) = self.mobs.get_mut(&mob_id) {
                    mob.clear_target();
                    mob.forget_everyone(&mut self.scheduler);
                }
                if let Some(player) = self.players.get_mut(&player_id) {
                    player.remove_attacker(mob_id);
                }
                debug!("Mob {} gave up chasing {}", mob_id, player_id);
            } else {
                self.move_entity(mob_id, position);
            }
        }
    }

    /// Replaces an opened chest by one of its items.
    pub(super) fn handle_opened_chest(&mut self, chest_id: EntityId) {
        let Some(chest) = self.chests.get(&chest_id) else {
            return;
        };
        let group = chest.group();
        let despawn = chest.despawn();
        let position = chest.position();
        let drawn = chest.random_item(&mut self.rng);

        self.push_to_adjacent_groups(group, &despawn, None);
        self.remove_entity(chest_id);

        if let Some(kind) = drawn {
            let item = self.add_item_from_chest(kind, position);
            self.handle_item_despawn(item);
        }
    }

    /// A chest appears once every guard of a chest area is dead.
    pub(super) fn handle_empty_chest_area(&mut self, index: usize) {
        let Some(chest_area) = self.chest_areas.get(index) else {
            return;
        };
        let position = chest_area.chest_position;
        let items = chest_area.items.clone();

        let id = self.allocate_id();
        let chest = crate::item::Chest::new(id, position, items);
        let chest_id = self.add_chest(chest);
        self.handle_item_despawn(chest_id);
        debug!("Chest area {} emptied, chest {} appeared", index, chest_id);
    }
}
