//! Zone group membership and message routing.
//!
//! Messages about an entity reach the players standing in any group
//! adjacent to the entity's group. Groups keep the set of entities visible
//! from them; when an entity changes group it is queued as incoming in the
//! groups that could not see it before and announced on the next tick.

use tracing::debug;

use super::World;
use crate::entity::Entity;
use crate::message::Message;
use crate::types::{EntityId, EntityType};
use crate::zones::GroupId;

impl World {
    /// Queues a message for one player.
    pub(super) fn push_to_player(&mut self, player: EntityId, message: &Message) {
        match self.outgoing.get_mut(&player) {
            Some(queue) => queue.push(message.serialize()),
            None => debug!("No outgoing queue for player {}", player),
        }
    }

    /// Queues a message for every player standing in `group`.
    pub(super) fn push_to_group(
        &mut self,
        group: GroupId,
        message: &Message,
        ignored: Option<EntityId>,
    ) {
        let Some(members) = self.groups.get(group) else {
            debug!("{} is not a valid group", group);
            return;
        };
        let recipients: Vec<EntityId> = members
            .players
            .iter()
            .copied()
            .filter(|p| Some(*p) != ignored)
            .collect();
        self.deliver(&recipients, message);
    }

    /// Queues a message for every player around `group`.
    pub(super) fn push_to_adjacent_groups(
        &mut self,
        group: Option<GroupId>,
        message: &Message,
        ignored: Option<EntityId>,
    ) {
        let Some(group) = group else {
            return;
        };
        let mut recipients = Vec::new();
        for adjacent in self.groups.adjacent(group) {
            if let Some(members) = self.groups.get(*adjacent) {
                recipients.extend(members.players.iter().copied().filter(|p| Some(*p) != ignored));
            }
        }
        self.deliver(&recipients, message);
    }

    /// Queues a message for the groups a player just stopped seeing.
    pub(super) fn push_to_previous_groups(&mut self, player: EntityId, message: &Message) {
        let Some(player) = self.players.get_mut(&player) else {
            return;
        };
        let left = std::mem::take(&mut player.base_mut().recently_left_groups);
        for group in left {
            self.push_to_group(group, message, None);
        }
    }

    /// Queues a message for every player in the world.
    pub(super) fn push_broadcast(&mut self, message: &Message, ignored: Option<EntityId>) {
        let payload = message.serialize();
        for (id, queue) in self.outgoing.iter_mut() {
            if Some(*id) != ignored {
                queue.push(payload.clone());
            }
        }
    }

    fn deliver(&mut self, recipients: &[EntityId], message: &Message) {
        if recipients.is_empty() {
            return;
        }
        let payload = message.serialize();
        for id in recipients {
            if let Some(queue) = self.outgoing.get_mut(id) {
                queue.push(payload.clone());
            }
        }
    }

    /// Sends a player the ids of every other entity it can see.
    pub(super) fn push_relevant_entity_list(&mut self, player: EntityId) {
        let Some(group) = self.live_player(player).and_then(|p| p.group()) else {
            return;
        };
        let Some(members) = self.groups.get(group) else {
            return;
        };
        let ids: Vec<EntityId> = members
            .entities
            .iter()
            .copied()
            .filter(|id| *id != player)
            .collect();
        self.push_to_player(player, &Message::List(ids));
    }

    /// Sends a player the full state of the requested entities.
    pub(super) fn push_spawns_to_player(&mut self, player: EntityId, ids: &[EntityId]) {
        let spawns: Vec<Message> = ids
            .iter()
            .filter_map(|id| self.entity(*id).map(|e| e.spawn()))
            .collect();
        for spawn in &spawns {
            self.push_to_player(player, spawn);
        }
        debug!("Pushed {} new spawns to {}", spawns.len(), player);
    }

    /// Re-registers an entity whose position may have left its group.
    /// Returns `true` when the group changed.
    pub(super) fn handle_entity_group_membership(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        let group = GroupId::from_position(entity.position());
        if entity.group() == Some(group) {
            return false;
        }

        self.add_as_incoming_to_group(id, group);
        let old_groups = self.remove_from_groups(id);
        let new_groups = self.add_to_group(id, group);

        if !old_groups.is_empty() {
            let left: Vec<GroupId> = old_groups
                .into_iter()
                .filter(|g| !new_groups.contains(g))
                .collect();
            if let Some(entity) = self.entity_mut(id) {
                entity.base_mut().recently_left_groups = left;
            }
        }
        true
    }

    /// Queues an entity for announcement in the groups around `group` that
    /// cannot see it yet. Mob drops are announced by their DROP message
    /// instead.
    fn add_as_incoming_to_group(&mut self, id: EntityId, group: GroupId) {
        let is_dropped_item = self.items.get(&id).is_some_and(|item| item.is_dropped());
        if is_dropped_item {
            return;
        }

        let adjacent = self.groups.adjacent(group).to_vec();
        for adjacent in adjacent {
            if let Some(members) = self.groups.get_mut(adjacent) {
                if !members.entities.contains(&id) {
                    members.incoming.push(id);
                }
            }
        }
    }

    /// Unregisters an entity from every group that could see it. Returns
    /// those groups.
    pub(super) fn remove_from_groups(&mut self, id: EntityId) -> Vec<GroupId> {
        let is_player = self.entities.get(&id) == Some(&EntityType::Player);
        let Some(entity) = self.entity_mut(id) else {
            return Vec::new();
        };
        let Some(group) = entity.base_mut().group.take() else {
            return Vec::new();
        };

        if is_player {
            if let Some(members) = self.groups.get_mut(group) {
                members.players.retain(|p| *p != id);
            }
        }

        let mut old_groups = Vec::new();
        for adjacent in self.groups.adjacent(group).to_vec() {
            if let Some(members) = self.groups.get_mut(adjacent) {
                if members.entities.remove(&id) {
                    old_groups.push(adjacent);
                }
            }
        }
        old_groups
    }

    /// Registers an entity in `group` and makes it visible from the
    /// surrounding groups. Positions off the group grid register nowhere.
    fn add_to_group(&mut self, id: EntityId, group: GroupId) -> Vec<GroupId> {
        if !self.groups.contains(group) {
            return Vec::new();
        }

        let mut new_groups = Vec::new();
        for adjacent in self.groups.adjacent(group).to_vec() {
            if let Some(members) = self.groups.get_mut(adjacent) {
                members.entities.insert(id);
                new_groups.push(adjacent);
            }
        }

        let is_player = self.entities.get(&id) == Some(&EntityType::Player);
        if let Some(entity) = self.entity_mut(id) {
            entity.base_mut().group = Some(group);
        }
        if is_player {
            if let Some(members) = self.groups.get_mut(group) {
                members.players.push(id);
            }
        }
        new_groups
    }

    /// Announces incoming entities to the players of each group. Players
    /// are not sent their own spawn.
    pub(super) fn process_groups(&mut self) {
        let ids: Vec<GroupId> = self.groups.ids().collect();
        for group in ids {
            let incoming = match self.groups.get_mut(group) {
                Some(members) if !members.incoming.is_empty() => {
                    std::mem::take(&mut members.incoming)
                }
                _ => continue,
            };

            for id in incoming {
                let Some(entity) = self.entity(id) else {
                    continue;
                };
                let spawn = entity.spawn();
                let ignored = (entity.entity_type() == EntityType::Player).then_some(id);
                self.push_to_group(group, &spawn, ignored);
            }
        }
    }
}
