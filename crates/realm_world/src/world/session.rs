//! Player sessions: connection lifecycle, handshake and command dispatch.
//!
//! A session starts awaiting HELLO. The only way out of that state is a
//! well formed HELLO; anything else closes the connection. Once active the
//! player may send any command until it dies, after which only a new HELLO
//! is heard.

use serde_json::Value;
use tracing::{debug, info};

use super::World;
use crate::command::Command;
use crate::connection::Connection;
use crate::entity::{Damageable, Entity, Targetable};
use crate::error::{echo_payload, ProtocolError};
use crate::events::WorldEvent;
use crate::formulas;
use crate::kinds::Kind;
use crate::message::{Message, MessageType};
use crate::player::{Player, SessionBound, SessionState};
use crate::sanitize;
use crate::timer::Timer;
use crate::types::{EntityId, Position};

/// Hate a mob gains towards a player walking into its aggro range.
const AGGRO_HATE_POINTS: i32 = 5;

impl World {
    /// Accepts a new client. Returns the player id assigned to the session,
    /// or `None` when the world is full and the connection was closed.
    pub fn connect(&mut self, connection: Box<dyn Connection>) -> Option<EntityId> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.is_full() {
            connection.close("World is full");
            info!("Refused a connection, world is full");
            return None;
        }

        let id = self.allocate_id();
        let mut player = Player::new(&mut self.rng, id);
        player.reset_idle_timer(&mut self.scheduler, self.config.idle_timeout_ms);
        connection.send_raw("go");

        self.players.insert(id, player);
        self.connections.insert(id, connection);
        debug!("Session {} connected", id);
        Some(id)
    }

    /// Tears a session down after its connection went away.
    pub fn disconnect(&mut self, id: EntityId) {
        let span = self.span.clone();
        let _enter = span.enter();
        self.release_session(id);
    }

    fn release_session(&mut self, id: EntityId) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.cancel_session_timers(&mut self.scheduler);
        let entered = player.has_entered_game();

        if let Some(player) = self.live_player(id) {
            let group = player.group();
            let despawn = player.despawn();
            self.push_to_adjacent_groups(group, &despawn, Some(id));
            self.remove_entity(id);
        }

        self.players.remove(&id);
        self.outgoing.remove(&id);
        self.connections.remove(&id);

        if entered {
            self.player_count = self.player_count.saturating_sub(1);
            self.update_population();
            self.events.push(WorldEvent::PlayerRemoved { player: id });
        }
        info!("Player {} left the world", id);
    }

    /// Handles one inbound message of a session.
    pub fn handle_message(&mut self, id: EntityId, message: Vec<Value>) {
        let span = self.span.clone();
        let _enter = span.enter();

        let Some(player) = self.players.get(&id) else {
            debug!("Message from unknown session {}", id);
            return;
        };
        let state = player.session_state();

        if !self.formats.check(&message) {
            let message_type = match message.first() {
                Some(Value::Number(n)) => n.as_i64().map_or("UNKNOWN", MessageType::name_of),
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map_or("UNKNOWN", MessageType::name_of),
                _ => "UNKNOWN",
            };
            let error = ProtocolError::InvalidFormat {
                message_type,
                payload: echo_payload(&message),
            };
            self.close_connection(id, error);
            return;
        }

        let is_hello = message.first().and_then(Value::as_i64)
            == Some(i64::from(MessageType::Hello.id()));
        if state == SessionState::AwaitingHandshake && !is_hello {
            let payload = echo_payload(&message);
            self.close_connection(id, ProtocolError::InvalidHandshake { payload });
            return;
        }
        if state == SessionState::Active && is_hello {
            let payload = echo_payload(&message);
            self.close_connection(id, ProtocolError::RepeatedHandshake { payload });
            return;
        }

        if let Some(player) = self.players.get_mut(&id) {
            player.reset_idle_timer(&mut self.scheduler, self.config.idle_timeout_ms);
        }

        let Some(command) = Command::decode(&message) else {
            debug!("Dropping undecodable message from {}: {:?}", id, message);
            return;
        };
        if state == SessionState::Dead && !matches!(command, Command::Hello { .. }) {
            debug!("Ignoring command from dead player {}", id);
            return;
        }

        self.dispatch(id, command);
    }

    fn dispatch(&mut self, id: EntityId, command: Command) {
        match command {
            Command::Hello { name, armor, weapon } => self.on_hello(id, &name, armor, weapon),
            Command::Move(position) => self.on_move(id, position),
            Command::LootMove { position, item } => self.on_loot_move(id, position, item),
            Command::Aggro(mob) => self.handle_mob_hate(mob, id, AGGRO_HATE_POINTS),
            Command::Attack(mob) => self.on_attack(id, mob),
            Command::Hit(mob) => self.on_hit(id, mob),
            Command::Hurt(mob) => self.on_hurt(id, mob),
            Command::Chat(text) => self.on_chat(id, &text),
            Command::Loot(item) => self.on_loot(id, item),
            Command::Teleport(position) => self.on_teleport(id, position),
            Command::Who(ids) => self.push_spawns_to_player(id, &ids),
            Command::Zone => self.on_zone(id),
            Command::Open(chest) => {
                if self.chests.contains_key(&chest) {
                    self.handle_opened_chest(chest);
                }
            }
            Command::Check(checkpoint) => self.on_check(id, checkpoint),
            Command::Other { action, fields } => {
                self.events.push(WorldEvent::Message {
                    player: id,
                    action,
                    fields,
                });
            }
        }
    }

    fn on_hello(&mut self, id: EntityId, name: &str, armor: Kind, weapon: Kind) {
        let name = sanitize::player_name(name);
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.setup(&mut self.rng, name.clone(), armor, weapon);

        let position = match &player.last_checkpoint {
            Some(checkpoint) => checkpoint.random_position(&mut self.rng),
            None => self
                .map
                .random_starting_position(&mut self.rng)
                .unwrap_or_else(|| Position::new(self.map.width() / 2, self.map.height() / 2)),
        };
        player.set_position(position);
        let first_entry = !player.has_entered_game();
        player.set_session_state(SessionState::Active);

        self.add_player(id);
        if first_entry {
            self.player_count += 1;
        }

        let population = Message::Population {
            world: self.player_count,
            total: self.player_count,
        };
        self.push_to_player(id, &population);
        self.push_relevant_entity_list(id);

        if first_entry {
            self.update_population();
            self.events.push(WorldEvent::PlayerEntered {
                player: id,
                name: name.clone(),
            });
        }

        if let (Some(player), Some(connection)) = (self.players.get(&id), self.connections.get(&id)) {
            connection.send(player.welcome().serialize());
        }
        info!("{} entered the world as player {}", name, id);
    }

    fn on_move(&mut self, id: EntityId, position: Position) {
        if !self.is_valid_position(position) {
            debug!("Player {} tried to move to invalid position {}", id, position);
            return;
        }
        let Some(player) = self.live_player_mut(id) else {
            return;
        };
        player.set_position(position);
        player.clear_target();
        let group = player.group();

        self.push_to_adjacent_groups(group, &Message::Move { id, position }, Some(id));
        self.chase_attackers(id);
    }

    fn on_loot_move(&mut self, id: EntityId, position: Position, item: EntityId) {
        if !self.is_valid_position(position) {
            return;
        }
        let Some(player) = self.live_player_mut(id) else {
            return;
        };
        player.set_position(position);
        if !self.items.contains_key(&item) {
            return;
        }

        if let Some(player) = self.live_player_mut(id) {
            player.clear_target();
        }
        let group = self.live_player(id).and_then(|p| p.group());
        self.push_to_adjacent_groups(group, &Message::LootMove { id, item }, Some(id));
        self.chase_attackers(id);
    }

    fn on_attack(&mut self, id: EntityId, mob: EntityId) {
        if !self.is_live_mob(mob) {
            return;
        }
        if let Some(player) = self.live_player_mut(id) {
            player.set_target(mob);
        }
        self.broadcast_attacker(id);
    }

    fn on_hit(&mut self, id: EntityId, mob_id: EntityId) {
        if !self.is_live_mob(mob_id) {
            return;
        }
        let Some(weapon_level) = self.live_player(id).map(|p| p.weapon_level) else {
            return;
        };
        let Some(mob) = self.mobs.get_mut(&mob_id) else {
            return;
        };
        let damage = formulas::damage(&mut self.rng, weapon_level, mob.armor_level);
        if damage <= 0 {
            return;
        }
        mob.receive_damage(damage);
        self.handle_mob_hate(mob_id, id, damage);
        self.handle_hurt_entity(mob_id, Some(id), damage);
    }

    fn on_hurt(&mut self, id: EntityId, mob_id: EntityId) {
        if !self.is_live_mob(mob_id) {
            return;
        }
        let Some(weapon_level) = self.mobs.get(&mob_id).map(|m| m.weapon_level) else {
            return;
        };
        let Some(player) = self.live_player_mut(id) else {
            return;
        };
        if player.hit_points() <= 0 {
            return;
        }
        let armor_level = player.armor_level;
        let damage = formulas::damage(&mut self.rng, weapon_level, armor_level);
        if let Some(player) = self.players.get_mut(&id) {
            player.receive_damage(damage);
        }
        self.handle_hurt_entity(id, None, 0);

        if let Some(player) = self.players.get_mut(&id) {
            if player.hit_points() <= 0 {
                player.set_session_state(SessionState::Dead);
                player.cancel_firepotion(&mut self.scheduler);
                info!("Player {} was killed by {}", id, mob_id);
            }
        }
    }

    fn on_chat(&mut self, id: EntityId, text: &str) {
        let Some(text) = sanitize::chat_text(text) else {
            return;
        };
        let Some(group) = self.live_player(id).and_then(|p| p.group()) else {
            return;
        };
        debug!("Chat from {}: {}", id, text);
        self.push_to_group(group, &Message::Chat { id, text }, None);
    }

    fn on_loot(&mut self, id: EntityId, item_id: EntityId) {
        let Some(kind) = self.items.get(&item_id).map(|i| i.kind()) else {
            return;
        };
        if !kind.is_item() || self.live_player(id).is_none() {
            return;
        }

        let Some(group) = self.items.get(&item_id).map(|i| i.group()) else {
            return;
        };
        self.push_to_adjacent_groups(group, &Message::Despawn(item_id), Some(id));
        self.remove_entity(item_id);

        if kind == Kind::Firepotion {
            self.drink_firepotion(id);
        } else if let Some(amount) = kind.healing_amount() {
            let Some(player) = self.live_player_mut(id) else {
                return;
            };
            if player.has_full_health() {
                return;
            }
            player.regen_health_by(amount);
            let health = player.health();
            self.push_to_player(id, &health);
        } else if kind.is_armor() || kind.is_weapon() {
            let Some(player) = self.live_player_mut(id) else {
                return;
            };
            let hit_points_changed = player.equip_item(kind);
            let hit_points = player.hit_points_message();
            let equip = player.equip(kind);
            let group = player.group();
            if hit_points_changed {
                self.push_to_player(id, &hit_points);
            }
            self.push_to_adjacent_groups(group, &equip, Some(id));
        }
    }

    /// Full heal and the firefox look until the potion wears off.
    fn drink_firepotion(&mut self, id: EntityId) {
        let duration = self.config.firepotion_duration_ms;
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.update_hit_points();
        player.cancel_firepotion(&mut self.scheduler);
        let token = self.scheduler.schedule_in(duration, Timer::FirepotionExpire(id));
        player.set_firepotion_timer(token);

        let equip = player.equip(Kind::Firefox);
        let hit_points = player.hit_points_message();
        let group = player.group();
        self.push_to_adjacent_groups(group, &equip, Some(id));
        self.push_to_player(id, &hit_points);
    }

    fn on_teleport(&mut self, id: EntityId, position: Position) {
        if !self.is_valid_position(position) {
            return;
        }
        let Some(player) = self.live_player_mut(id) else {
            return;
        };
        player.set_position(position);
        player.clear_target();
        let group = player.group();

        self.push_to_adjacent_groups(group, &Message::Teleport { id, position }, Some(id));
        self.handle_player_vanish(id);
        self.push_relevant_entity_list(id);
    }

    fn on_zone(&mut self, id: EntityId) {
        if self.handle_entity_group_membership(id) {
            self.push_to_previous_groups(id, &Message::Destroy(id));
            self.push_relevant_entity_list(id);
        }
    }

    fn on_check(&mut self, id: EntityId, checkpoint: i64) {
        let Some(checkpoint) = self.map.checkpoint(checkpoint).cloned() else {
            debug!("Player {} reached unknown checkpoint {}", id, checkpoint);
            return;
        };
        if let Some(player) = self.live_player_mut(id) {
            player.last_checkpoint = Some(checkpoint);
        }
    }

    /// Closes a session's connection for a protocol violation and drops
    /// the session.
    pub(super) fn close_connection(&mut self, id: EntityId, error: ProtocolError) {
        let reason = error.to_string();
        if let Some(connection) = self.connections.get(&id) {
            connection.close(&reason);
        }
        info!("Closing connection of player {}: {}", id, reason);
        self.events.push(WorldEvent::ConnectionClosed { player: id, reason });
        self.release_session(id);
    }

    pub(super) fn idle_timeout(&mut self, id: EntityId) {
        if let Some(player) = self.players.get_mut(&id) {
            *player.idle_timer_mut() = None;
        } else {
            return;
        }
        if let Some(connection) = self.connections.get(&id) {
            connection.send_raw("timeout");
        }
        self.close_connection(id, ProtocolError::IdleTimeout);
    }

    /// Tells everyone the new player count.
    fn update_population(&mut self) {
        let message = Message::Population {
            world: self.player_count,
            total: self.player_count,
        };
        self.push_broadcast(&message, None);
        self.events.push(WorldEvent::PopulationChanged {
            population: self.player_count,
        });
    }
}
