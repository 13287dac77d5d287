//! # World orchestrator
//!
//! [`World`] owns every entity of one world, the zone group membership
//! tables, the outbound queue of every connected player and the scheduler
//! driving all delayed actions. It is single threaded: the host feeds it
//! connections, inbound messages and ticks, and the world answers through
//! the [`Connection`] handles it was given.
//!
//! ## Time
//!
//! The world keeps a virtual clock. [`World::update`] advances it by one
//! tick and [`World::advance_time`] by an arbitrary amount; scheduled
//! actions fire in due order while the clock moves. Nothing happens between
//! calls, which keeps the simulation deterministic for a given seed.
//!
//! ## Failure policy
//!
//! Commands referencing entities that no longer exist are ignored and
//! logged at debug level. Only protocol violations close a connection.

mod combat;
mod interest;
mod registry;
mod session;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{debug, info_span, Span};

use crate::area::{ChestArea, MobArea};
use crate::config::WorldConfig;
use crate::connection::Connection;
use crate::entity::{Damageable, Entity, Targetable};
use crate::events::WorldEvent;
use crate::format::{FieldType, FormatChecker};
use crate::item::{Chest, Item};
use crate::map::Map;
use crate::mob::Mob;
use crate::npc::Npc;
use crate::player::{Player, SessionBound};
use crate::timer::{Timer, WorldScheduler};
use crate::types::{EntityId, EntityType, Position};
use crate::zones::ZoneGroups;

/// Attempts made to find a free tile next to a target.
const MAX_NEXT_TO_ATTEMPTS: usize = 32;

pub struct World {
    config: WorldConfig,
    map: Map,
    groups: ZoneGroups,

    /// Every connected session, entered or not.
    players: BTreeMap<EntityId, Player>,
    connections: HashMap<EntityId, Box<dyn Connection>>,
    outgoing: BTreeMap<EntityId, Vec<Value>>,

    mobs: BTreeMap<EntityId, Mob>,
    dead_mobs: BTreeMap<EntityId, Mob>,
    items: BTreeMap<EntityId, Item>,
    respawning_items: BTreeMap<EntityId, Item>,
    chests: BTreeMap<EntityId, Chest>,
    respawning_chests: BTreeMap<EntityId, Chest>,
    npcs: BTreeMap<EntityId, Npc>,
    /// Entities currently present in the world, by type.
    entities: HashMap<EntityId, EntityType>,

    mob_areas: Vec<MobArea>,
    chest_areas: Vec<ChestArea>,

    player_count: usize,
    next_id: u64,
    ticks_since_regen: u32,

    rng: StdRng,
    scheduler: WorldScheduler,
    formats: FormatChecker,
    events: Vec<WorldEvent>,
    span: Span,
}

impl World {
    /// Builds a world on `map` and populates it: mob areas, chest areas,
    /// static chests and the static entities placed by the map.
    pub fn new(config: WorldConfig, map: Map) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let groups = ZoneGroups::new(map.group_columns(), map.group_rows(), map.connected_groups());
        let span = info_span!("world", id = config.id);

        let mut world = Self {
            config,
            map,
            groups,
            players: BTreeMap::new(),
            connections: HashMap::new(),
            outgoing: BTreeMap::new(),
            mobs: BTreeMap::new(),
            dead_mobs: BTreeMap::new(),
            items: BTreeMap::new(),
            respawning_items: BTreeMap::new(),
            chests: BTreeMap::new(),
            respawning_chests: BTreeMap::new(),
            npcs: BTreeMap::new(),
            entities: HashMap::new(),
            mob_areas: Vec::new(),
            chest_areas: Vec::new(),
            player_count: 0,
            next_id: 1,
            ticks_since_regen: 0,
            rng,
            scheduler: WorldScheduler::new(),
            formats: FormatChecker::new(),
            events: Vec::new(),
            span,
        };

        let span = world.span.clone();
        let _enter = span.enter();
        world.populate();
        world
            .scheduler
            .schedule_in(world.config.roaming_interval_ms, Timer::RoamSweep);
        world
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn groups(&self) -> &ZoneGroups {
        &self.groups
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Players that have entered the world and not left it.
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Connected sessions, including those still in the handshake.
    pub fn session_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.config.max_players
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.mobs.get(&id)
    }

    pub fn dead_mob(&self, id: EntityId) -> Option<&Mob> {
        self.dead_mobs.get(&id)
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn chest(&self, id: EntityId) -> Option<&Chest> {
        self.chests.get(&id)
    }

    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    pub fn mobs(&self) -> impl Iterator<Item = &Mob> {
        self.mobs.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn chests(&self) -> impl Iterator<Item = &Chest> {
        self.chests.values()
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    pub fn mob_areas(&self) -> &[MobArea] {
        &self.mob_areas
    }

    pub fn chest_areas(&self) -> &[ChestArea] {
        &self.chest_areas
    }

    /// Any live entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        match self.entities.get(&id)? {
            EntityType::Player => self.players.get(&id).map(|e| e as &dyn Entity),
            EntityType::Mob => self.mobs.get(&id).map(|e| e as &dyn Entity),
            EntityType::Item => self.items.get(&id).map(|e| e as &dyn Entity),
            EntityType::Chest => self.chests.get(&id).map(|e| e as &dyn Entity),
            EntityType::Npc => self.npcs.get(&id).map(|e| e as &dyn Entity),
        }
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        match self.entities.get(&id)? {
            EntityType::Player => self.players.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityType::Mob => self.mobs.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityType::Item => self.items.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityType::Chest => self.chests.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityType::Npc => self.npcs.get_mut(&id).map(|e| e as &mut dyn Entity),
        }
    }

    /// A player currently present in the world.
    fn live_player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        match self.entities.get(&id) {
            Some(EntityType::Player) => self.players.get_mut(&id),
            _ => None,
        }
    }

    fn live_player(&self, id: EntityId) -> Option<&Player> {
        match self.entities.get(&id) {
            Some(EntityType::Player) => self.players.get(&id),
            _ => None,
        }
    }

    /// Walkable tile inside the map.
    pub fn is_valid_position(&self, position: Position) -> bool {
        !self.map.is_out_of_bounds(position.x, position.y)
            && !self.map.is_colliding(position.x, position.y)
    }

    /// Accepts an extra command layout. Commands of that type are reported
    /// as [`WorldEvent::Message`].
    pub fn register_format(&mut self, message_type: i64, fields: Vec<FieldType>) {
        self.formats.register(message_type, fields);
    }

    /// Takes the events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Runs one tick: fires due timers, announces entities that came into
    /// view, regenerates health when due and flushes outbound queues.
    pub fn update(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();

        self.advance_clock(self.config.tick_ms());
        self.process_groups();

        self.ticks_since_regen += 1;
        if self.ticks_since_regen >= self.config.regen_every_ticks() {
            self.ticks_since_regen = 0;
            self.regenerate();
        }

        self.process_queues();
    }

    /// Moves the clock forward by `ms`, firing every action that falls due.
    pub fn advance_time(&mut self, ms: u64) {
        let span = self.span.clone();
        let _enter = span.enter();
        self.advance_clock(ms);
    }

    fn advance_clock(&mut self, ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(ms);
        while let Some(timer) = self.scheduler.pop_due(until) {
            self.fire(timer);
        }
        self.scheduler.advance_to(until);
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::ItemBlink(id) => self.blink_item(id),
            Timer::ItemDespawn(id) => self.despawn_item(id),
            Timer::ItemRespawn(id) => self.respawn_static_item(id),
            Timer::MobReturn(id) => self.finish_mob_return(id),
            Timer::MobRespawn(id) => self.respawn_mob(id),
            Timer::MobAreaRespawn { area, mob } => self.respawn_area_mob(area, mob),
            Timer::FirepotionExpire(id) => self.expire_firepotion(id),
            Timer::IdleTimeout(id) => self.idle_timeout(id),
            Timer::RoamSweep => {
                self.roam_mobs();
                self.scheduler
                    .schedule_in(self.config.roaming_interval_ms, Timer::RoamSweep);
            }
        }
    }

    /// Heals every wounded character by a twenty-fifth of its maximum.
    /// Players are told, mobs heal silently.
    fn regenerate(&mut self) {
        let mut healed = Vec::new();
        for player in self.players.values_mut() {
            if player.is_active() && !player.has_full_health() {
                player.regen_health_by(player.max_hit_points() / 25);
                healed.push((player.id(), player.regen()));
            }
        }
        for (id, message) in healed {
            self.push_to_player(id, &message);
        }

        for mob in self.mobs.values_mut() {
            if !mob.has_full_health() {
                mob.regen_health_by(mob.max_hit_points() / 25);
            }
        }
    }

    /// Lets each idle mob of every mob area wander with a small chance.
    fn roam_mobs(&mut self) {
        let chance = self.config.roaming_chance.max(1);
        for index in 0..self.mob_areas.len() {
            let members: Vec<EntityId> = self.mob_areas[index].area.entities().collect();
            for id in members {
                let idle = self
                    .mobs
                    .get(&id)
                    .is_some_and(|mob| !mob.is_dead && !mob.has_target());
                if !idle || self.rng.gen_range(0..chance) != 0 {
                    continue;
                }

                let area = &self.mob_areas[index];
                let map = &self.map;
                let destination = area.random_position(&mut self.rng, |p| {
                    !map.is_out_of_bounds(p.x, p.y) && !map.is_colliding(p.x, p.y)
                });
                if let Some(position) = destination {
                    self.move_mob(id, position);
                }
            }
        }
    }

    /// Sends every non-empty outbound queue as one batch.
    fn process_queues(&mut self) {
        for (id, queue) in self.outgoing.iter_mut() {
            if queue.is_empty() {
                continue;
            }
            let batch = std::mem::take(queue);
            match self.connections.get(id) {
                Some(connection) => connection.send(Value::Array(batch)),
                None => debug!("No connection for player {}", id),
            }
        }
    }

    /// Random free tile touching `target`.
    fn find_position_next_to(&mut self, target: Position) -> Option<Position> {
        for _ in 0..MAX_NEXT_TO_ATTEMPTS {
            let candidate = target.random_neighbour(&mut self.rng);
            if self.is_valid_position(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
