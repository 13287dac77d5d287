//! Connected players.

use std::collections::BTreeSet;

use rand::Rng;
use serde_json::{json, Value};

use crate::checkpoint::Checkpoint;
use crate::entity::{CharacterState, Damageable, Entity, EntityBase, Targetable};
use crate::formulas;
use crate::kinds::Kind;
use crate::message::Message;
use crate::sanitize::DEFAULT_NAME;
use crate::scheduler::TimerToken;
use crate::timer::{Timer, WorldScheduler};
use crate::types::{EntityId, EntityType, Orientation, Position};

/// Where a player's session stands in the handshake protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for HELLO.
    AwaitingHandshake,
    /// In the world and alive.
    Active,
    /// Killed; a new HELLO brings the player back.
    Dead,
}

/// A character driven by a client connection.
pub trait SessionBound: Entity {
    fn session_state(&self) -> SessionState;
    fn set_session_state(&mut self, state: SessionState);
    fn idle_timer_mut(&mut self) -> &mut Option<TimerToken>;
    fn firepotion_timer_mut(&mut self) -> &mut Option<TimerToken>;

    fn has_entered_game(&self) -> bool {
        self.session_state() != SessionState::AwaitingHandshake
    }

    fn is_active(&self) -> bool {
        self.session_state() == SessionState::Active
    }

    fn is_dead(&self) -> bool {
        self.session_state() == SessionState::Dead
    }

    /// Pushes the idle deadline `delay_ms` into the future.
    fn reset_idle_timer(&mut self, scheduler: &mut WorldScheduler, delay_ms: u64) {
        let id = self.id();
        if let Some(token) = self.idle_timer_mut().take() {
            scheduler.cancel(token);
        }
        *self.idle_timer_mut() = Some(scheduler.schedule_in(delay_ms, Timer::IdleTimeout(id)));
    }

    fn cancel_firepotion(&mut self, scheduler: &mut WorldScheduler) {
        if let Some(token) = self.firepotion_timer_mut().take() {
            scheduler.cancel(token);
        }
    }

    /// Cancels every timer owned by the session.
    fn cancel_session_timers(&mut self, scheduler: &mut WorldScheduler) {
        self.cancel_firepotion(scheduler);
        if let Some(token) = self.idle_timer_mut().take() {
            scheduler.cancel(token);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    base: EntityBase,
    character: CharacterState,
    session: SessionState,
    pub name: String,
    pub armor: Kind,
    pub weapon: Kind,
    pub armor_level: i32,
    pub weapon_level: i32,
    /// Mobs currently hating this player.
    pub haters: BTreeSet<EntityId>,
    pub last_checkpoint: Option<Checkpoint>,
    firepotion_timer: Option<TimerToken>,
    idle_timer: Option<TimerToken>,
}

impl Player {
    /// A freshly connected player that has not said HELLO yet.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, id: EntityId) -> Self {
        let mut player = Self {
            base: EntityBase::new(id, EntityType::Player, Kind::Warrior, Position::default()),
            character: CharacterState::new(rng, 0),
            session: SessionState::AwaitingHandshake,
            name: DEFAULT_NAME.to_string(),
            armor: Kind::ClothArmor,
            weapon: Kind::Sword1,
            armor_level: 0,
            weapon_level: 0,
            haters: BTreeSet::new(),
            last_checkpoint: None,
            firepotion_timer: None,
            idle_timer: None,
        };
        player.equip_armor(Kind::ClothArmor);
        player.equip_weapon(Kind::Sword1);
        player
    }

    /// Applies the HELLO fields: name, gear, facing and hit points.
    pub fn setup<R: Rng + ?Sized>(&mut self, rng: &mut R, name: String, armor: Kind, weapon: Kind) {
        self.name = name;
        self.base.kind = Kind::Warrior;
        self.equip_armor(armor);
        self.equip_weapon(weapon);
        self.character.orientation = Orientation::random(rng);
        self.update_hit_points();
    }

    pub fn equip_armor(&mut self, kind: Kind) {
        self.armor = kind;
        self.armor_level = kind.armor_level();
    }

    pub fn equip_weapon(&mut self, kind: Kind) {
        self.weapon = kind;
        self.weapon_level = kind.weapon_level();
    }

    /// Equips looted gear. Returns `true` when the maximum hit points
    /// changed and the client must be told.
    pub fn equip_item(&mut self, kind: Kind) -> bool {
        if kind.is_armor() {
            self.equip_armor(kind);
            self.update_hit_points();
            true
        } else if kind.is_weapon() {
            self.equip_weapon(kind);
            false
        } else {
            false
        }
    }

    /// Heals fully, with the maximum derived from the armor level.
    pub fn update_hit_points(&mut self) {
        self.reset_hit_points(formulas::hit_points(self.armor_level));
    }

    pub fn equip(&self, kind: Kind) -> Message {
        Message::Equip {
            id: self.id(),
            kind,
        }
    }

    pub fn hit_points_message(&self) -> Message {
        Message::HitPoints(self.max_hit_points())
    }

    pub fn welcome(&self) -> Message {
        Message::Welcome {
            id: self.id(),
            name: self.name.clone(),
            position: self.position(),
            hit_points: self.hit_points(),
        }
    }

    pub fn add_hater(&mut self, mob: EntityId) {
        self.haters.insert(mob);
    }

    pub fn remove_hater(&mut self, mob: EntityId) {
        self.haters.remove(&mob);
    }

    pub fn set_firepotion_timer(&mut self, token: TimerToken) {
        self.firepotion_timer = Some(token);
    }

    pub fn firepotion_expired(&mut self) {
        self.firepotion_timer = None;
    }

    pub fn has_firepotion(&self) -> bool {
        self.firepotion_timer.is_some()
    }
}

impl Entity for Player {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn state(&self) -> Vec<Value> {
        let mut state = self.base.state();
        state.extend([
            json!(self.name),
            json!(self.orientation().id()),
            json!(self.armor.id()),
            json!(self.weapon.id()),
        ]);
        if let Some(target) = self.target() {
            state.push(json!(target.0));
        }
        state
    }
}

impl Targetable for Player {
    fn character(&self) -> &CharacterState {
        &self.character
    }

    fn character_mut(&mut self) -> &mut CharacterState {
        &mut self.character
    }
}

impl Damageable for Player {}

impl SessionBound for Player {
    fn session_state(&self) -> SessionState {
        self.session
    }

    fn set_session_state(&mut self, state: SessionState) {
        self.session = state;
    }

    fn idle_timer_mut(&mut self) -> &mut Option<TimerToken> {
        &mut self.idle_timer
    }

    fn firepotion_timer_mut(&mut self) -> &mut Option<TimerToken> {
        &mut self.firepotion_timer
    }
}
