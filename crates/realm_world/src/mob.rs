//! Hostile characters and their hate lists.
//!
//! A mob idles or roams until a player angers it, attacks whoever it hates
//! most, walks back home once it has nobody left to hate and respawns some
//! time after dying. Timers for returning and respawning live on the world
//! scheduler; the mob only keeps the tokens needed to cancel them.

use rand::Rng;

use crate::entity::{CharacterState, Damageable, Entity, EntityBase, Targetable};
use crate::kinds::Kind;
use crate::scheduler::TimerToken;
use crate::timer::{Timer, WorldScheduler};
use crate::types::{EntityId, EntityType, Position};

/// Accumulated hostility towards one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hate {
    pub player: EntityId,
    pub hate: i32,
}

/// Which spawn control area a mob belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaRef {
    /// Index into the world's mob areas.
    Mob(usize),
    /// Index into the world's chest areas.
    Chest(usize),
}

/// Ranking of players by accumulated hate.
pub trait HateTracking {
    fn hatelist(&self) -> &[Hate];
    fn hatelist_mut(&mut self) -> &mut Vec<Hate>;

    fn hates(&self, player: EntityId) -> bool {
        self.hatelist().iter().any(|h| h.player == player)
    }

    /// Adds `points` to the player's score, creating the entry if needed.
    fn add_hate(&mut self, player: EntityId, points: i32) {
        let points = points.max(0);
        let list = self.hatelist_mut();
        match list.iter_mut().find(|h| h.player == player) {
            Some(entry) => entry.hate += points,
            None => list.push(Hate {
                player,
                hate: points,
            }),
        }
    }

    /// Player at `rank` when sorted by descending hate, 1 being the most
    /// hated. Ranks out of range fall back to the most hated player. Equal
    /// scores keep insertion order.
    fn hated_player_id(&self, rank: Option<usize>) -> Option<EntityId> {
        let mut sorted: Vec<Hate> = self.hatelist().to_vec();
        sorted.sort_by(|a, b| b.hate.cmp(&a.hate));

        let index = match rank {
            Some(rank) if rank >= 1 && rank <= sorted.len() => rank - 1,
            _ => 0,
        };
        sorted.get(index).map(|h| h.player)
    }

    fn hater_ids(&self) -> Vec<EntityId> {
        self.hatelist().iter().map(|h| h.player).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Mob {
    base: EntityBase,
    character: CharacterState,
    pub spawning_position: Position,
    pub armor_level: i32,
    pub weapon_level: i32,
    hatelist: Vec<Hate>,
    pub is_dead: bool,
    pub area: Option<AreaRef>,
    return_timer: Option<TimerToken>,
    pub respawn_timer: Option<TimerToken>,
}

impl Mob {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, id: EntityId, kind: Kind, position: Position) -> Self {
        let max_hit_points = kind.mob_hit_points().unwrap_or(1);
        Self {
            base: EntityBase::new(id, EntityType::Mob, kind, position),
            character: CharacterState::new(rng, max_hit_points),
            spawning_position: position,
            armor_level: kind.armor_level(),
            weapon_level: kind.weapon_level(),
            hatelist: Vec::new(),
            is_dead: false,
            area: None,
            return_timer: None,
            respawn_timer: None,
        }
    }

    /// Adds hate and calls off a pending walk home.
    ///
    /// The target is not picked here; the world chooses it right after.
    pub fn increase_hate_for(
        &mut self,
        player: EntityId,
        points: i32,
        scheduler: &mut WorldScheduler,
    ) {
        self.add_hate(player, points);
        if let Some(token) = self.return_timer.take() {
            scheduler.cancel(token);
        }
    }

    /// Drops one player from the hate list. With nobody left to hate the
    /// mob heads home after `delay_ms`.
    pub fn forget_player(
        &mut self,
        player: EntityId,
        delay_ms: u64,
        scheduler: &mut WorldScheduler,
    ) {
        self.hatelist.retain(|h| h.player != player);
        if self.hatelist.is_empty() {
            self.return_to_spawning_position(delay_ms, scheduler);
        }
    }

    /// Clears the hate list and heads home almost immediately.
    pub fn forget_everyone(&mut self, scheduler: &mut WorldScheduler) {
        self.hatelist.clear();
        self.return_to_spawning_position(1, scheduler);
    }

    /// Drops the target and schedules the walk home.
    pub fn return_to_spawning_position(&mut self, delay_ms: u64, scheduler: &mut WorldScheduler) {
        self.clear_target();
        if let Some(token) = self.return_timer.take() {
            scheduler.cancel(token);
        }
        self.return_timer = Some(scheduler.schedule_in(delay_ms, Timer::MobReturn(self.id())));
    }

    pub fn is_returning(&self) -> bool {
        self.return_timer.is_some()
    }

    /// Called when the return timer fires.
    pub fn finish_return(&mut self) {
        self.return_timer = None;
        self.reset_position();
    }

    pub fn reset_position(&mut self) {
        let home = self.spawning_position;
        self.set_position(home);
    }

    pub fn distance_to_spawning_point(&self, position: Position) -> i32 {
        self.spawning_position.distance_to(position)
    }

    /// Puts the mob in its dead state: no hate, no target, full health and
    /// back home. Pending timers are cancelled.
    pub fn destroy(&mut self, scheduler: &mut WorldScheduler) {
        self.is_dead = true;
        self.hatelist.clear();
        self.clear_target();
        let max = self.max_hit_points();
        self.reset_hit_points(max);
        self.reset_position();

        if let Some(token) = self.return_timer.take() {
            scheduler.cancel(token);
        }
        if let Some(token) = self.respawn_timer.take() {
            scheduler.cancel(token);
        }
    }

    /// Brings a dead mob back at `position`.
    pub fn revive(&mut self, position: Position) {
        self.is_dead = false;
        self.respawn_timer = None;
        self.set_position(position);
    }
}

impl Entity for Mob {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn state(&self) -> Vec<serde_json::Value> {
        self.character_state()
    }
}

impl Targetable for Mob {
    fn character(&self) -> &CharacterState {
        &self.character
    }

    fn character_mut(&mut self) -> &mut CharacterState {
        &mut self.character
    }
}

impl Damageable for Mob {}

impl HateTracking for Mob {
    fn hatelist(&self) -> &[Hate] {
        &self.hatelist
    }

    fn hatelist_mut(&mut self) -> &mut Vec<Hate> {
        &mut self.hatelist
    }
}
