//! Items lying in the world and the chests that hold them.

use rand::Rng;

use crate::entity::{Entity, EntityBase};
use crate::kinds::Kind;
use crate::scheduler::TimerToken;
use crate::timer::{Timer, WorldScheduler};
use crate::types::{EntityId, EntityType, Position};

/// Pickable object.
///
/// Static items are placed by the map and come back after being taken.
/// Dynamic items (mob drops, chest contents) blink and then disappear if
/// nobody picks them up.
#[derive(Debug, Clone)]
pub struct Item {
    base: EntityBase,
    pub is_static: bool,
    pub is_from_chest: bool,
    blink_timer: Option<TimerToken>,
    despawn_timer: Option<TimerToken>,
}

impl Item {
    pub fn new(id: EntityId, kind: Kind, position: Position) -> Self {
        Self::with_type(id, EntityType::Item, kind, position)
    }

    fn with_type(id: EntityId, entity_type: EntityType, kind: Kind, position: Position) -> Self {
        Self {
            base: EntityBase::new(id, entity_type, kind, position),
            is_static: false,
            is_from_chest: false,
            blink_timer: None,
            despawn_timer: None,
        }
    }

    /// Dropped by a mob rather than placed by the map or a chest.
    pub fn is_dropped(&self) -> bool {
        !self.is_static && !self.is_from_chest
    }

    /// Starts the blink then despawn countdown.
    pub fn handle_despawn(
        &mut self,
        scheduler: &mut WorldScheduler,
        before_blink_ms: u64,
        blinking_ms: u64,
    ) {
        self.cancel_timers(scheduler);
        let id = self.id();
        self.blink_timer = Some(scheduler.schedule_in(before_blink_ms, Timer::ItemBlink(id)));
        self.despawn_timer = Some(scheduler.schedule_in(
            before_blink_ms.saturating_add(blinking_ms),
            Timer::ItemDespawn(id),
        ));
    }

    /// Records that the blink fired so it is not cancelled twice.
    pub fn blinked(&mut self) {
        self.blink_timer = None;
    }

    /// Cancels the countdown. Static items schedule their return and get
    /// the respawn token back.
    pub fn destroy(
        &mut self,
        scheduler: &mut WorldScheduler,
        respawn_delay_ms: u64,
    ) -> Option<TimerToken> {
        self.cancel_timers(scheduler);
        if self.is_static {
            Some(scheduler.schedule_in(respawn_delay_ms, Timer::ItemRespawn(self.id())))
        } else {
            None
        }
    }

    fn cancel_timers(&mut self, scheduler: &mut WorldScheduler) {
        if let Some(token) = self.blink_timer.take() {
            scheduler.cancel(token);
        }
        if let Some(token) = self.despawn_timer.take() {
            scheduler.cancel(token);
        }
    }

    pub fn has_pending_despawn(&self) -> bool {
        self.despawn_timer.is_some()
    }
}

impl Entity for Item {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// Item holding a pool of loot; opening it yields one kind at random.
#[derive(Debug, Clone)]
pub struct Chest {
    pub item: Item,
    pub items: Vec<Kind>,
}

impl Chest {
    pub fn new(id: EntityId, position: Position, items: Vec<Kind>) -> Self {
        Self {
            item: Item::with_type(id, EntityType::Chest, Kind::Chest, position),
            items,
        }
    }

    /// Uniform pick from the pool. The pool itself is never consumed.
    pub fn random_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Kind> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.gen_range(0..self.items.len())])
    }
}

impl Entity for Chest {
    fn base(&self) -> &EntityBase {
        self.item.base()
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        self.item.base_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn fire(scheduler: &mut WorldScheduler, until: u64) -> Vec<Timer> {
        let mut fired = Vec::new();
        while let Some(timer) = scheduler.pop_due(until) {
            fired.push(timer);
        }
        scheduler.advance_to(until);
        fired
    }

    #[test]
    fn blinks_then_despawns() {
        let mut scheduler = WorldScheduler::new();
        let mut item = Item::new(EntityId(9), Kind::Flask, Position::new(3, 3));
        item.handle_despawn(&mut scheduler, 10, 20);

        assert!(fire(&mut scheduler, 9).is_empty());
        assert_eq!(fire(&mut scheduler, 15), vec![Timer::ItemBlink(EntityId(9))]);
        assert_eq!(fire(&mut scheduler, 35), vec![Timer::ItemDespawn(EntityId(9))]);
    }

    #[test]
    fn destroy_cancels_both_timers() {
        let mut scheduler = WorldScheduler::new();
        let mut item = Item::new(EntityId(9), Kind::Flask, Position::new(3, 3));
        item.handle_despawn(&mut scheduler, 10, 20);

        assert_eq!(item.destroy(&mut scheduler, 30_000), None);
        assert!(fire(&mut scheduler, 100).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn static_items_schedule_respawn() {
        let mut scheduler = WorldScheduler::new();
        let mut item = Item::new(EntityId(4), Kind::Axe, Position::new(1, 1));
        item.is_static = true;

        let token = item.destroy(&mut scheduler, 30_000);
        assert!(token.is_some_and(|t| scheduler.is_pending(t)));
        assert_eq!(fire(&mut scheduler, 30_000), vec![Timer::ItemRespawn(EntityId(4))]);
    }

    #[test]
    fn chest_state_and_type() {
        let chest = Chest::new(EntityId(2), Position::new(5, 6), vec![Kind::Flask]);
        assert_eq!(chest.entity_type(), EntityType::Chest);
        assert_eq!(chest.kind(), Kind::Chest);
        assert_eq!(chest.state().len(), 4);
    }

    #[test]
    fn chest_draws_are_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = vec![Kind::Flask, Kind::Burger, Kind::Axe, Kind::RedArmor];
        let chest = Chest::new(EntityId(1), Position::new(1, 1), pool.clone());

        let mut counts: HashMap<Kind, usize> = HashMap::new();
        for _ in 0..4000 {
            let kind = chest.random_item(&mut rng).unwrap();
            *counts.entry(kind).or_default() += 1;
        }
        for kind in pool {
            let count = counts.get(&kind).copied().unwrap_or(0);
            assert!((800..1200).contains(&count), "{:?} drawn {} times", kind, count);
        }
        assert_eq!(chest.items.len(), 4);
    }

    #[test]
    fn empty_chest_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let chest = Chest::new(EntityId(1), Position::new(1, 1), Vec::new());
        assert_eq!(chest.random_item(&mut rng), None);
    }
}
