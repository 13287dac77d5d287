//! Delayed world actions.

use crate::types::EntityId;

/// A delayed action queued on the world scheduler.
///
/// Entity actions only carry ids. When one fires after its entity is gone
/// it is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// A dropped item starts blinking before it disappears.
    ItemBlink(EntityId),
    /// A dropped item or chest disappears.
    ItemDespawn(EntityId),
    /// A static item or chest comes back after being picked up.
    ItemRespawn(EntityId),
    /// A mob walks back to its spawning point.
    MobReturn(EntityId),
    /// A mob that no area owns comes back after dying.
    MobRespawn(EntityId),
    /// A mob owned by the given mob area comes back after dying.
    MobAreaRespawn { area: usize, mob: EntityId },
    /// A player's firepotion wears off.
    FirepotionExpire(EntityId),
    /// A player has been silent for too long.
    IdleTimeout(EntityId),
    /// Periodic sweep letting idle mobs wander inside their areas.
    RoamSweep,
}

pub type WorldScheduler = crate::scheduler::Scheduler<Timer>;
