//! World simulation settings.

use serde::{Deserialize, Serialize};

/// Tunables of a single world.
///
/// Every duration is in milliseconds of simulated time. Missing fields take
/// their default when deserialized, so partial config files are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Index of this world, reported in population notices
    pub id: usize,

    /// Simulation ticks per second
    pub updates_per_second: u32,

    /// Players allowed in the world at once
    pub max_players: usize,

    /// Silence allowed before a player is disconnected
    pub idle_timeout_ms: u64,

    /// Delay before a dead mob comes back
    pub mob_respawn_delay_ms: u64,

    /// Delay before a picked up static item or chest comes back
    pub item_respawn_delay_ms: u64,

    /// Delay before a disengaged mob walks home
    pub return_to_spawn_delay_ms: u64,

    /// Delay before mobs forget a player that died or teleported away
    pub forget_on_vanish_delay_ms: u64,

    /// Time a dropped item stays still before blinking
    pub item_before_blink_ms: u64,

    /// Time a dropped item blinks before disappearing
    pub item_blinking_ms: u64,

    /// Duration of the firepotion effect
    pub firepotion_duration_ms: u64,

    /// Period of the mob roaming sweep
    pub roaming_interval_ms: u64,

    /// Each idle mob roams with probability `1 / roaming_chance` per sweep
    pub roaming_chance: u32,

    /// Distance from its spawn beyond which a mob stops chasing
    pub max_chase_distance: i32,

    /// Ticks between regeneration sweeps; 0 means two seconds worth
    pub regen_interval_ticks: u32,

    /// Seed for the world's random generator, random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            id: 0,
            updates_per_second: 50,
            max_players: 200,
            idle_timeout_ms: 15 * 60 * 1000,
            mob_respawn_delay_ms: 30_000,
            item_respawn_delay_ms: 30_000,
            return_to_spawn_delay_ms: 4_000,
            forget_on_vanish_delay_ms: 1_000,
            item_before_blink_ms: 10_000,
            item_blinking_ms: 4_000,
            firepotion_duration_ms: 15_000,
            roaming_interval_ms: 500,
            roaming_chance: 20,
            max_chase_distance: 50,
            regen_interval_ticks: 0,
            rng_seed: None,
        }
    }
}

impl WorldConfig {
    /// Simulated milliseconds per tick.
    pub fn tick_ms(&self) -> u64 {
        1000 / u64::from(self.updates_per_second.max(1))
    }

    pub fn regen_every_ticks(&self) -> u32 {
        if self.regen_interval_ticks == 0 {
            self.updates_per_second.max(1) * 2
        } else {
            self.regen_interval_ticks
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.updates_per_second == 0 || self.updates_per_second > 1000 {
            return Err("updates_per_second must be between 1 and 1000".to_string());
        }
        if self.max_players == 0 {
            return Err("max_players must be greater than 0".to_string());
        }
        if self.roaming_chance == 0 {
            return Err("roaming_chance must be greater than 0".to_string());
        }
        if self.roaming_interval_ms == 0 {
            return Err("roaming_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}
