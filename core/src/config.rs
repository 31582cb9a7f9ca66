//! Tuning surface of the simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Faction;

/// Tuning knobs consumed by the world when loading and advancing a round.
///
/// Every field has a default, so a settings file only needs to name the
/// values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Radius of every tower in world units.
    pub tower_radius: f32,
    /// Radius of every troop in world units.
    pub troop_radius: f32,
    /// Garrison size above which regeneration stops and decay begins.
    pub tower_capacity: f32,
    /// Time a non-neutral tower accumulates before regenerating one unit.
    pub regen_interval: f32,
    /// Units lost per time unit while a garrison exceeds capacity.
    pub overflow_decay_rate: f32,
    /// Scale change per time unit while a master tower collapses or rebuilds.
    pub capture_animation_rate: f32,
    /// Troop speed in world units per time unit.
    pub troop_speed: f32,
    /// Distance between a lane's chord midpoint and its control point.
    pub lane_bend: f32,
    /// Delay between consecutive troops of one dispatch, in milliseconds.
    pub spawn_stagger_ms: u64,
    /// Width of the square around the source tower in which troops spawn.
    pub spawn_jitter: f32,
    /// Seed of the generator used for spawn jitter.
    pub rng_seed: u64,
    /// Faction whose master tower decides victory and defeat.
    pub human: Faction,
}

impl SimulationConfig {
    /// Delay between consecutive troops of one dispatch.
    #[must_use]
    pub const fn spawn_stagger(&self) -> Duration {
        Duration::from_millis(self.spawn_stagger_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tower_radius: 40.0,
            troop_radius: 5.0,
            tower_capacity: 50.0,
            regen_interval: 1.0,
            overflow_decay_rate: 2.0,
            capture_animation_rate: 2.0,
            troop_speed: 100.0,
            lane_bend: 40.0,
            spawn_stagger_ms: 50,
            spawn_jitter: 20.0,
            rng_seed: 0x5eed_0f_7a11_ed5c,
            human: Faction::PLAYER_A,
        }
    }
}
