#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Computer opponent that periodically dispatches troops for one faction.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use stronghold_core::{Command, Event, Faction, TowerSnapshot, TowerView};

/// Configuration parameters required to construct the bot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between the first decisions of a round and the lower bound later on.
    pub base_interval: f32,
    /// Upper bound of the random delay added after each decision.
    pub extra_interval: f32,
    /// Garrison a tower must exceed before it is used as a source.
    pub source_threshold: f32,
    /// Probability of going after the weakest hostile or neutral neighbor.
    pub attack_roll: f32,
    /// Cumulative probability below which the weakest friendly neighbor is reinforced.
    pub reinforce_roll: f32,
    /// Seed of the generator driving every random choice.
    pub rng_seed: u64,
}

impl Config {
    /// Creates the default configuration with the provided seed.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_interval: 2.0,
            extra_interval: 2.0,
            source_threshold: 10.0,
            attack_roll: 0.5,
            reinforce_roll: 0.8,
            rng_seed: 0xb07_5eed,
        }
    }
}

/// Pure system that picks a source and a neighboring target at random intervals.
#[derive(Debug)]
pub struct Bot {
    faction: Faction,
    config: Config,
    timer: Duration,
    interval: Duration,
    rng: ChaCha8Rng,
}

impl Bot {
    /// Creates a bot playing for `faction`.
    #[must_use]
    pub fn new(config: Config, faction: Faction) -> Self {
        Self {
            faction,
            interval: seconds(config.base_interval),
            timer: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Faction the bot plays for.
    #[must_use]
    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Consumes world events and the tower view to emit dispatch commands.
    pub fn handle(&mut self, events: &[Event], towers: &TowerView, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelLoaded { .. } => {
                    self.timer = Duration::ZERO;
                    self.interval = seconds(self.config.base_interval);
                }
                Event::TimeAdvanced { dt } => self.timer = self.timer.saturating_add(*dt),
                _ => {}
            }
        }

        if self.timer < self.interval {
            return;
        }

        self.timer = Duration::ZERO;
        let delay = self.config.base_interval + self.rng.gen::<f32>() * self.config.extra_interval;
        self.interval = seconds(delay);

        if let Some(command) = self.decide(towers) {
            out.push(command);
        }
    }

    fn decide(&mut self, towers: &TowerView) -> Option<Command> {
        let sources: Vec<&TowerSnapshot> = towers
            .owned_by(self.faction)
            .filter(|tower| tower.units > self.config.source_threshold)
            .collect();
        if sources.is_empty() {
            return None;
        }

        let source = sources[self.rng.gen_range(0..sources.len())];
        let neighbors: Vec<&TowerSnapshot> = source
            .neighbors
            .iter()
            .filter_map(|id| towers.get(*id))
            .collect();
        if neighbors.is_empty() {
            return None;
        }

        let roll = self.rng.gen::<f32>();
        let preferred = if roll < self.config.attack_roll {
            weakest(neighbors.iter().copied().filter(|tower| tower.owner != self.faction))
        } else if roll < self.config.reinforce_roll {
            weakest(neighbors.iter().copied().filter(|tower| tower.owner == self.faction))
        } else {
            None
        };

        let target = match preferred {
            Some(target) => target,
            None => neighbors[self.rng.gen_range(0..neighbors.len())],
        };

        Some(Command::Dispatch {
            source: source.id,
            target: target.id,
        })
    }
}

/// First tower with the smallest garrison, in neighbor order.
fn weakest<'a>(towers: impl Iterator<Item = &'a TowerSnapshot>) -> Option<&'a TowerSnapshot> {
    towers.fold(None, |best, tower| match best {
        Some(current) if current.units <= tower.units => Some(current),
        _ => Some(tower),
    })
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}
