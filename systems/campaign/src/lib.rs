#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Built-in level data and round progression for Stronghold.
//!
//! Rounds one through five are handcrafted. Every later round is generated
//! procedurally from its number alone, so the same round always produces the
//! same level.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};
use stronghold_core::{Command, Event, Faction, LevelDescriptor, TowerSpec};

/// Number of handcrafted rounds before procedural generation takes over.
pub const HANDCRAFTED_ROUNDS: u32 = 5;

const LINK_DISTANCE: f32 = 350.0;

/// Playing field the levels are laid out on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    /// Horizontal extent in world units.
    pub width: f32,
    /// Vertical extent in world units.
    pub height: f32,
}

impl Arena {
    /// Creates an arena with the provided extents.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn centre_x(&self) -> f32 {
        self.width / 2.0
    }

    fn centre_y(&self) -> f32 {
        self.height / 2.0
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Produces the level descriptor for `round`.
///
/// Round zero is treated as round one.
#[must_use]
pub fn level(round: u32, arena: Arena) -> LevelDescriptor {
    let round = round.max(1);
    match round {
        1 => duel(arena),
        2 => diamond(arena),
        3 => cross(arena),
        4 => zig_zag(arena),
        5 => ring(arena),
        _ => procedural(round, arena),
    }
}

fn master(x: f32, y: f32, owner: Faction, units: f32) -> TowerSpec {
    TowerSpec::new(x, y, owner, units, true)
}

fn neutral(x: f32, y: f32, units: f32) -> TowerSpec {
    TowerSpec::new(x, y, Faction::NEUTRAL, units, false)
}

fn duel(arena: Arena) -> LevelDescriptor {
    let (cx, h) = (arena.centre_x(), arena.height);
    LevelDescriptor {
        round: 1,
        towers: vec![
            master(cx, h - 150.0, Faction::PLAYER_A, 30.0),
            master(cx, 150.0, Faction::PLAYER_B, 30.0),
            neutral(cx, h / 2.0, 10.0),
        ],
        connections: vec![(0, 2), (2, 1)],
    }
}

fn diamond(arena: Arena) -> LevelDescriptor {
    let (cx, h) = (arena.centre_x(), arena.height);
    LevelDescriptor {
        round: 2,
        towers: vec![
            master(cx, h - 150.0, Faction::PLAYER_A, 40.0),
            master(cx, 150.0, Faction::PLAYER_B, 40.0),
            neutral(cx - 200.0, h / 2.0, 15.0),
            neutral(cx + 200.0, h / 2.0, 15.0),
        ],
        connections: vec![(0, 2), (0, 3), (2, 1), (3, 1), (2, 3)],
    }
}

fn cross(arena: Arena) -> LevelDescriptor {
    let (cx, cy, h) = (arena.centre_x(), arena.centre_y(), arena.height);
    LevelDescriptor {
        round: 3,
        towers: vec![
            master(cx, h - 100.0, Faction::PLAYER_A, 50.0),
            master(cx, 100.0, Faction::PLAYER_B, 50.0),
            neutral(cx, cy, 20.0),
            neutral(cx - 250.0, cy, 30.0),
            neutral(cx + 250.0, cy, 30.0),
        ],
        connections: vec![
            (0, 2),
            (2, 1),
            (2, 3),
            (2, 4),
            (0, 3),
            (0, 4),
            (1, 3),
            (1, 4),
        ],
    }
}

fn zig_zag(arena: Arena) -> LevelDescriptor {
    let (cx, cy, h) = (arena.centre_x(), arena.centre_y(), arena.height);
    LevelDescriptor {
        round: 4,
        towers: vec![
            master(cx, h - 100.0, Faction::PLAYER_A, 60.0),
            master(cx, 100.0, Faction::PLAYER_B, 60.0),
            neutral(cx - 150.0, h - 250.0, 20.0),
            neutral(cx + 150.0, cy, 20.0),
            neutral(cx - 150.0, 250.0, 20.0),
        ],
        connections: vec![(0, 2), (2, 3), (3, 4), (4, 1), (0, 3), (1, 3)],
    }
}

fn ring(arena: Arena) -> LevelDescriptor {
    let (cx, cy, h) = (arena.centre_x(), arena.centre_y(), arena.height);
    let mut towers = vec![
        master(cx, h - 150.0, Faction::PLAYER_A, 60.0),
        master(cx, 150.0, Faction::PLAYER_B, 60.0),
    ];
    towers.extend(circle(cx, cy, 250.0, 6).map(|(x, y)| neutral(x, y, 25.0)));

    LevelDescriptor {
        round: 5,
        towers,
        connections: vec![
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 2),
            (0, 3),
            (0, 4),
            (1, 6),
            (1, 7),
            (2, 5),
        ],
    }
}

fn procedural(round: u32, arena: Arena) -> LevelDescriptor {
    let (cx, cy) = (arena.centre_x(), arena.centre_y());
    let strength = round as f32;

    let mut towers = vec![
        master(cx, arena.height - 100.0, Faction::PLAYER_A, 50.0),
        master(cx, 100.0, Faction::PLAYER_B, 30.0 + strength * 5.0),
    ];

    let rings = 1 + round / 4;
    for layer in 0..rings {
        let radius = 200.0 + layer as f32 * 150.0;
        let count = 4 + layer * 2;
        towers.extend(
            circle(cx, cy, radius, count).map(|(x, y)| neutral(x, y, 10.0 + strength * 2.0)),
        );
    }

    let mut connections = Vec::new();
    for (i, first) in towers.iter().enumerate() {
        for (j, second) in towers.iter().enumerate().skip(i + 1) {
            if first.position().distance(second.position()) < LINK_DISTANCE {
                connections.push((i, j));
            }
        }
    }

    LevelDescriptor {
        round,
        towers,
        connections,
    }
}

fn circle(cx: f32, cy: f32, radius: f32, count: u32) -> impl Iterator<Item = (f32, f32)> {
    (0..count).map(move |index| {
        let angle = TAU / count as f32 * index as f32;
        (cx + angle.cos() * radius, cy + angle.sin() * radius)
    })
}

/// Configuration parameters required to construct the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Round played first.
    pub first_round: u32,
    /// Last round before the campaign starts over.
    pub max_rounds: u32,
    /// Playing field the levels are laid out on.
    pub arena: Arena,
}

impl Config {
    /// Creates a configuration starting at `first_round`.
    #[must_use]
    pub fn new(first_round: u32, max_rounds: u32, arena: Arena) -> Self {
        Self {
            first_round,
            max_rounds,
            arena,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(1, 20, Arena::default())
    }
}

/// Pure system that loads the next level whenever a round concludes.
#[derive(Debug)]
pub struct Campaign {
    round: u32,
    max_rounds: u32,
    arena: Arena,
}

impl Campaign {
    /// Creates a campaign positioned at the configured first round.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let max_rounds = config.max_rounds.max(1);
        Self {
            round: config.first_round.clamp(1, max_rounds),
            max_rounds,
            arena: config.arena,
        }
    }

    /// Round the campaign currently plays.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Level descriptor of the current round.
    #[must_use]
    pub fn current_level(&self) -> LevelDescriptor {
        level(self.round, self.arena)
    }

    /// Emits the command that loads the current round.
    pub fn start(&self, out: &mut Vec<Command>) {
        out.push(self.load());
    }

    /// Reacts to round outcomes by advancing or retrying.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::Victory { .. } => {
                    self.round = if self.round >= self.max_rounds {
                        1
                    } else {
                        self.round + 1
                    };
                    out.push(self.load());
                }
                Event::Defeat { .. } => out.push(self.load()),
                _ => {}
            }
        }
    }

    fn load(&self) -> Command {
        Command::LoadLevel {
            level: self.current_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handcrafted_rounds_have_expected_shapes() {
        let arena = Arena::default();
        let shapes: Vec<(usize, usize)> = (1..=HANDCRAFTED_ROUNDS)
            .map(|round| {
                let level = level(round, arena);
                (level.towers.len(), level.connections.len())
            })
            .collect();

        assert_eq!(shapes, vec![(3, 2), (4, 5), (5, 8), (5, 6), (8, 11)]);
    }

    #[test]
    fn duel_is_laid_out_on_the_centre_line() {
        let level = level(1, Arena::default());

        assert_eq!(level.towers[0], master(640.0, 570.0, Faction::PLAYER_A, 30.0));
        assert_eq!(level.towers[1], master(640.0, 150.0, Faction::PLAYER_B, 30.0));
        assert_eq!(level.towers[2], neutral(640.0, 360.0, 10.0));
    }

    #[test]
    fn round_zero_is_round_one() {
        assert_eq!(level(0, Arena::default()), level(1, Arena::default()));
    }

    #[test]
    fn ring_places_six_neutrals_around_the_centre() {
        let level = level(5, Arena::default());

        for tower in &level.towers[2..] {
            let offset = tower.position().distance(stronghold_core::Vec2::new(640.0, 360.0));
            assert!((offset - 250.0).abs() < 1e-3);
            assert_eq!(tower.units, 25.0);
        }
    }

    #[test]
    fn circle_starts_on_the_positive_x_axis() {
        let points: Vec<(f32, f32)> = circle(0.0, 0.0, 10.0, 4).collect();

        assert_eq!(points[0], (10.0, 0.0));
        assert!((points[1].0).abs() < 1e-4);
        assert!((points[1].1 - 10.0).abs() < 1e-4);
    }
}
