#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Stronghold.
//!
//! The world owns the level graph, every troop in transit and the round clock.
//! All mutations flow through [`apply`]; read access goes through [`query`].

mod navigation;
mod towers;
mod troops;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stronghold_core::{
    ArrivalEffect, Body, Command, DispatchRejection, Event, Faction, LevelDescriptor, PlayMode,
    RoundOutcome, SimulationConfig, TowerId, TroopId, Vec2,
};
use tracing::{debug, info};

use crate::{
    towers::{AssaultOutcome, CaptureStep, FlowRates, Tower},
    troops::{PendingSpawn, SpawnQueue, Stride, Troop},
};

/// Represents the authoritative Stronghold world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    rates: FlowRates,
    round: u32,
    towers: Vec<Tower>,
    contenders: Vec<Faction>,
    troops: Vec<Troop>,
    spawns: SpawnQueue,
    next_troop_id: u32,
    play_mode: PlayMode,
    outcome: Option<RoundOutcome>,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an empty world using the default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates an empty world using the provided tuning.
    ///
    /// The world holds no towers until a [`Command::LoadLevel`] is applied.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            rates: FlowRates::from_config(&config),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            round: 0,
            towers: Vec::new(),
            contenders: Vec::new(),
            troops: Vec::new(),
            spawns: SpawnQueue::default(),
            next_troop_id: 0,
            play_mode: PlayMode::Running,
            outcome: None,
            elapsed: Duration::ZERO,
        }
    }

    fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.get(tower_index(id))
    }

    fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.towers.get_mut(tower_index(id))
    }

    fn load(&mut self, level: LevelDescriptor, out_events: &mut Vec<Event>) {
        let radius = self.config.tower_radius;
        self.towers = level
            .towers
            .iter()
            .enumerate()
            .map(|(index, spec)| Tower::from_spec(tower_id(index), spec, radius))
            .collect();

        let count = self.towers.len();
        for &(first, second) in &level.connections {
            if first == second || first >= count || second >= count {
                continue;
            }
            self.towers[first].connect(tower_id(second));
            self.towers[second].connect(tower_id(first));
        }

        self.contenders = self
            .towers
            .iter()
            .filter(|tower| tower.is_master && !tower.owner.is_neutral())
            .map(|tower| tower.owner)
            .collect();
        self.contenders.sort();
        self.contenders.dedup();

        self.round = level.round;
        self.troops.clear();
        self.spawns.clear();
        self.next_troop_id = 0;
        self.outcome = None;
        self.elapsed = Duration::ZERO;

        info!(round = self.round, towers = count, "level loaded");
        out_events.push(Event::LevelLoaded {
            round: self.round,
            towers: count,
        });

        if self.play_mode != PlayMode::Running {
            self.play_mode = PlayMode::Running;
            out_events.push(Event::PlayModeChanged {
                mode: PlayMode::Running,
            });
        }
    }

    fn dispatch_blocker(&self, source: TowerId, target: TowerId) -> Option<DispatchRejection> {
        if self.play_mode == PlayMode::Paused {
            return Some(DispatchRejection::Paused);
        }
        if self.outcome.is_some() {
            return Some(DispatchRejection::RoundOver);
        }
        if self.tower(source).is_none() || self.tower(target).is_none() {
            return Some(DispatchRejection::UnknownTower);
        }
        if source == target {
            return Some(DispatchRejection::SameTower);
        }
        None
    }

    fn dispatch(&mut self, source: TowerId, target: TowerId, out_events: &mut Vec<Event>) {
        let reject = |reason: DispatchRejection, out_events: &mut Vec<Event>| {
            debug!(source = source.get(), target = target.get(), ?reason, "dispatch ignored");
            out_events.push(Event::DispatchRejected {
                source,
                target,
                reason,
            });
        };

        if let Some(reason) = self.dispatch_blocker(source, target) {
            reject(reason, out_events);
            return;
        }

        let Some(route) = navigation::find_route(&self.towers, source, target) else {
            reject(DispatchRejection::NoRoute, out_events);
            return;
        };

        let Some(origin) = self.tower_mut(source) else {
            reject(DispatchRejection::UnknownTower, out_events);
            return;
        };

        let sendable = (origin.units / 2.0).floor();
        if sendable <= 0.0 {
            reject(DispatchRejection::NoUnits, out_events);
            return;
        }

        origin.units -= sendable;
        debug_assert!(origin.units >= 0.0, "dispatch drove a garrison negative");
        let owner = origin.owner;
        let position = origin.position;
        let count = sendable as u32;

        let stagger = self.config.spawn_stagger();
        let jitter = self.config.spawn_jitter;
        for index in 0..count {
            let offset = Vec2::new(self.rng.gen::<f32>() - 0.5, self.rng.gen::<f32>() - 0.5);
            self.spawns.schedule(PendingSpawn {
                due: self.elapsed.saturating_add(stagger.saturating_mul(index)),
                owner,
                origin: source,
                position: position + offset * jitter,
                route: route.clone(),
            });
        }

        debug!(
            source = source.get(),
            target = target.get(),
            count,
            hops = route.len(),
            "troops dispatched"
        );
        out_events.push(Event::TroopsDispatched {
            source,
            target,
            owner,
            count,
            hops: route.len(),
        });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        let seconds = dt.as_secs_f32();

        self.release_spawns(out_events);

        let mut master_settled = false;
        for tower in &mut self.towers {
            match tower.advance(dt, &self.rates) {
                Some(CaptureStep::OwnerFlipped { from, to }) => {
                    info!(tower = tower.id.get(), ?from, ?to, "master tower changed owner");
                    out_events.push(Event::TowerCaptured {
                        tower: tower.id,
                        from,
                        to,
                    });
                }
                Some(CaptureStep::Settled { owner }) => {
                    master_settled |= tower.is_master;
                    out_events.push(Event::CaptureSettled {
                        tower: tower.id,
                        owner,
                    });
                }
                None => {}
            }
        }

        self.advance_troops(seconds);
        self.resolve_arrivals(out_events);

        if master_settled {
            self.evaluate_outcome(out_events);
        }
    }

    fn release_spawns(&mut self, out_events: &mut Vec<Event>) {
        for spawn in self.spawns.release(self.elapsed) {
            let id = TroopId::new(self.next_troop_id);
            self.next_troop_id = self.next_troop_id.saturating_add(1);
            self.troops.push(Troop::new(
                id,
                spawn.owner,
                spawn.position,
                self.config.troop_radius,
                spawn.origin,
                spawn.route,
            ));
            out_events.push(Event::TroopSpawned {
                troop: id,
                owner: spawn.owner,
            });
        }
    }

    fn advance_troops(&mut self, seconds: f32) {
        let stride = Stride {
            speed: self.config.troop_speed,
            bend: self.config.lane_bend,
        };
        let towers = &self.towers;
        for troop in &mut self.troops {
            troop.advance(seconds, stride, |id| {
                towers.get(tower_index(id)).map(Body::position)
            });
        }
    }

    fn resolve_arrivals(&mut self, out_events: &mut Vec<Event>) {
        if !self.troops.iter().any(Troop::has_arrived) {
            return;
        }

        let (arrived, in_transit): (Vec<Troop>, Vec<Troop>) =
            self.troops.drain(..).partition(Troop::has_arrived);
        self.troops = in_transit;

        for troop in arrived {
            let Some(destination) = troop.destination() else {
                continue;
            };

            let (effect, capture) = self.strike(destination, troop.owner);
            out_events.push(Event::TroopArrived {
                troop: troop.id,
                tower: destination,
                effect,
            });
            if let Some(capture) = capture {
                out_events.push(capture);
            }
        }
    }

    fn strike(&mut self, id: TowerId, owner: Faction) -> (ArrivalEffect, Option<Event>) {
        let Some(tower) = self.tower_mut(id) else {
            return (ArrivalEffect::Ignored, None);
        };

        if tower.owner == owner {
            let effect = if tower.reinforce() {
                ArrivalEffect::Reinforced
            } else {
                ArrivalEffect::Ignored
            };
            return (effect, None);
        }

        match tower.assault(owner) {
            AssaultOutcome::Ignored => (ArrivalEffect::Ignored, None),
            AssaultOutcome::Held => (ArrivalEffect::Attacked, None),
            AssaultOutcome::Captured { from } => {
                debug!(tower = id.get(), ?from, to = ?owner, "tower captured");
                (
                    ArrivalEffect::Captured,
                    Some(Event::TowerCaptured {
                        tower: id,
                        from,
                        to: owner,
                    }),
                )
            }
            AssaultOutcome::CollapseStarted => {
                info!(tower = id.get(), attacker = ?owner, "master tower collapsing");
                (
                    ArrivalEffect::Captured,
                    Some(Event::CaptureStarted {
                        tower: id,
                        attacker: owner,
                    }),
                )
            }
        }
    }

    fn holds_master(&self, faction: Faction) -> bool {
        self.towers
            .iter()
            .any(|tower| tower.is_master && tower.owner == faction)
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        let animating = self
            .towers
            .iter()
            .any(|tower| tower.is_master && tower.capture().is_animating());
        if animating {
            return;
        }

        let human = self.config.human;
        let outcome = if !self.holds_master(human) {
            RoundOutcome::Defeat
        } else if self
            .contenders
            .iter()
            .filter(|faction| **faction != human)
            .all(|faction| !self.holds_master(*faction))
        {
            RoundOutcome::Victory
        } else {
            return;
        };

        info!(round = self.round, ?outcome, "round concluded");
        self.outcome = Some(outcome);
        out_events.push(match outcome {
            RoundOutcome::Victory => Event::Victory { round: self.round },
            RoundOutcome::Defeat => Event::Defeat { round: self.round },
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => world.load(level, out_events),
        Command::Tick { dt } => {
            if world.play_mode == PlayMode::Paused || world.outcome.is_some() {
                return;
            }
            world.advance(dt, out_events);
        }
        Command::Dispatch { source, target } => world.dispatch(source, target, out_events),
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
    }
}

fn tower_id(index: usize) -> TowerId {
    TowerId::new(u32::try_from(index).unwrap_or(u32::MAX))
}

fn tower_index(id: TowerId) -> usize {
    usize::try_from(id.get()).unwrap_or(usize::MAX)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use stronghold_core::{
        Faction, Lane, LaneCurve, PlayMode, RoundOutcome, SimulationConfig, TowerSnapshot,
        TowerView, TroopView,
    };

    use super::World;

    /// Captures a read-only view of every tower in the level.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let capacity = world.config.tower_capacity;
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(capacity))
                .collect(),
        )
    }

    /// Captures a read-only view of every troop in transit.
    #[must_use]
    pub fn troop_view(world: &World) -> TroopView {
        TroopView::from_snapshots(world.troops.iter().map(|troop| troop.snapshot()).collect())
    }

    /// Snapshots of the towers currently owned by `faction`, in id order.
    #[must_use]
    pub fn towers_owned_by(world: &World, faction: Faction) -> Vec<TowerSnapshot> {
        let capacity = world.config.tower_capacity;
        world
            .towers
            .iter()
            .filter(|tower| tower.owner == faction)
            .map(|tower| tower.snapshot(capacity))
            .collect()
    }

    /// Every undirected lane of the level with the curve troops follow on it.
    #[must_use]
    pub fn lanes(world: &World) -> Vec<Lane> {
        let bend = world.config.lane_bend;
        let mut lanes = Vec::new();
        for tower in &world.towers {
            for &neighbor in &tower.neighbors {
                if neighbor <= tower.id {
                    continue;
                }
                let Some(other) = world.tower(neighbor) else {
                    continue;
                };
                lanes.push(Lane {
                    low: tower.id,
                    high: neighbor,
                    curve: LaneCurve::for_leg(
                        tower.position,
                        other.position,
                        tower.id,
                        neighbor,
                        bend,
                    ),
                });
            }
        }
        lanes
    }

    /// Reports whether the simulation is running or paused.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Round number of the loaded level.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Outcome of the round once victory or defeat has fired.
    #[must_use]
    pub fn outcome(world: &World) -> Option<RoundOutcome> {
        world.outcome
    }

    /// Simulated time elapsed since the level was loaded.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of troops still waiting for their stagger delay.
    #[must_use]
    pub fn pending_spawns(world: &World) -> usize {
        world.spawns.len()
    }

    /// Factions that owned a master tower when the level was loaded.
    #[must_use]
    pub fn contenders(world: &World) -> &[Faction] {
        &world.contenders
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stronghold_core::TowerSpec;

    fn duel() -> LevelDescriptor {
        LevelDescriptor {
            round: 1,
            towers: vec![
                TowerSpec::new(0.0, 400.0, Faction::PLAYER_A, 30.0, true),
                TowerSpec::new(0.0, 0.0, Faction::PLAYER_B, 30.0, true),
                TowerSpec::new(0.0, 200.0, Faction::NEUTRAL, 10.0, false),
            ],
            connections: vec![(0, 2), (2, 1)],
        }
    }

    fn loaded(level: LevelDescriptor) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::LoadLevel { level }, &mut events);
        world
    }

    #[test]
    fn load_builds_symmetric_adjacency() {
        let world = loaded(duel());
        let view = query::tower_view(&world);

        let neighbors = |id: u32| {
            view.get(TowerId::new(id))
                .map(|tower| tower.neighbors.clone())
                .unwrap_or_default()
        };
        assert_eq!(neighbors(0), vec![TowerId::new(2)]);
        assert_eq!(neighbors(1), vec![TowerId::new(2)]);
        assert_eq!(neighbors(2), vec![TowerId::new(0), TowerId::new(1)]);
        assert_eq!(
            query::contenders(&world),
            &[Faction::PLAYER_A, Faction::PLAYER_B]
        );
    }

    #[test]
    fn load_skips_malformed_edges() {
        let mut level = duel();
        level.connections.extend([(0, 0), (1, 9), (2, 0)]);
        let world = loaded(level);

        assert_eq!(query::lanes(&world).len(), 2);
    }

    #[test]
    fn lanes_are_listed_once_per_edge() {
        let world = loaded(duel());
        let lanes = query::lanes(&world);
        let pairs: Vec<(u32, u32)> = lanes
            .iter()
            .map(|lane| (lane.low.get(), lane.high.get()))
            .collect();

        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
        assert_eq!(lanes[0].curve.start(), Vec2::new(0.0, 400.0));
        assert_eq!(lanes[0].curve.end(), Vec2::new(0.0, 200.0));
    }

    #[test]
    fn towers_owned_by_filters_by_faction() {
        let world = loaded(duel());
        let owned: Vec<TowerId> = query::towers_owned_by(&world, Faction::NEUTRAL)
            .into_iter()
            .map(|tower| tower.id)
            .collect();

        assert_eq!(owned, vec![TowerId::new(2)]);
    }

    #[test]
    fn dispatch_to_self_is_rejected() {
        let mut world = loaded(duel());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Dispatch {
                source: TowerId::new(0),
                target: TowerId::new(0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::DispatchRejected {
                source: TowerId::new(0),
                target: TowerId::new(0),
                reason: DispatchRejection::SameTower,
            }]
        );
        assert_eq!(query::pending_spawns(&world), 0);
    }

    #[test]
    fn play_mode_changes_are_edge_triggered() {
        let mut world = loaded(duel());
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SetPlayMode {
                mode: PlayMode::Paused,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetPlayMode {
                mode: PlayMode::Paused,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PlayModeChanged {
                mode: PlayMode::Paused
            }]
        );
    }
}
