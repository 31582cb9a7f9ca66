use std::time::Duration;

use stronghold_core::{
    ArrivalEffect, CaptureState, Command, DispatchRejection, Event, Faction, LevelDescriptor,
    PlayMode, RoundOutcome, SimulationConfig, TowerId, TowerSpec,
};
use stronghold_world::{self as world, query, World};

const A: Faction = Faction::PLAYER_A;
const B: Faction = Faction::PLAYER_B;
const C: Faction = Faction::new(3);
const N: Faction = Faction::NEUTRAL;

fn quiet_config() -> SimulationConfig {
    SimulationConfig {
        spawn_jitter: 0.0,
        regen_interval: 1000.0,
        ..SimulationConfig::default()
    }
}

fn level(towers: Vec<TowerSpec>, connections: Vec<(usize, usize)>) -> LevelDescriptor {
    LevelDescriptor {
        round: 1,
        towers,
        connections,
    }
}

fn duel() -> LevelDescriptor {
    level(
        vec![
            TowerSpec::new(0.0, 400.0, A, 30.0, true),
            TowerSpec::new(0.0, 0.0, B, 30.0, true),
            TowerSpec::new(0.0, 200.0, N, 10.0, false),
        ],
        vec![(0, 2), (2, 1)],
    )
}

fn siege(attacker_units: f32, defender_units: f32, human_attacks: bool) -> LevelDescriptor {
    let (first, second) = if human_attacks {
        (
            TowerSpec::new(0.0, 200.0, A, attacker_units, true),
            TowerSpec::new(0.0, 0.0, B, defender_units, true),
        )
    } else {
        (
            TowerSpec::new(0.0, 200.0, A, defender_units, true),
            TowerSpec::new(0.0, 0.0, B, attacker_units, true),
        )
    };
    level(vec![first, second], vec![(0, 1)])
}

fn loaded(level: LevelDescriptor) -> World {
    let mut world = World::with_config(quiet_config());
    let _ = run(&mut world, Command::LoadLevel { level });
    world
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn dispatch(world: &mut World, source: u32, target: u32) -> Vec<Event> {
    run(
        world,
        Command::Dispatch {
            source: TowerId::new(source),
            target: TowerId::new(target),
        },
    )
}

fn tick(world: &mut World) -> Vec<Event> {
    run(
        world,
        Command::Tick {
            dt: Duration::from_millis(250),
        },
    )
}

fn ticks(world: &mut World, count: usize) -> Vec<Event> {
    (0..count).flat_map(|_| tick(world)).collect()
}

fn units(world: &World, id: u32) -> f32 {
    query::tower_view(world)
        .get(TowerId::new(id))
        .map(|tower| tower.units)
        .unwrap_or(f32::NAN)
}

fn owner(world: &World, id: u32) -> Faction {
    query::tower_view(world)
        .get(TowerId::new(id))
        .map(|tower| tower.owner)
        .unwrap_or(N)
}

fn effects(events: &[Event], wanted: ArrivalEffect) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::TroopArrived { effect, .. } if *effect == wanted))
        .count()
}

fn position_of(events: &[Event], predicate: impl Fn(&Event) -> bool) -> Option<usize> {
    events.iter().position(predicate)
}

#[test]
fn dispatch_commits_half_the_garrison_up_front() {
    let mut world = loaded(duel());

    let events = dispatch(&mut world, 0, 2);

    assert_eq!(
        events,
        vec![Event::TroopsDispatched {
            source: TowerId::new(0),
            target: TowerId::new(2),
            owner: A,
            count: 15,
            hops: 1,
        }]
    );
    assert_eq!(units(&world, 0), 15.0);
    assert_eq!(query::pending_spawns(&world), 15);
    assert!(query::troop_view(&world).is_empty());
}

#[test]
fn single_unit_source_sends_nobody() {
    let mut world = loaded(level(
        vec![
            TowerSpec::new(0.0, 0.0, A, 1.0, true),
            TowerSpec::new(100.0, 0.0, N, 5.0, false),
        ],
        vec![(0, 1)],
    ));

    let events = dispatch(&mut world, 0, 1);

    assert_eq!(
        events,
        vec![Event::DispatchRejected {
            source: TowerId::new(0),
            target: TowerId::new(1),
            reason: DispatchRejection::NoUnits,
        }]
    );
    assert_eq!(units(&world, 0), 1.0);
    assert_eq!(query::pending_spawns(&world), 0);
}

#[test]
fn hostile_territory_blocks_multi_hop_dispatch() {
    let mut world = loaded(duel());

    let events = dispatch(&mut world, 0, 1);

    assert_eq!(
        events,
        vec![Event::DispatchRejected {
            source: TowerId::new(0),
            target: TowerId::new(1),
            reason: DispatchRejection::NoRoute,
        }]
    );
    assert_eq!(units(&world, 0), 30.0);
}

#[test]
fn unknown_towers_are_rejected() {
    let mut world = loaded(duel());

    let events = dispatch(&mut world, 0, 9);

    assert_eq!(
        events,
        vec![Event::DispatchRejected {
            source: TowerId::new(0),
            target: TowerId::new(9),
            reason: DispatchRejection::UnknownTower,
        }]
    );
}

#[test]
fn neutral_tower_is_taken_and_reinforced() {
    let mut world = loaded(duel());
    let _ = dispatch(&mut world, 0, 2);
    assert_eq!(units(&world, 0), 15.0);

    let events = ticks(&mut world, 16);

    assert_eq!(owner(&world, 2), A);
    assert_eq!(units(&world, 2), 5.0);
    assert_eq!(units(&world, 0), 15.0);
    assert!(query::troop_view(&world).is_empty());
    assert_eq!(query::pending_spawns(&world), 0);

    assert_eq!(effects(&events, ArrivalEffect::Attacked), 10);
    assert_eq!(effects(&events, ArrivalEffect::Captured), 1);
    assert_eq!(effects(&events, ArrivalEffect::Reinforced), 4);

    let captures: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::TowerCaptured { .. }))
        .collect();
    assert_eq!(
        captures,
        vec![&Event::TowerCaptured {
            tower: TowerId::new(2),
            from: N,
            to: A,
        }]
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::CaptureStarted { .. })));
}

#[test]
fn spawns_are_staggered_across_ticks() {
    let mut world = loaded(duel());
    let _ = dispatch(&mut world, 0, 2);

    let spawned = |events: &[Event]| {
        events
            .iter()
            .filter(|event| matches!(event, Event::TroopSpawned { .. }))
            .count()
    };

    assert_eq!(spawned(&tick(&mut world)), 6);
    assert_eq!(spawned(&tick(&mut world)), 5);
    assert_eq!(spawned(&tick(&mut world)), 4);
    assert_eq!(spawned(&tick(&mut world)), 0);
    assert_eq!(query::troop_view(&world).len(), 15);
}

#[test]
fn master_capture_fires_once_and_ends_in_victory() {
    let mut world = loaded(siege(40.0, 3.0, true));
    let _ = dispatch(&mut world, 0, 1);

    let events = ticks(&mut world, 12);

    let started: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::CaptureStarted { .. }))
        .collect();
    assert_eq!(
        started,
        vec![&Event::CaptureStarted {
            tower: TowerId::new(1),
            attacker: A,
        }]
    );

    let start = position_of(&events, |event| matches!(event, Event::CaptureStarted { .. }));
    let flip = position_of(&events, |event| {
        matches!(
            event,
            Event::TowerCaptured { tower, from, to } if tower.get() == 1 && *from == B && *to == A
        )
    });
    let settle = position_of(&events, |event| {
        matches!(event, Event::CaptureSettled { tower, owner } if tower.get() == 1 && *owner == A)
    });
    let victory = position_of(&events, |event| *event == Event::Victory { round: 1 });
    assert!(start < flip && flip < settle && settle < victory);
    assert!(start.is_some());

    assert_eq!(effects(&events, ArrivalEffect::Attacked), 3);
    assert_eq!(effects(&events, ArrivalEffect::Captured), 1);
    assert_eq!(effects(&events, ArrivalEffect::Ignored), 16);

    assert_eq!(owner(&world, 1), A);
    assert_eq!(units(&world, 1), 1.0);
    assert_eq!(query::outcome(&world), Some(RoundOutcome::Victory));
}

#[test]
fn capture_animation_drives_owner_flip_and_scale() {
    let mut world = loaded(siege(40.0, 3.0, true));
    let _ = dispatch(&mut world, 0, 1);
    let _ = ticks(&mut world, 8);

    let defender = |world: &World| {
        query::tower_view(world)
            .get(TowerId::new(1))
            .map(|tower| (tower.owner, tower.capture, tower.scale))
    };

    assert_eq!(defender(&world), Some((B, CaptureState::Collapsing, 1.0)));
    let _ = tick(&mut world);
    assert_eq!(defender(&world), Some((B, CaptureState::Collapsing, 0.5)));
    let _ = tick(&mut world);
    assert_eq!(defender(&world), Some((A, CaptureState::Rebuilding, 0.0)));
    let _ = tick(&mut world);
    assert_eq!(defender(&world), Some((A, CaptureState::Rebuilding, 0.5)));
    assert_eq!(query::outcome(&world), None);
    let _ = tick(&mut world);
    assert_eq!(defender(&world), Some((A, CaptureState::Stable, 1.0)));
}

#[test]
fn losing_the_human_master_is_a_defeat() {
    let mut world = loaded(siege(40.0, 3.0, false));
    let _ = dispatch(&mut world, 1, 0);

    let events = ticks(&mut world, 12);

    assert!(events.contains(&Event::Defeat { round: 1 }));
    assert!(!events.contains(&Event::Victory { round: 1 }));
    assert_eq!(query::outcome(&world), Some(RoundOutcome::Defeat));
}

#[test]
fn outcome_latches_until_the_next_level() {
    let mut world = loaded(siege(40.0, 3.0, true));
    let _ = dispatch(&mut world, 0, 1);
    let _ = ticks(&mut world, 12);
    assert_eq!(query::outcome(&world), Some(RoundOutcome::Victory));

    assert!(ticks(&mut world, 4).is_empty());
    assert_eq!(
        dispatch(&mut world, 0, 1),
        vec![Event::DispatchRejected {
            source: TowerId::new(0),
            target: TowerId::new(1),
            reason: DispatchRejection::RoundOver,
        }]
    );

    let events = run(&mut world, Command::LoadLevel { level: duel() });
    assert_eq!(events, vec![Event::LevelLoaded { round: 1, towers: 3 }]);
    assert_eq!(query::outcome(&world), None);
    assert_eq!(query::elapsed(&world), Duration::ZERO);
    assert_eq!(units(&world, 0), 30.0);
}

#[test]
fn victory_waits_for_every_rival_master() {
    let mut world = loaded(level(
        vec![
            TowerSpec::new(0.0, 200.0, A, 40.0, true),
            TowerSpec::new(0.0, 0.0, B, 3.0, true),
            TowerSpec::new(400.0, 0.0, C, 30.0, true),
        ],
        vec![(0, 1), (1, 2)],
    ));
    let _ = dispatch(&mut world, 0, 1);

    let events = ticks(&mut world, 12);

    assert_eq!(owner(&world, 1), A);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CaptureSettled { .. })));
    assert!(!events.contains(&Event::Victory { round: 1 }));
    assert_eq!(query::outcome(&world), None);
}

#[test]
fn pause_freezes_clock_and_spawn_queue() {
    let mut world = loaded(duel());
    let _ = dispatch(&mut world, 0, 2);
    let _ = run(
        &mut world,
        Command::SetPlayMode {
            mode: PlayMode::Paused,
        },
    );

    assert!(ticks(&mut world, 8).is_empty());
    assert_eq!(query::pending_spawns(&world), 15);
    assert_eq!(query::elapsed(&world), Duration::ZERO);
    assert_eq!(
        dispatch(&mut world, 0, 2),
        vec![Event::DispatchRejected {
            source: TowerId::new(0),
            target: TowerId::new(2),
            reason: DispatchRejection::Paused,
        }]
    );

    let _ = run(
        &mut world,
        Command::SetPlayMode {
            mode: PlayMode::Running,
        },
    );
    let _ = tick(&mut world);
    assert_eq!(query::pending_spawns(&world), 9);
    assert_eq!(query::elapsed(&world), Duration::from_millis(250));
}

#[test]
fn loading_a_level_resumes_a_paused_world() {
    let mut world = loaded(duel());
    let _ = run(
        &mut world,
        Command::SetPlayMode {
            mode: PlayMode::Paused,
        },
    );

    let events = run(&mut world, Command::LoadLevel { level: duel() });

    assert_eq!(
        events,
        vec![
            Event::LevelLoaded { round: 1, towers: 3 },
            Event::PlayModeChanged {
                mode: PlayMode::Running
            },
        ]
    );
    assert_eq!(query::play_mode(&world), PlayMode::Running);
}

#[test]
fn multi_hop_dispatch_transits_owned_towers() {
    let mut world = loaded(level(
        vec![
            TowerSpec::new(0.0, 0.0, A, 20.0, true),
            TowerSpec::new(200.0, 0.0, A, 5.0, false),
            TowerSpec::new(400.0, 0.0, N, 3.0, false),
        ],
        vec![(0, 1), (1, 2)],
    ));

    let events = dispatch(&mut world, 0, 2);
    assert!(matches!(
        events.as_slice(),
        [Event::TroopsDispatched { count: 10, hops: 2, .. }]
    ));

    let _ = ticks(&mut world, 24);

    assert_eq!(units(&world, 1), 5.0);
    assert_eq!(owner(&world, 2), A);
    assert_eq!(units(&world, 2), 7.0);
}
