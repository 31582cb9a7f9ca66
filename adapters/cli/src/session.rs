//! Headless fixed-step driver that plays rounds with a bot on every side.

use std::{fmt, time::Duration};

use stronghold_core::{Command, Event, LevelDescriptor, RoundOutcome};
use stronghold_system_bot::{Bot, Config as BotConfig};
use stronghold_system_campaign::Campaign;
use stronghold_world::{self as world, query, World};
use tracing::{debug, info, trace};

/// Where the next level comes from once a round concludes.
#[derive(Debug)]
pub(crate) enum LevelSource {
    /// Built-in rounds with campaign progression.
    Campaign(Campaign),
    /// A single level replayed after every round.
    Fixed(LevelDescriptor),
}

impl LevelSource {
    fn opening(&self) -> Command {
        let level = match self {
            Self::Campaign(campaign) => campaign.current_level(),
            Self::Fixed(level) => level.clone(),
        };
        Command::LoadLevel { level }
    }

    fn follow_up(&mut self, events: &[Event], out: &mut Vec<Command>) {
        match self {
            Self::Campaign(campaign) => campaign.handle(events, out),
            Self::Fixed(level) => {
                let concluded = events
                    .iter()
                    .any(|event| matches!(event, Event::Victory { .. } | Event::Defeat { .. }));
                if concluded {
                    out.push(Command::LoadLevel {
                        level: level.clone(),
                    });
                }
            }
        }
    }
}

/// Summary of a single played round.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RoundReport {
    pub(crate) round: u32,
    pub(crate) outcome: Option<RoundOutcome>,
    pub(crate) elapsed: Duration,
    pub(crate) dispatches: usize,
    pub(crate) captures: usize,
    pub(crate) towers_held: usize,
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(RoundOutcome::Victory) => "victory",
            Some(RoundOutcome::Defeat) => "defeat",
            None => "undecided",
        };
        write!(
            f,
            "round {:>2}: {outcome:<9} after {:>7.2}s, {} dispatches, {} captures, {} towers held",
            self.round,
            self.elapsed.as_secs_f32(),
            self.dispatches,
            self.captures,
            self.towers_held,
        )
    }
}

/// World, bots and level source advanced together at a fixed step.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    bots: Vec<Bot>,
    bot_config: BotConfig,
    levels: LevelSource,
    step: Duration,
    time_limit: Duration,
    pending: Vec<Command>,
}

impl Session {
    /// Creates a session whose first round is loaded on the first call to
    /// [`Session::play_round`].
    pub(crate) fn new(
        world: World,
        bot_config: BotConfig,
        levels: LevelSource,
        tick_hz: u32,
        time_limit: Duration,
    ) -> Self {
        let opening = levels.opening();
        Self {
            world,
            bots: Vec::new(),
            bot_config,
            levels,
            step: Duration::from_secs(1) / tick_hz.max(1),
            time_limit,
            pending: vec![opening],
        }
    }

    /// Plays until the loaded round concludes or the time limit is reached.
    ///
    /// The command that loads the following round is queued before returning.
    pub(crate) fn play_round(&mut self) -> RoundReport {
        let mut dispatches = 0;
        let mut captures = 0;
        let mut concluded = Vec::new();

        let mut events = Vec::new();
        for command in std::mem::take(&mut self.pending) {
            world::apply(&mut self.world, command, &mut events);
        }
        self.observe(&events);

        while query::outcome(&self.world).is_none() && query::elapsed(&self.world) < self.time_limit
        {
            events.clear();
            world::apply(
                &mut self.world,
                Command::Tick { dt: self.step },
                &mut events,
            );

            let view = query::tower_view(&self.world);
            let mut commands = Vec::new();
            for bot in &mut self.bots {
                bot.handle(&events, &view, &mut commands);
            }
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }

            for event in &events {
                match event {
                    Event::TroopsDispatched { .. } => dispatches += 1,
                    Event::TowerCaptured { .. } => captures += 1,
                    Event::Victory { .. } | Event::Defeat { .. } => concluded.push(event.clone()),
                    _ => {}
                }
            }
            self.observe(&events);
        }

        let human = query::config(&self.world).human;
        let report = RoundReport {
            round: query::round(&self.world),
            outcome: query::outcome(&self.world),
            elapsed: query::elapsed(&self.world),
            dispatches,
            captures,
            towers_held: query::towers_owned_by(&self.world, human).len(),
        };
        info!(
            round = report.round,
            outcome = ?report.outcome,
            seconds = report.elapsed.as_secs_f32(),
            "round finished"
        );

        if concluded.is_empty() {
            let opening = self.levels.opening();
            self.pending.push(opening);
        } else {
            self.levels.follow_up(&concluded, &mut self.pending);
        }
        report
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::LevelLoaded { round, towers } => {
                    info!(round, towers, "round started");
                    self.spawn_bots();
                }
                Event::TimeAdvanced { .. } | Event::TroopSpawned { .. } => {
                    trace!(?event, "world event");
                }
                _ => debug!(?event, "world event"),
            }
        }
    }

    fn spawn_bots(&mut self) {
        let config = self.bot_config;
        self.bots = query::contenders(&self.world)
            .iter()
            .map(|faction| {
                let seeded = BotConfig {
                    rng_seed: config.rng_seed ^ u64::from(faction.get()),
                    ..config
                };
                Bot::new(seeded, *faction)
            })
            .collect();
    }
}
