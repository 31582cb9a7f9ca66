#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stronghold engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots such as [`TowerView`], and respond exclusively with new command
//! batches.

mod config;
mod lane;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::SimulationConfig;
pub use glam::Vec2;
pub use lane::{bend_direction, Lane, LaneCurve};

/// Describes whether the simulation clock is allowed to advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayMode {
    /// Towers, troops and bots advance with every tick.
    Running,
    /// Ticks are ignored and dispatch requests are rejected.
    Paused,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the level graph wholesale and resets all round state.
    LoadLevel {
        /// Descriptor supplied by the level-data collaborator.
        level: LevelDescriptor,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that half of a tower's garrison marches toward a target tower.
    Dispatch {
        /// Tower supplying the troops.
        source: TowerId,
        /// Final destination of every troop spawned by the dispatch.
        target: TowerId,
    },
    /// Requests that the world transition to the provided play mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: PlayMode,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new level graph replaced the previous one.
    LevelLoaded {
        /// Round number carried by the level descriptor.
        round: u32,
        /// Number of towers created for the level.
        towers: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Confirms that a dispatch committed units and queued troop spawns.
    TroopsDispatched {
        /// Tower that supplied the troops.
        source: TowerId,
        /// Final destination of the troops.
        target: TowerId,
        /// Faction the troops fight for.
        owner: Faction,
        /// Number of units deducted from the source and queued for spawning.
        count: u32,
        /// Number of route legs each troop travels.
        hops: usize,
    },
    /// Reports that a dispatch request was ignored without changing state.
    DispatchRejected {
        /// Tower named as the source of the request.
        source: TowerId,
        /// Tower named as the target of the request.
        target: TowerId,
        /// Specific reason the request was ignored.
        reason: DispatchRejection,
    },
    /// Confirms that a queued troop entered the field.
    TroopSpawned {
        /// Identifier assigned to the troop.
        troop: TroopId,
        /// Faction the troop fights for.
        owner: Faction,
    },
    /// Reports that a troop reached its final destination and was removed.
    TroopArrived {
        /// Identifier of the troop that arrived.
        troop: TroopId,
        /// Tower the troop arrived at.
        tower: TowerId,
        /// Effect the arrival had on the tower.
        effect: ArrivalEffect,
    },
    /// Announces that a master tower began collapsing under a hostile faction.
    CaptureStarted {
        /// Master tower that is collapsing.
        tower: TowerId,
        /// Faction that will own the tower once it has collapsed.
        attacker: Faction,
    },
    /// Confirms that a tower changed owner.
    TowerCaptured {
        /// Tower that changed owner.
        tower: TowerId,
        /// Previous owner.
        from: Faction,
        /// New owner.
        to: Faction,
    },
    /// Confirms that a master tower finished rebuilding after a capture.
    CaptureSettled {
        /// Master tower that returned to the stable state.
        tower: TowerId,
        /// Owner of the tower after rebuilding.
        owner: Faction,
    },
    /// Edge-triggered signal raised once when the human faction wins the round.
    Victory {
        /// Round that was won.
        round: u32,
    },
    /// Edge-triggered signal raised once when the human faction loses the round.
    Defeat {
        /// Round that was lost.
        round: u32,
    },
}

/// Outcome of a single troop arriving at its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrivalEffect {
    /// The troop joined a tower owned by its own faction.
    Reinforced,
    /// The troop removed one unit from a hostile or neutral tower.
    Attacked,
    /// The troop drove the garrison below zero and triggered a capture.
    Captured,
    /// The tower was mid-animation, so the troop was discarded.
    Ignored,
}

/// Reasons a dispatch request may be ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchRejection {
    /// The simulation is paused.
    Paused,
    /// A victory or defeat already concluded the round.
    RoundOver,
    /// One of the referenced towers does not exist in the level.
    UnknownTower,
    /// The source and target are the same tower.
    SameTower,
    /// No traversable route connects the source with the target.
    NoRoute,
    /// The source garrison is too small to send anyone.
    NoUnits,
}

/// Concluded state of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundOutcome {
    /// The human faction captured every rival master tower.
    Victory,
    /// The human faction lost its master tower.
    Defeat,
}

/// Allegiance of a tower or troop.
///
/// `Faction(0)` is neutral. Any other value is a contender; the first two are
/// provided as [`Faction::PLAYER_A`] and [`Faction::PLAYER_B`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Faction(u8);

impl Faction {
    /// Unaligned towers that never regenerate.
    pub const NEUTRAL: Self = Self(0);
    /// First contender, controlled by the local player by default.
    pub const PLAYER_A: Self = Self(1);
    /// Second contender, controlled by the bot by default.
    pub const PLAYER_B: Self = Self(2);

    /// Creates a faction from its numeric identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the faction.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the faction is the neutral one.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Faction {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Unique identifier assigned to a tower.
///
/// The identifier equals the tower's index in the level descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a troop when it spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TroopId(u32);

impl TroopId {
    /// Creates a new troop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Stage of a tower's capture animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// No animation; regeneration, decay and combat apply.
    Stable,
    /// Master tower shrinking toward zero before changing owner.
    Collapsing,
    /// Master tower growing back under its new owner.
    Rebuilding,
}

impl CaptureState {
    /// Reports whether an animation currently gates the tower.
    #[must_use]
    pub const fn is_animating(self) -> bool {
        !matches!(self, Self::Stable)
    }
}

/// Shared shape of everything placed on the battlefield.
pub trait Body {
    /// Centre of the body in world units.
    fn position(&self) -> Vec2;

    /// Radius of the body in world units.
    fn radius(&self) -> f32;
}

/// Initial state of a single tower inside a level descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    /// Horizontal position in world units.
    pub x: f32,
    /// Vertical position in world units.
    pub y: f32,
    /// Faction owning the tower when the round starts.
    pub owner: Faction,
    /// Garrison present when the round starts.
    pub units: f32,
    /// Whether losing this tower loses the round for its owner.
    #[serde(default, rename = "isMaster", alias = "is_master")]
    pub is_master: bool,
}

impl TowerSpec {
    /// Creates a tower specification.
    #[must_use]
    pub const fn new(x: f32, y: f32, owner: Faction, units: f32, is_master: bool) -> Self {
        Self {
            x,
            y,
            owner,
            units,
            is_master,
        }
    }

    /// Position of the tower as a vector.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Pure data description of a round supplied by the level-data collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Round number the level belongs to.
    pub round: u32,
    /// Towers in identifier order.
    pub towers: Vec<TowerSpec>,
    /// Undirected edges expressed as index pairs into `towers`.
    #[serde(default)]
    pub connections: Vec<(usize, usize)>,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Centre of the tower in world units.
    pub position: Vec2,
    /// Radius of the tower in world units.
    pub radius: f32,
    /// Faction currently owning the tower.
    pub owner: Faction,
    /// Continuous garrison size.
    pub units: f32,
    /// Regeneration cap of the garrison.
    pub capacity: f32,
    /// Stage of the capture animation.
    pub capture: CaptureState,
    /// Animation scale, `1.0` while stable.
    pub scale: f32,
    /// Whether the tower is a master tower.
    pub is_master: bool,
    /// Adjacent towers in lane order.
    pub neighbors: Vec<TowerId>,
}

impl TowerSnapshot {
    /// Garrison size as shown to players and used for combat decisions.
    #[must_use]
    pub fn garrison(&self) -> u32 {
        self.units.max(0.0).floor() as u32
    }
}

impl Body for TowerSnapshot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Read-only snapshot describing all towers of the level.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Retrieves the snapshot of the provided tower.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Iterator over the towers currently owned by `faction`, in id order.
    pub fn owned_by(&self, faction: Faction) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.owner == faction)
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a troop in transit.
#[derive(Clone, Debug, PartialEq)]
pub struct TroopSnapshot {
    /// Identifier assigned when the troop spawned.
    pub id: TroopId,
    /// Faction the troop fights for.
    pub owner: Faction,
    /// Current position in world units.
    pub position: Vec2,
    /// Radius of the troop in world units.
    pub radius: f32,
    /// Final tower of the troop's route.
    pub destination: TowerId,
}

impl Body for TroopSnapshot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Read-only snapshot describing every troop in transit.
#[derive(Clone, Debug, Default)]
pub struct TroopView {
    snapshots: Vec<TroopSnapshot>,
}

impl TroopView {
    /// Creates a new troop view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TroopSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured troop snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TroopSnapshot> {
        self.snapshots.iter()
    }

    /// Number of troops captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no troop is in transit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TroopSnapshot> {
        self.snapshots
    }
}
