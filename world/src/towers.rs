//! Authoritative tower state and the per-tower unit-flow state machine.

use std::time::Duration;

use stronghold_core::{
    Body, CaptureState, Faction, SimulationConfig, TowerId, TowerSnapshot, TowerSpec, Vec2,
};

/// Shortfall tolerated when accumulated ticks approach a boundary.
///
/// Steps such as `Duration::from_secs(1) / 60` truncate to whole nanoseconds
/// and sum to slightly less than the interval they are meant to fill.
const TICK_SLACK: Duration = Duration::from_micros(1);

/// Rates that drive a tower's regeneration, decay and capture animation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FlowRates {
    pub(crate) capacity: f32,
    pub(crate) regen_interval: Duration,
    pub(crate) decay_rate: f32,
    pub(crate) animation_span: Duration,
}

impl FlowRates {
    pub(crate) fn from_config(config: &SimulationConfig) -> Self {
        Self {
            capacity: config.tower_capacity,
            regen_interval: span(config.regen_interval).max(TICK_SLACK * 2),
            decay_rate: config.overflow_decay_rate,
            animation_span: span(config.capture_animation_rate.recip()),
        }
    }
}

/// Converts seconds to a span; values that do not fit never elapse.
fn span(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::MAX)
}

fn reached(accumulated: Duration, boundary: Duration) -> bool {
    accumulated.saturating_add(TICK_SLACK) >= boundary
}

/// Transition reported by [`Tower::advance`] while a capture animation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaptureStep {
    /// The collapse reached zero and the pending owner took over.
    OwnerFlipped { from: Faction, to: Faction },
    /// Rebuilding finished and the tower is stable again.
    Settled { owner: Faction },
}

/// Result of a single hostile troop striking a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AssaultOutcome {
    /// The tower was animating and the strike had no effect.
    Ignored,
    /// One unit was removed and the garrison held.
    Held,
    /// A non-master tower changed owner on the spot.
    Captured { from: Faction },
    /// A master tower started collapsing toward the attacker.
    CollapseStarted,
}

/// Tower stored inside the world's arena.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) owner: Faction,
    pub(crate) units: f32,
    pub(crate) is_master: bool,
    pub(crate) neighbors: Vec<TowerId>,
    capture: CaptureState,
    pending_owner: Option<Faction>,
    scale: f32,
    phase: Duration,
    regen_timer: Duration,
}

impl Tower {
    pub(crate) fn from_spec(id: TowerId, spec: &TowerSpec, radius: f32) -> Self {
        Self {
            id,
            position: spec.position(),
            radius,
            owner: spec.owner,
            units: spec.units.max(0.0),
            is_master: spec.is_master,
            neighbors: Vec::new(),
            capture: CaptureState::Stable,
            pending_owner: None,
            scale: 1.0,
            phase: Duration::ZERO,
            regen_timer: Duration::ZERO,
        }
    }

    pub(crate) fn capture(&self) -> CaptureState {
        self.capture
    }

    pub(crate) fn connect(&mut self, neighbor: TowerId) {
        if neighbor != self.id && !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
    }

    pub(crate) fn is_neighbor(&self, other: TowerId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Advances the state machine by `dt`.
    ///
    /// While a capture animation runs nothing else happens to the garrison.
    pub(crate) fn advance(&mut self, dt: Duration, rates: &FlowRates) -> Option<CaptureStep> {
        match self.capture {
            CaptureState::Collapsing => {
                self.phase = self.phase.saturating_add(dt);
                if !reached(self.phase, rates.animation_span) {
                    self.scale = 1.0 - animation_progress(self.phase, rates);
                    return None;
                }
                self.phase = Duration::ZERO;
                self.scale = 0.0;
                let from = self.owner;
                let to = self.pending_owner.take().unwrap_or(from);
                self.owner = to;
                self.capture = CaptureState::Rebuilding;
                Some(CaptureStep::OwnerFlipped { from, to })
            }
            CaptureState::Rebuilding => {
                self.phase = self.phase.saturating_add(dt);
                if !reached(self.phase, rates.animation_span) {
                    self.scale = animation_progress(self.phase, rates);
                    return None;
                }
                self.phase = Duration::ZERO;
                self.scale = 1.0;
                self.capture = CaptureState::Stable;
                Some(CaptureStep::Settled { owner: self.owner })
            }
            CaptureState::Stable => {
                self.regenerate(dt, rates);
                self.decay(dt, rates);
                None
            }
        }
    }

    fn regenerate(&mut self, dt: Duration, rates: &FlowRates) {
        if self.owner.is_neutral() {
            return;
        }

        // One unit per whole interval; the remainder carries into the next.
        self.regen_timer = self.regen_timer.saturating_add(dt);
        while reached(self.regen_timer, rates.regen_interval) {
            self.regen_timer = self.regen_timer.saturating_sub(rates.regen_interval);
            if self.units < rates.capacity {
                self.units += 1.0;
            }
        }
    }

    fn decay(&mut self, dt: Duration, rates: &FlowRates) {
        if self.units > rates.capacity {
            let drained = rates.decay_rate * dt.as_secs_f32();
            self.units = (self.units - drained).max(rates.capacity);
        }
    }

    /// Adds one friendly unit unless an animation gates the tower.
    pub(crate) fn reinforce(&mut self) -> bool {
        if self.capture.is_animating() {
            return false;
        }
        self.units += 1.0;
        true
    }

    /// Removes one unit on behalf of `attacker`, capturing on overshoot.
    pub(crate) fn assault(&mut self, attacker: Faction) -> AssaultOutcome {
        if self.capture.is_animating() {
            return AssaultOutcome::Ignored;
        }

        self.units -= 1.0;
        if self.units >= 0.0 {
            return AssaultOutcome::Held;
        }

        self.units = self.units.abs();
        if self.is_master {
            self.capture = CaptureState::Collapsing;
            self.pending_owner = Some(attacker);
            AssaultOutcome::CollapseStarted
        } else {
            let from = self.owner;
            self.owner = attacker;
            AssaultOutcome::Captured { from }
        }
    }

    pub(crate) fn snapshot(&self, capacity: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            position: self.position,
            radius: self.radius,
            owner: self.owner,
            units: self.units,
            capacity,
            capture: self.capture,
            scale: self.scale,
            is_master: self.is_master,
            neighbors: self.neighbors.clone(),
        }
    }
}

fn animation_progress(phase: Duration, rates: &FlowRates) -> f32 {
    (phase.as_secs_f32() / rates.animation_span.as_secs_f32()).clamp(0.0, 1.0)
}

impl Body for Tower {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}
