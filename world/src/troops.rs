//! Troop motion along curved lanes and the staggered spawn queue.

use std::{collections::VecDeque, time::Duration};

use stronghold_core::{Body, Faction, LaneCurve, TowerId, TroopId, TroopSnapshot, Vec2};

/// Parameters shared by every troop's motion.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stride {
    pub(crate) speed: f32,
    pub(crate) bend: f32,
}

/// Active leg of a troop's route.
#[derive(Clone, Copy, Debug)]
struct Leg {
    curve: LaneCurve,
    progress: f32,
}

/// Troop travelling between towers.
#[derive(Clone, Debug)]
pub(crate) struct Troop {
    pub(crate) id: TroopId,
    pub(crate) owner: Faction,
    pub(crate) position: Vec2,
    radius: f32,
    origin: TowerId,
    route: Vec<TowerId>,
    route_index: usize,
    leg: Option<Leg>,
    arrived: bool,
}

impl Troop {
    /// Creates a troop standing at `position` next to `origin`.
    ///
    /// A troop without a route has nowhere to go and counts as arrived.
    pub(crate) fn new(
        id: TroopId,
        owner: Faction,
        position: Vec2,
        radius: f32,
        origin: TowerId,
        route: Vec<TowerId>,
    ) -> Self {
        let arrived = route.is_empty();
        Self {
            id,
            owner,
            position,
            radius,
            origin,
            route,
            route_index: 0,
            leg: None,
            arrived,
        }
    }

    /// Final tower of the route, if any.
    pub(crate) fn destination(&self) -> Option<TowerId> {
        self.route.last().copied()
    }

    pub(crate) fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Moves the troop along its current leg.
    ///
    /// `locate` resolves tower positions; a leg toward a tower that cannot be
    /// located ends the trip where the troop stands.
    pub(crate) fn advance<F>(&mut self, dt: f32, stride: Stride, locate: F)
    where
        F: Fn(TowerId) -> Option<Vec2>,
    {
        if self.arrived {
            return;
        }

        let Some(next) = self.route.get(self.route_index).copied() else {
            self.arrived = true;
            return;
        };

        let mut leg = match self.leg {
            Some(leg) => leg,
            None => {
                let Some(end) = locate(next) else {
                    self.arrived = true;
                    return;
                };
                let from = self.leg_origin();
                Leg {
                    curve: LaneCurve::for_leg(self.position, end, from, next, stride.bend),
                    progress: 0.0,
                }
            }
        };

        let chord = leg.curve.chord_length();
        if chord > f32::EPSILON {
            leg.progress += stride.speed * dt / chord;
        } else {
            leg.progress = 1.0;
        }

        if leg.progress < 1.0 {
            self.position = leg.curve.point_at(leg.progress);
            self.leg = Some(leg);
            return;
        }

        self.position = leg.curve.end();
        self.leg = None;
        self.route_index += 1;
        if self.route_index >= self.route.len() {
            self.arrived = true;
        }
    }

    fn leg_origin(&self) -> TowerId {
        match self.route_index.checked_sub(1) {
            Some(previous) => self.route[previous],
            None => self.origin,
        }
    }

    pub(crate) fn snapshot(&self) -> TroopSnapshot {
        TroopSnapshot {
            id: self.id,
            owner: self.owner,
            position: self.position,
            radius: self.radius,
            destination: self.destination().unwrap_or(self.origin),
        }
    }
}

impl Body for Troop {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Troop waiting for its stagger delay to elapse.
#[derive(Clone, Debug)]
pub(crate) struct PendingSpawn {
    pub(crate) due: Duration,
    pub(crate) owner: Faction,
    pub(crate) origin: TowerId,
    pub(crate) position: Vec2,
    pub(crate) route: Vec<TowerId>,
}

/// Spawns ordered by due time; ties keep dispatch order.
#[derive(Debug, Default)]
pub(crate) struct SpawnQueue {
    pending: VecDeque<PendingSpawn>,
}

impl SpawnQueue {
    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn schedule(&mut self, spawn: PendingSpawn) {
        let position = self
            .pending
            .iter()
            .position(|queued| queued.due > spawn.due)
            .unwrap_or(self.pending.len());
        self.pending.insert(position, spawn);
    }

    /// Removes every spawn due at or before `now`, in due order.
    pub(crate) fn release(&mut self, now: Duration) -> Vec<PendingSpawn> {
        let ready = self
            .pending
            .iter()
            .take_while(|queued| queued.due <= now)
            .count();
        self.pending.drain(..ready).collect()
    }
}
