//! Deterministic lane geometry shared by troop motion and renderers.
//!
//! Every lane is a quadratic curve whose control point sits a fixed distance
//! off the chord midpoint. The side it bends toward depends only on the two
//! tower identifiers, so the drawn lane and the path troops take across it
//! always agree.

use glam::Vec2;

use crate::TowerId;

/// Quadratic Bézier curve describing one lane or one troop leg.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneCurve {
    start: Vec2,
    control: Vec2,
    end: Vec2,
}

impl LaneCurve {
    /// Builds the curve a troop follows from `start` toward `end`.
    ///
    /// `from` and `to` identify the towers at either end of the lane and
    /// select the bend side. The perpendicular is always measured along the
    /// lane's canonical orientation (lower identifier to higher), so travel in
    /// either direction bends toward the same side.
    #[must_use]
    pub fn for_leg(start: Vec2, end: Vec2, from: TowerId, to: TowerId, bend: f32) -> Self {
        let (low, high) = if from <= to { (start, end) } else { (end, start) };
        let chord = high - low;
        let midpoint = (start + end) * 0.5;
        let length = chord.length();
        let control = if length > f32::EPSILON {
            let perpendicular = Vec2::new(-chord.y, chord.x) / length;
            midpoint + perpendicular * bend * bend_direction(from, to)
        } else {
            midpoint
        };

        Self {
            start,
            control,
            end,
        }
    }

    /// Start point of the curve.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Control point pulling the curve off its chord.
    #[must_use]
    pub const fn control(&self) -> Vec2 {
        self.control
    }

    /// End point of the curve.
    #[must_use]
    pub const fn end(&self) -> Vec2 {
        self.end
    }

    /// Straight-line distance between the endpoints.
    #[must_use]
    pub fn chord_length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Evaluates the curve at `t`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let inverse = 1.0 - t;
        self.start * (inverse * inverse) + self.control * (2.0 * inverse * t) + self.end * (t * t)
    }
}

/// Undirected edge between two towers together with its drawn curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane {
    /// Endpoint with the lower identifier.
    pub low: TowerId,
    /// Endpoint with the higher identifier.
    pub high: TowerId,
    /// Curve running from `low` to `high`.
    pub curve: LaneCurve,
}

/// Side toward which the lane between `a` and `b` bends: `1.0` or `-1.0`.
///
/// The sign is a pure function of the unordered pair. It hashes the key
/// `"{low}-{high}"` with the 32-bit wrapping `h * 31 + c` string hash and
/// bends positive when the magnitude of the hash is even.
#[must_use]
pub fn bend_direction(a: TowerId, b: TowerId) -> f32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let key = format!("{}-{}", low.get(), high.get());
    let hash = key.bytes().fold(0_i32, |hash, byte| {
        hash.wrapping_mul(31).wrapping_add(i32::from(byte))
    });

    if hash.unsigned_abs() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}
