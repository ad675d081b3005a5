//! Trail Buffers
//!
//! Per-emitter point sequences for engine exhaust and similar ribbons.
//! Points are appended at the newest end and evicted from the oldest end once
//! they age past the retention horizon. The buffer itself never decides where
//! a new point goes — ship/engine state lives outside this subsystem — it
//! only signals when the caller should grow the trail.

use macroquad::prelude::*;

/// Maximum age a point may reach before the prefix holding it is evicted.
pub const TRAIL_HORIZON: f32 = 50.0;

/// Newest-point age past which [`Trail::update`] asks the caller to grow.
pub const TRAIL_GROW_AFTER: f32 = 2.0;

/// One control point of a trail.
#[derive(Debug, Clone, Copy)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub col: Color,
    /// Seconds since this point was added.
    pub age: f32,
}

/// An ordered-by-creation trail: oldest point at index 0, newest at the back.
/// Owned exclusively by its emitter; storage is released on drop.
#[derive(Debug, Default)]
pub struct Trail {
    points: Vec<TrailPoint>,
}

impl Trail {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append a new control point with age 0.
    pub fn grow(&mut self, pos: Vec2, col: Color) {
        self.points.push(TrailPoint { pos, col, age: 0.0 });
    }

    /// Age every point by `dt` and evict the stale prefix. Returns whether
    /// the caller should grow the trail: unconditionally for an empty trail
    /// (bootstraps the first point), otherwise when the newest point has
    /// aged past [`TRAIL_GROW_AFTER`].
    ///
    /// Eviction is prefix-only: the leading run of over-horizon points is
    /// dropped, stopping at the first point still within the horizon.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.points.is_empty() {
            return true;
        }

        for p in &mut self.points {
            p.age += dt;
        }

        let grow = self.points.last().map_or(true, |p| p.age > TRAIL_GROW_AFTER);

        let stale = self
            .points
            .iter()
            .take_while(|p| p.age > TRAIL_HORIZON)
            .count();
        if stale > 0 {
            self.points.drain(..stale);
        }

        grow
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
