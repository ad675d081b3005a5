//! Camera Shake Controller
//!
//! A virtual mass on a spring-damper, kicked around by an impulse budget
//! whose direction wanders through coherent noise. The offset it produces is
//! applied to the view for the duration of a frame and removed again, so the
//! rest of the renderer never knows the camera moved.
//!
//! Integration contract: the explicit-Euler spring becomes unstable under
//! large frame deltas, so a single [`ShakeController::step`] must never be
//! given more than [`SHAKE_STEP_MAX`] seconds. [`ShakeController::advance`]
//! slices an arbitrary frame delta into full substeps plus a remainder and
//! is what frame code should call.

use macroquad::prelude::*;
use noise::{NoiseFn, Perlin};

use crate::rng::XorShift32;

/// Virtual shake mass.
pub const SHAKE_MASS: f32 = 1.0 / 400.0;
/// Spring constant pulling the camera back to centre.
pub const SHAKE_K: f32 = 1.0 / 50.0;
/// Maximum accumulated impulse budget.
pub const SHAKE_MAX: f32 = 1.0;
/// Budget drained per second while shaking.
pub const SHAKE_DECAY: f32 = 0.3;
/// Position/velocity magnitude below which the oscillator counts as at rest.
pub const SHAKE_SETTLE: f32 = 0.01;
/// Largest single integration step, seconds (1/10 s, i.e. 10 fps floor).
pub const SHAKE_STEP_MAX: f32 = 1.0 / 10.0;
/// Bound on the noise phase accumulator; past this it is reseeded on settle.
pub const SHAKE_ANG_RESEED: f64 = 1e3;

/// Damping constant for the virtual spring (critical damping times three).
fn shake_b() -> f32 {
    3.0 * (SHAKE_K * SHAKE_MASS).sqrt()
}

/// The process-wide shake state: one instance per effects context, not one
/// per effect.
pub struct ShakeController {
    pos: Vec2,
    vel: Vec2,
    /// Accumulated impulse budget, decays linearly to zero.
    force_mod: f32,
    /// Noise phase for the wandering force direction.
    force_ang: f64,
    /// True when the oscillator is at rest and no physics should run.
    off: bool,
    noise: Perlin,
    rng: XorShift32,
}

impl ShakeController {
    pub fn new(seed: u32) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            force_mod: 0.0,
            force_ang: 0.0,
            off: true,
            noise: Perlin::new(seed),
            rng: XorShift32::new(seed),
        }
    }

    /// Inject a one-shot impulse: adds to the budget (clamped to
    /// [`SHAKE_MAX`]) and wakes the oscillator, even when the budget was
    /// already saturated.
    pub fn impulse(&mut self, mag: f32) {
        self.force_mod = (self.force_mod + mag).min(SHAKE_MAX);
        self.off = false;
    }

    /// Advance a full frame delta, slicing it into substeps no larger than
    /// [`SHAKE_STEP_MAX`].
    pub fn advance(&mut self, dt: f32) {
        let mut ddt = dt;
        while ddt > SHAKE_STEP_MAX {
            self.step(SHAKE_STEP_MAX);
            ddt -= SHAKE_STEP_MAX;
        }
        self.step(ddt);
    }

    /// One physics substep. `dt` must not exceed [`SHAKE_STEP_MAX`]; use
    /// [`ShakeController::advance`] for frame deltas.
    pub fn step(&mut self, dt: f32) {
        if self.off {
            return;
        }

        // Budget decays linearly while it lasts
        let mut forced = false;
        if self.force_mod > 0.0 {
            self.force_mod -= SHAKE_DECAY * dt;
            if self.force_mod < 0.0 {
                self.force_mod = 0.0;
            } else {
                forced = true;
            }
        }

        // Settled: budget spent and the mass is visually at rest
        if !forced && self.pos.length() < SHAKE_SETTLE && self.vel.length() < SHAKE_SETTLE {
            self.off = true;
            if self.force_ang > SHAKE_ANG_RESEED {
                self.force_ang = self.rng.next_f32() as f64;
            }
            return;
        }

        // Restoring spring-damper force
        let mut force = -SHAKE_K * self.pos - shake_b() * self.vel;

        // While the budget lasts, kick in a direction that wanders with the
        // noise phase instead of jumping isotropically each step
        if forced {
            self.force_ang += dt as f64;
            let angle = self.noise.get([self.force_ang, 0.0]) as f32 * 5.0 * std::f32::consts::PI;
            force += self.force_mod * Vec2::new(angle.cos(), angle.sin());
        }

        self.vel += force * (dt / SHAKE_MASS);
        self.pos += self.vel * dt;
    }

    /// Current view offset; zero while settled.
    pub fn offset(&self) -> Vec2 {
        if self.off {
            Vec2::ZERO
        } else {
            self.pos
        }
    }

    /// Remaining impulse budget.
    pub fn force(&self) -> f32 {
        self.force_mod
    }

    pub fn is_settled(&self) -> bool {
        self.off
    }

    /// Zero out position, velocity, and budget; the oscillator goes to rest
    /// immediately.
    pub fn clear(&mut self) {
        self.pos = Vec2::ZERO;
        self.vel = Vec2::ZERO;
        self.force_mod = 0.0;
        self.off = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_clamps_budget() {
        let mut shake = ShakeController::new(1);
        shake.impulse(0.7);
        shake.impulse(0.7);
        assert!((shake.force() - SHAKE_MAX).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_wakes_when_saturated() {
        let mut shake = ShakeController::new(1);
        shake.force_mod = SHAKE_MAX;
        shake.off = true;
        shake.impulse(0.1);
        assert!(!shake.is_settled());
        assert!((shake.force() - SHAKE_MAX).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_produces_offset() {
        let mut shake = ShakeController::new(1);
        shake.impulse(0.05);
        shake.step(SHAKE_STEP_MAX);
        assert!(shake.offset().length() > 0.0);
    }

    #[test]
    fn test_settles_once_and_stays_settled() {
        let mut shake = ShakeController::new(1);
        shake.impulse(0.05);
        for _ in 0..5000 {
            shake.step(SHAKE_STEP_MAX);
        }
        assert!(shake.is_settled());
        assert_eq!(shake.offset(), Vec2::ZERO);

        // Further substeps are no-ops until the next impulse
        for _ in 0..10 {
            shake.step(SHAKE_STEP_MAX);
            assert!(shake.is_settled());
            assert_eq!(shake.offset(), Vec2::ZERO);
        }
    }

    #[test]
    fn test_advance_matches_manual_substeps() {
        let mut a = ShakeController::new(7);
        let mut b = ShakeController::new(7);
        a.impulse(0.5);
        b.impulse(0.5);

        a.advance(0.35);
        b.step(0.1);
        b.step(0.1);
        b.step(0.1);
        b.step(0.05);

        assert!((a.pos - b.pos).length() < 1e-4);
        assert!((a.vel - b.vel).length() < 1e-4);
    }

    #[test]
    fn test_clear_resets_state() {
        let mut shake = ShakeController::new(3);
        shake.impulse(0.8);
        shake.advance(0.2);
        shake.clear();
        assert!(shake.is_settled());
        assert_eq!(shake.offset(), Vec2::ZERO);
        assert!(shake.force().abs() < 1e-6);
    }

    #[test]
    fn test_budget_decays_linearly() {
        let mut shake = ShakeController::new(1);
        shake.impulse(0.5);
        shake.step(0.1);
        assert!((shake.force() - (0.5 - SHAKE_DECAY * 0.1)).abs() < 1e-5);
    }
}
