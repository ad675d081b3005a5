//! Haptic Mirror
//!
//! Mirrors the shake controller's impulse budget onto a gamepad rumble
//! motor, so explosions the camera feels, the hands feel too.
//!
//! Native: programs a strong-magnitude force-feedback effect through
//! gilrs. WASM: no-op (macroquad's JS bundle exposes no vibration API).
//! Reprogramming is rate-limited to once per [`HAPTIC_UPDATE_INTERVAL`] of
//! real (unpaused) time, and skipped for impulses too small to feel.

use crate::shake::{SHAKE_DECAY, SHAKE_MAX};

/// Minimum real time between reprogramming the device effect.
pub const HAPTIC_UPDATE_INTERVAL: f32 = 0.1;

/// Gate for reprogramming the device: the cooldown must have elapsed, the
/// shake controller must have been active before this impulse, and the
/// impulse itself must be worth feeling (a third of the budget cap).
fn should_rumble(cooldown: f32, was_settled: bool, impulse: f32) -> bool {
    cooldown <= 0.0 && !was_settled && impulse >= SHAKE_MAX / 3.0
}

/// Effect duration: long enough for the budget to drain at its decay rate.
fn rumble_length_ms(budget: f32) -> u32 {
    (1000.0 * budget / SHAKE_DECAY) as u32
}

/// Effect magnitude: the budget's share of its cap, on the device's scale.
fn rumble_magnitude(budget: f32) -> u16 {
    (32767.0 * (budget / SHAKE_MAX).clamp(0.0, 1.0)) as u16
}

// ============================================================================
// Native Implementation (gilrs force feedback)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use super::*;
    use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Replay, Ticks};
    use gilrs::{GamepadId, Gilrs};

    pub struct HapticMirror {
        gilrs: Option<Gilrs>,
        /// Currently-programmed effect; replacing it stops the old playback.
        effect: Option<Effect>,
        cooldown: f32,
    }

    impl HapticMirror {
        pub fn new() -> Self {
            let gilrs = match Gilrs::new() {
                Ok(g) => Some(g),
                Err(e) => {
                    eprintln!("Warning: haptics disabled: {}", e);
                    None
                }
            };
            Self {
                gilrs,
                effect: None,
                cooldown: 0.0,
            }
        }

        /// A mirror with no device; every operation is a no-op.
        pub fn disabled() -> Self {
            Self {
                gilrs: None,
                effect: None,
                cooldown: 0.0,
            }
        }

        pub fn has_device(&self) -> bool {
            self.gilrs.is_some()
        }

        /// Whether a rumble effect is currently programmed on the device.
        pub fn is_rumbling(&self) -> bool {
            self.effect.is_some()
        }

        /// Run the reprogram cooldown on real delta time, so pausing the
        /// simulation does not freeze the rate limit.
        pub fn tick(&mut self, real_dt: f32) {
            if self.cooldown > 0.0 {
                self.cooldown -= real_dt;
            }
        }

        /// Reprogram the rumble from the shake controller's current budget.
        /// `impulse` is the magnitude just injected and `was_settled` the
        /// controller state before injection; both feed the skip gate.
        pub fn rumble(&mut self, budget: f32, impulse: f32, was_settled: bool) {
            let Some(gilrs) = self.gilrs.as_mut() else { return };
            if !should_rumble(self.cooldown, was_settled, impulse) {
                return;
            }

            let targets: Vec<GamepadId> = gilrs
                .gamepads()
                .filter(|(_, g)| g.is_ff_supported())
                .map(|(id, _)| id)
                .collect();
            if targets.is_empty() {
                return;
            }

            // Dropping the previous effect stops it before the replacement
            self.effect = None;

            let built = EffectBuilder::new()
                .add_effect(BaseEffect {
                    kind: BaseEffectType::Strong {
                        magnitude: rumble_magnitude(budget),
                    },
                    scheduling: Replay {
                        play_for: Ticks::from_ms(rumble_length_ms(budget)),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .gamepads(&targets)
                .finish(gilrs);

            match built {
                Ok(effect) => match effect.play() {
                    Ok(()) => {
                        self.effect = Some(effect);
                        self.cooldown += HAPTIC_UPDATE_INTERVAL;
                    }
                    Err(e) => eprintln!("Warning: failed to run rumble effect: {}", e),
                },
                Err(e) => eprintln!("Warning: failed to upload rumble effect: {}", e),
            }
        }
    }

    impl Default for HapticMirror {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ============================================================================
// WASM Implementation (no vibration API available)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod platform {
    pub struct HapticMirror;

    impl HapticMirror {
        pub fn new() -> Self {
            Self
        }

        pub fn disabled() -> Self {
            Self
        }

        pub fn has_device(&self) -> bool {
            false
        }

        pub fn is_rumbling(&self) -> bool {
            false
        }

        pub fn tick(&mut self, _real_dt: f32) {}

        pub fn rumble(&mut self, _budget: f32, _impulse: f32, _was_settled: bool) {}
    }

    impl Default for HapticMirror {
        fn default() -> Self {
            Self::new()
        }
    }
}

pub use platform::HapticMirror;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_rumble_gates() {
        let third = SHAKE_MAX / 3.0;
        // Happy path
        assert!(should_rumble(0.0, false, third + 0.1));
        // Cooldown pending
        assert!(!should_rumble(0.05, false, third + 0.1));
        // Controller was at rest before the impulse
        assert!(!should_rumble(0.0, true, third + 0.1));
        // Impulse too small to feel
        assert!(!should_rumble(0.0, false, third - 0.01));
    }

    #[test]
    fn test_rumble_scaling() {
        // Full budget: full magnitude, duration = budget / decay rate
        assert_eq!(rumble_magnitude(SHAKE_MAX), 32767);
        assert_eq!(rumble_length_ms(0.3), (1000.0 * 0.3 / SHAKE_DECAY) as u32);
        // Out-of-range budgets clamp instead of wrapping the device scale
        assert_eq!(rumble_magnitude(SHAKE_MAX * 2.0), 32767);
        assert_eq!(rumble_magnitude(-1.0), 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_disabled_mirror_is_noop() {
        let mut mirror = HapticMirror::disabled();
        assert!(!mirror.has_device());
        mirror.tick(0.5);
        mirror.rumble(1.0, 1.0, false);
        assert!(!mirror.is_rumbling());
    }
}
