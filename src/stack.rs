//! Active Effect Stacks
//!
//! The live particle instances, split across two layers: `Front` effects draw
//! over the player (explosions on the hull), `Back` effects draw under
//! everything else. Each layer is an independent stack advanced once per
//! frame and rendered in reverse creation order.
//!
//! Removal uses swap-remove with the index re-checked after each removal, so
//! every surviving element is visited exactly once per update.

use macroquad::prelude::*;

use crate::catalog::EffectCatalog;
use crate::rng::XorShift32;

/// Which stack an effect lives on. The front layer is drawn after (over)
/// the back layer; there is no ordering guarantee beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpfxLayer {
    Front,
    Back,
}

/// A live effect instance.
#[derive(Debug, Clone)]
pub struct ActiveEffect {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Index into the effect catalog.
    pub effect: usize,
    /// Remaining lifetime, seconds. Removed once it goes negative.
    pub timer: f32,
    /// Frame shown on the last render. Held while the game is paused so the
    /// animation freezes in place.
    pub last_frame: u32,
}

/// Animation frame for a given remaining lifetime. The animation runs
/// backwards through the timer: a full cycle maps onto `[0, frames)`.
/// Clamped so a `timer % anim == 0` boundary cannot index past the grid.
pub(crate) fn anim_frame(timer: f32, anim: f32, frames: u32) -> u32 {
    if anim <= 0.0 || frames == 0 {
        return 0;
    }
    let t = 1.0 - (timer % anim) / anim;
    let frame = (frames as f32 * t.min(1.0)) as u32;
    frame.min(frames - 1)
}

/// Front/back stacks of live effects.
pub struct EffectStacks {
    front: Vec<ActiveEffect>,
    back: Vec<ActiveEffect>,
    rng: XorShift32,
}

impl EffectStacks {
    pub fn new() -> Self {
        Self::with_seed(12345)
    }

    /// Seedable constructor for deterministic spawn desync in tests.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            front: Vec::new(),
            back: Vec::new(),
            rng: XorShift32::new(seed),
        }
    }

    /// Spawn a new effect on a layer. An out-of-range effect index warns and
    /// does nothing.
    ///
    /// When the effect's lifetime is not tied 1:1 to one animation cycle
    /// (`ttl != anim`), a random slice of a cycle is added to the timer so
    /// simultaneously spawned instances don't animate in lockstep.
    pub fn spawn(
        &mut self,
        catalog: &EffectCatalog,
        effect: usize,
        pos: Vec2,
        vel: Vec2,
        layer: SpfxLayer,
    ) {
        let Some(def) = catalog.def(effect) else {
            eprintln!("Warning: spfx effect index {} out of range", effect);
            return;
        };

        let timer = if def.ttl != def.anim {
            def.ttl + self.rng.next_f32() * def.anim
        } else {
            def.ttl
        };

        let instance = ActiveEffect {
            pos,
            vel,
            effect,
            timer,
            last_frame: 0,
        };
        match layer {
            SpfxLayer::Front => self.front.push(instance),
            SpfxLayer::Back => self.back.push(instance),
        }
    }

    /// Advance both layers: age out expired effects, integrate the rest.
    pub fn update(&mut self, dt: f32) {
        update_layer(&mut self.front, dt);
        update_layer(&mut self.back, dt);
    }

    /// Render one layer. Frame indices are recomputed only while not paused;
    /// paused rendering re-blits each effect's last frame.
    pub fn render(&mut self, catalog: &EffectCatalog, layer: SpfxLayer, paused: bool) {
        let stack = match layer {
            SpfxLayer::Front => &mut self.front,
            SpfxLayer::Back => &mut self.back,
        };

        for fx in stack.iter_mut().rev() {
            let Some(def) = catalog.def(fx.effect) else { continue };
            let Some(sheet) = &def.sheet else { continue };

            if !paused {
                fx.last_frame = anim_frame(fx.timer, def.anim, sheet.frames());
            }

            let (fw, fh) = sheet.frame_size();
            let col = fx.last_frame % sheet.cols;
            let row = fx.last_frame / sheet.cols;
            draw_texture_ex(
                &sheet.texture,
                fx.pos.x,
                fx.pos.y,
                WHITE,
                DrawTextureParams {
                    source: Some(Rect::new(col as f32 * fw, row as f32 * fh, fw, fh)),
                    ..Default::default()
                },
            );
        }
    }

    /// Drop all live effects on both layers (scene transitions).
    pub fn clear(&mut self) {
        self.front.clear();
        self.back.clear();
    }

    pub fn layer(&self, layer: SpfxLayer) -> &[ActiveEffect] {
        match layer {
            SpfxLayer::Front => &self.front,
            SpfxLayer::Back => &self.back,
        }
    }

    pub fn len(&self) -> usize {
        self.front.len() + self.back.len()
    }

    pub fn is_empty(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }
}

impl Default for EffectStacks {
    fn default() -> Self {
        Self::new()
    }
}

fn update_layer(layer: &mut Vec<ActiveEffect>, dt: f32) {
    let mut i = 0;
    while i < layer.len() {
        layer[i].timer -= dt;

        // Expired: swap-remove and re-check the element that slid in
        if layer[i].timer < 0.0 {
            layer.swap_remove(i);
            continue;
        }

        let vel = layer[i].vel;
        layer[i].pos += vel * dt;
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> EffectCatalog {
        // boom: ttl == anim (no desync); flare: ttl != anim (desync)
        EffectCatalog::parse(
            r#"(effects: [
                (name: "boom", ttl: 0.0, anim: 500.0, gfx: (path: "boom.png")),
                (name: "flare", ttl: 1000.0, anim: 300.0, gfx: (path: "flare.png")),
                (name: "drift", ttl: 1000.0, anim: 1000.0, gfx: (path: "drift.png")),
            ])"#,
        )
        .unwrap()
    }

    #[test]
    fn test_anim_frame_stays_in_bounds() {
        let frames = 30; // 6x5 grid
        let anim = 0.5;
        let mut timer = 1.3;
        while timer >= 0.0 {
            let frame = anim_frame(timer, anim, frames);
            assert!(frame < frames, "frame {} out of bounds at timer {}", frame, timer);
            timer -= 0.013;
        }
        // Exact cycle boundary must clamp, not index one past the grid
        assert_eq!(anim_frame(0.5, 0.5, frames), frames - 1);
        assert_eq!(anim_frame(0.0, 0.5, frames), frames - 1);
    }

    #[test]
    fn test_spawn_invalid_index_is_noop() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        stacks.spawn(&cat, 99, Vec2::ZERO, Vec2::ZERO, SpfxLayer::Front);
        assert!(stacks.is_empty());
    }

    #[test]
    fn test_spawn_timer_no_desync_when_ttl_equals_anim() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        for _ in 0..8 {
            stacks.spawn(&cat, 0, Vec2::ZERO, Vec2::ZERO, SpfxLayer::Front);
        }
        for fx in stacks.layer(SpfxLayer::Front) {
            assert!((fx.timer - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_spawn_timer_desync_in_range() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::with_seed(99);
        for _ in 0..32 {
            stacks.spawn(&cat, 1, Vec2::ZERO, Vec2::ZERO, SpfxLayer::Back);
        }
        // ttl 1.0s, anim 0.3s -> timer in [1.0, 1.3]
        let mut saw_offset = false;
        for fx in stacks.layer(SpfxLayer::Back) {
            assert!(fx.timer >= 1.0 && fx.timer <= 1.3);
            if fx.timer > 1.0 {
                saw_offset = true;
            }
        }
        assert!(saw_offset, "desync never produced a nonzero offset");
    }

    #[test]
    fn test_update_removes_after_ttl_not_before() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        // boom: ttl = anim = 0.5s, no desync
        stacks.spawn(&cat, 0, Vec2::ZERO, vec2(10.0, 0.0), SpfxLayer::Front);

        stacks.update(0.3);
        assert_eq!(stacks.layer(SpfxLayer::Front).len(), 1);
        stacks.update(0.19);
        assert_eq!(stacks.layer(SpfxLayer::Front).len(), 1);
        // Cumulative 0.6 >= 0.5: gone
        stacks.update(0.11);
        assert!(stacks.layer(SpfxLayer::Front).is_empty());
    }

    #[test]
    fn test_update_integrates_position() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        // drift: ttl 1.0s, survives two 0.3s updates
        stacks.spawn(&cat, 2, Vec2::ZERO, vec2(10.0, 0.0), SpfxLayer::Front);
        stacks.update(0.3);
        stacks.update(0.3);
        let fx = &stacks.layer(SpfxLayer::Front)[0];
        assert!((fx.pos.x - 6.0).abs() < 1e-4);
        assert!(fx.pos.y.abs() < 1e-6);
    }

    #[test]
    fn test_update_visits_survivors_after_removal() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        // Interleave short-lived (boom 0.5s) and long-lived (drift 1.0s)
        for i in 0..6 {
            let effect = if i % 2 == 0 { 0 } else { 2 };
            stacks.spawn(&cat, effect, Vec2::ZERO, vec2(1.0, 0.0), SpfxLayer::Back);
        }
        // One update past the short ttl: all booms die, all drifts must
        // still have been integrated this frame despite the swap-removals
        stacks.update(0.6);
        let survivors = stacks.layer(SpfxLayer::Back);
        assert_eq!(survivors.len(), 3);
        for fx in survivors {
            assert_eq!(fx.effect, 2);
            assert!((fx.pos.x - 0.6).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clear_empties_both_layers() {
        let cat = test_catalog();
        let mut stacks = EffectStacks::new();
        stacks.spawn(&cat, 0, Vec2::ZERO, Vec2::ZERO, SpfxLayer::Front);
        stacks.spawn(&cat, 2, Vec2::ZERO, Vec2::ZERO, SpfxLayer::Back);
        stacks.clear();
        assert!(stacks.is_empty());
    }
}
