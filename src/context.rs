//! Effects Context
//!
//! Owns every piece of effects state for one game instance: the catalogs,
//! the live particle stacks, the shake controller, and the haptic mirror.
//! One explicit object instead of process-wide globals, handed to the frame
//! loop by whoever owns the scene.
//!
//! Frame protocol:
//! ```text
//! ctx.begin(dt, real_dt);            // shake physics + camera translate
//!     ...game logic: spawn / shake_impulse / trail grow+update...
//!     ctx.update(dt);                // advance particle stacks
//!     ctx.render(SpfxLayer::Back, paused);
//!     ...world rendering...
//!     ctx.render(SpfxLayer::Front, paused);
//! ctx.end();                         // camera restore
//! ```

use macroquad::prelude::*;

use crate::catalog::EffectCatalog;
#[cfg(not(target_arch = "wasm32"))]
use crate::catalog::LoadError;
use crate::haptic::HapticMirror;
use crate::shake::ShakeController;
use crate::stack::{EffectStacks, SpfxLayer};
use crate::trail_colour::TrailColourCatalog;

pub struct SpfxContext {
    catalog: EffectCatalog,
    trail_colours: TrailColourCatalog,
    stacks: EffectStacks,
    shake: ShakeController,
    haptic: HapticMirror,
    /// True while a shake-translated camera is pushed; `end` must pop it.
    shake_applied: bool,
}

impl SpfxContext {
    pub fn new(catalog: EffectCatalog, trail_colours: TrailColourCatalog) -> Self {
        Self::with_haptics(catalog, trail_colours, HapticMirror::new())
    }

    pub fn with_haptics(
        catalog: EffectCatalog,
        trail_colours: TrailColourCatalog,
        haptic: HapticMirror,
    ) -> Self {
        Self {
            catalog,
            trail_colours,
            stacks: EffectStacks::new(),
            shake: ShakeController::new(0xb0031),
            haptic,
            shake_applied: false,
        }
    }

    /// Load both catalogs from disk and build a context around them. A
    /// malformed or empty document aborts the whole load.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(effects_path: &str, trails_path: &str) -> Result<Self, LoadError> {
        let catalog = EffectCatalog::load(effects_path)?;
        let trail_colours = TrailColourCatalog::load(trails_path)?;
        Ok(Self::new(catalog, trail_colours))
    }

    /// Attach sprite sheets for the effect catalog. Call once after windowing
    /// is up; parse/load deliberately do not touch the GPU.
    pub async fn load_textures(&mut self) {
        self.catalog.load_textures().await;
    }

    /// Start the effects frame: run the haptic cooldown on real time, step
    /// the shake physics on simulation time, and push a camera translated by
    /// the resulting offset. Cheap no-op while the shake is settled.
    pub fn begin(&mut self, dt: f32, real_dt: f32) {
        self.shake_applied = false;
        if self.shake.is_settled() {
            return;
        }

        self.haptic.tick(real_dt);
        self.shake.advance(dt);

        let off = self.shake.offset();
        push_camera_state();
        set_camera(&Camera2D::from_display_rect(Rect::new(
            -off.x,
            -off.y,
            screen_width(),
            screen_height(),
        )));
        self.shake_applied = true;
    }

    /// End the effects frame, restoring the camera pushed by `begin`.
    /// Call before HUD rendering so the interface doesn't shake.
    pub fn end(&mut self) {
        if self.shake_applied {
            pop_camera_state();
            self.shake_applied = false;
        }
    }

    /// Spawn an effect instance on a layer.
    pub fn spawn(&mut self, effect: usize, pos: Vec2, vel: Vec2, layer: SpfxLayer) {
        self.stacks.spawn(&self.catalog, effect, pos, vel, layer);
    }

    /// Advance all live effects.
    pub fn update(&mut self, dt: f32) {
        self.stacks.update(dt);
    }

    /// Render one particle layer.
    pub fn render(&mut self, layer: SpfxLayer, paused: bool) {
        self.stacks.render(&self.catalog, layer, paused);
    }

    /// Jostle the camera and mirror the kick to the rumble motor.
    pub fn shake_impulse(&mut self, mag: f32) {
        let was_settled = self.shake.is_settled();
        self.shake.impulse(mag);
        self.haptic.rumble(self.shake.force(), mag, was_settled);
    }

    /// Current shake offset; zero while settled.
    pub fn shake_offset(&self) -> Vec2 {
        self.shake.offset()
    }

    /// Cinematic letterbox: black bars over the top and bottom fifth of the
    /// screen. Draw after the world, before the interface.
    pub fn cinematic(&self) {
        let (top, bottom) = letterbox_bars(screen_width(), screen_height());
        draw_rectangle(top.x, top.y, top.w, top.h, BLACK);
        draw_rectangle(bottom.x, bottom.y, bottom.w, bottom.h, BLACK);
    }

    /// Drop all live particles on both layers. Does not touch the shake.
    pub fn clear_particles(&mut self) {
        self.stacks.clear();
    }

    /// Put the shake oscillator to rest. Does not touch the particles.
    pub fn clear_shake(&mut self) {
        self.shake.clear();
    }

    /// Scene-transition reset: particles and shake both.
    pub fn clear(&mut self) {
        self.clear_particles();
        self.clear_shake();
    }

    /// Effect index by name.
    pub fn effect(&self, name: &str) -> Option<usize> {
        self.catalog.get(name)
    }

    /// Trail colour profile index by name.
    pub fn trail_colour(&self, name: &str) -> Option<usize> {
        self.trail_colours.get(name)
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn trail_colours(&self) -> &TrailColourCatalog {
        &self.trail_colours
    }

    pub fn stacks(&self) -> &EffectStacks {
        &self.stacks
    }

    pub fn shake(&self) -> &ShakeController {
        &self.shake
    }
}

/// Letterbox geometry: two full-width bars, each one fifth of a `w` x `h`
/// screen tall, hugging the top and bottom edges.
fn letterbox_bars(w: f32, h: f32) -> (Rect, Rect) {
    let bar = h * 0.2;
    (
        Rect::new(0.0, 0.0, w, bar),
        Rect::new(0.0, h - bar, w, bar),
    )
}
