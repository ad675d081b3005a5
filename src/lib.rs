//! SPFX: special effects core for a 2D space-combat engine
//!
//! The real-time effects subsystem: a data-driven effect catalog, two-layer
//! particle stacks, trail point buffers, a spring-damper camera shake driven
//! by coherent noise, and a haptic rumble mirror. Everything runs on the
//! simulation/render thread, once per frame:
//!
//! ```ignore
//! let mut fx = SpfxContext::load("assets/effects.ron", "assets/trails.ron")?;
//! fx.load_textures().await;
//!
//! loop {
//!     fx.begin(dt, real_dt);
//!     if exploded {
//!         fx.spawn(boom, pos, vel, SpfxLayer::Front);
//!         fx.shake_impulse(0.5);
//!     }
//!     if engine_trail.update(dt) {
//!         engine_trail.grow(exhaust_pos, colours.profile(plasma).unwrap().glow);
//!     }
//!     fx.update(dt);
//!     fx.render(SpfxLayer::Back, paused);
//!     // ...world rendering...
//!     fx.render(SpfxLayer::Front, paused);
//!     fx.end();
//! }
//! ```

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod catalog;
pub mod context;
pub mod haptic;
pub mod rng;
pub mod shake;
pub mod stack;
pub mod trail;
pub mod trail_colour;

// Re-export main types
pub use catalog::{EffectCatalog, EffectDef, GfxRef, LoadError, SpriteSheet};
pub use context::SpfxContext;
pub use haptic::HapticMirror;
pub use shake::ShakeController;
pub use stack::{ActiveEffect, EffectStacks, SpfxLayer};
pub use trail::{Trail, TrailPoint};
pub use trail_colour::{TrailColourCatalog, TrailColourProfile};
