//! # Sparkfield
//!
//! A CPU particle emitter that feeds a GPU point-sprite field.
//!
//! The engine spawns particles at a fixed rate into a bounded pool, moves them
//! with a semi-implicit Euler step, animates size, color and opacity over each
//! particle's age, and writes everything into flat per-slot arrays a renderer
//! can upload directly.
//!
//! ## Quick Start
//!
//! ```
//! use sparkfield::prelude::*;
//!
//! let config = EngineConfig {
//!     pps: 200.0,
//!     particle_death: 2.0,
//!     vel_base: Vec3::new(0.0, 1.0, 0.0),
//!     acc_base: Vec3::new(0.0, -0.5, 0.0),
//!     ..Default::default()
//! };
//!
//! let mut engine = ParticleEngine::new(config).unwrap();
//! engine.tick(1.0 / 60.0);
//! assert_eq!(engine.particle_count(), 400);
//! ```
//!
//! To open a window instead, hand a configuration to [`Viewer`]:
//!
//! ```ignore
//! Viewer::new(EngineConfig::fireball()).run()?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Emitter
//!
//! [`EngineConfig`] holds every tunable: how positions and velocities are
//! sampled ([`EmitterStyle::Cube`] or [`EmitterStyle::Sphere`]), base and
//! spread for each attribute, the emission rate `pps`, the particle lifetime
//! `particle_death` and the emitter lifetime `emitter_death`.
//!
//! ### Curves
//!
//! Size, color and opacity can follow a [`Tween`] over the particle's age.
//! Tweens are piecewise linear and clamp outside their keyframes. An empty
//! tween leaves the spawn-time value alone. Colors are keyframed in HSL and
//! converted with [`hsl_to_rgb`].
//!
//! ### Pool
//!
//! The pool has `ceil(pps * min(particle_death, emitter_death))` slots. A full
//! pool drops further spawns and counts them; it never grows.
//!
//! ## Features
//!
//! - `egui`: live tuning panel in the viewer window.

pub mod buffers;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
#[cfg(feature = "egui")]
pub mod panel;
pub mod particle;
pub mod spawn;
pub mod time;
pub mod tween;
pub mod viewer;

pub use buffers::AttributeBuffers;
pub use color::hsl_to_rgb;
pub use config::{BlendMode, EmitterStyle, EngineConfig, Keyframes, MAX_PARTICLES, PRESET_NAMES};
pub use engine::ParticleEngine;
pub use error::{ConfigError, RenderError, ViewerError};
pub use glam::{Vec2, Vec3, Vec4};
pub use particle::{Particle, ParticleCurves};
pub use spawn::Sampler;
pub use time::FrameClock;
pub use tween::{Lerp, Tween};
pub use viewer::Viewer;

/// Common imports for typical usage.
pub mod prelude {
    pub use crate::buffers::AttributeBuffers;
    pub use crate::color::hsl_to_rgb;
    pub use crate::config::{BlendMode, EmitterStyle, EngineConfig, Keyframes};
    pub use crate::engine::ParticleEngine;
    pub use crate::error::{ConfigError, ViewerError};
    pub use crate::time::FrameClock;
    pub use crate::tween::Tween;
    pub use crate::viewer::Viewer;
    pub use glam::{Vec2, Vec3, Vec4};
}
