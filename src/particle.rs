//! A single simulated particle.
//!
//! Particles integrate their own motion and sample their attribute curves.
//! They never look at each other; recycling is decided by the engine.

use crate::color::hsl_to_rgb;
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::tween::Tween;
use glam::Vec3;
use std::sync::Arc;

/// Relative slack on the death check, so a lifetime made of many frame
/// deltas ends on the frame that sums to it.
const LIFETIME_TOLERANCE: f64 = 1e-6;

/// The attribute curves of one emitter configuration.
///
/// Built once per [`ParticleEngine::configure`](crate::ParticleEngine::configure)
/// and shared read-only with every particle spawned under it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleCurves {
    /// Size over age.
    pub size: Tween<f32>,
    /// Color over age, as (hue, saturation, lightness).
    pub color: Tween<Vec3>,
    /// Opacity over age.
    pub opacity: Tween<f32>,
}

impl ParticleCurves {
    /// Validate and build the three curves of `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let curves = Self {
            size: config.size_tween.to_tween("size_tween")?,
            color: config.col_tween.to_tween("col_tween")?,
            opacity: config.opacity_tween.to_tween("opacity_tween")?,
        };

        let finite = curves.size.keyframes().all(|(_, v)| v.is_finite())
            && curves.color.keyframes().all(|(_, v)| v.is_finite())
            && curves.opacity.keyframes().all(|(_, v)| v.is_finite());
        if !finite {
            return Err(ConfigError::NotFinite {
                field: "keyframe values",
            });
        }

        Ok(curves)
    }
}

/// One particle slot.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// RGB color, each channel 0-1.
    pub color: Vec3,
    pub opacity: f32,
    pub size: f32,
    /// Seconds since spawn, summed in f64 so long lives do not drift.
    age: f64,
    /// Age at which the particle dies.
    lifetime: f32,
    alive: bool,
    curves: Arc<ParticleCurves>,
}

impl Particle {
    /// A freshly born particle at rest, with default attributes.
    pub fn new(curves: Arc<ParticleCurves>, lifetime: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            color: Vec3::ONE,
            opacity: 1.0,
            size: 1.0,
            age: 0.0,
            lifetime,
            alive: true,
            curves,
        }
    }

    /// Whether the particle is still simulated and drawn.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Seconds since spawn.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age as f32
    }

    /// Lifetime in seconds.
    #[inline]
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Age as a fraction of lifetime, 0-1.
    pub fn normalized_age(&self) -> f32 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            (self.age() / self.lifetime).min(1.0)
        }
    }

    /// The curve set this particle samples.
    pub fn curves(&self) -> &Arc<ParticleCurves> {
        &self.curves
    }

    /// Step the particle forward by `dt` seconds.
    ///
    /// Uses semi-implicit Euler: position moves with the velocity from before
    /// this step's acceleration is applied. A `dt` that is not a positive
    /// finite number leaves the particle untouched.
    pub fn advance(&mut self, dt: f32) {
        if !self.alive || !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        self.position += self.velocity * dt;
        self.velocity += self.acceleration * dt;
        self.age += dt as f64;

        let age = self.age();
        let curves = &self.curves;
        if let Some(size) = curves.size.lookup(age) {
            self.size = size.max(0.0);
        }
        if let Some(hsl) = curves.color.lookup(age) {
            self.color = hsl_to_rgb(hsl);
        }
        if let Some(opacity) = curves.opacity.lookup(age) {
            self.opacity = opacity.clamp(0.0, 1.0);
        }

        if self.age >= self.lifetime as f64 * (1.0 - LIFETIME_TOLERANCE) {
            self.alive = false;
        }
    }
}
