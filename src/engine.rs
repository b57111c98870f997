//! The particle emitter and its pool.
//!
//! [`ParticleEngine`] owns one emitter configuration, a fixed-capacity pool
//! of [`Particle`] slots and the [`AttributeBuffers`] the renderer draws from.
//!
//! # Frame Loop
//!
//! ```
//! use sparkfield::{EngineConfig, ParticleEngine};
//!
//! let mut engine = ParticleEngine::with_seed(EngineConfig::fountain(), 42).unwrap();
//! for _ in 0..60 {
//!     engine.tick(1.0 / 60.0);
//!     let buffers = engine.buffers();
//!     // upload buffers.position(), buffers.color(), ... when dirty
//!     assert!(buffers.visible_count() <= engine.particle_count());
//! }
//! ```
//!
//! # Capacity
//!
//! The pool holds `pps * min(particle_death, emitter_death)` slots, enough
//! for a steady stream. Dead slots are reused before unused ones are touched.
//! When every slot is live, further spawns in that frame are dropped and
//! counted in [`ParticleEngine::dropped_spawns`]. This is backpressure, not an
//! error.

use crate::buffers::AttributeBuffers;
use crate::color::hsl_to_rgb;
use crate::config::{EmitterStyle, EngineConfig};
use crate::error::ConfigError;
use crate::particle::{Particle, ParticleCurves};
use crate::spawn::Sampler;
use std::sync::Arc;

/// Emitter plus particle pool.
#[derive(Debug)]
pub struct ParticleEngine {
    config: EngineConfig,
    curves: Arc<ParticleCurves>,
    /// Slots handed out so far; grows up to `capacity`, never shrinks.
    pool: Vec<Particle>,
    /// Indices of dead slots in `pool`, reused first.
    free: Vec<usize>,
    capacity: usize,
    buffers: AttributeBuffers,
    sampler: Sampler,
    emitter_age: f32,
    emitter_firing: bool,
    /// Fractional spawns carried between frames.
    spawn_debt: f64,
    live: usize,
    total_spawned: u64,
    dropped_spawns: u64,
}

impl ParticleEngine {
    /// Create an engine with an entropy-seeded random source.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::build(config, Sampler::from_entropy())
    }

    /// Create an engine whose emission is reproducible for a given seed.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, Sampler::seeded(seed))
    }

    fn build(config: EngineConfig, sampler: Sampler) -> Result<Self, ConfigError> {
        let mut engine = Self {
            config: EngineConfig::default(),
            curves: Arc::new(ParticleCurves::default()),
            pool: Vec::new(),
            free: Vec::new(),
            capacity: 0,
            buffers: AttributeBuffers::default(),
            sampler,
            emitter_age: 0.0,
            emitter_firing: true,
            spawn_debt: 0.0,
            live: 0,
            total_spawned: 0,
            dropped_spawns: 0,
        };
        engine.configure(config)?;
        Ok(engine)
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Replace the emitter configuration.
    ///
    /// The configuration is validated before anything changes; on error the
    /// engine keeps running with its previous state. On success the pool and
    /// buffers are reallocated to the new capacity, every particle is cleared
    /// and the emitter starts firing again from age zero.
    pub fn configure(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        let (curves, capacity) = config.prepare()?;

        log::info!(
            "emitter configured: {} slots, {} particles/s, lifetime {}s, emitter lifetime {}s",
            capacity,
            config.pps,
            config.particle_death,
            config.emitter_death
        );

        self.apply(config, Arc::new(curves), capacity);
        Ok(())
    }

    /// Clear the pool and re-arm the emitter with the current configuration.
    pub fn restart(&mut self) {
        let config = self.config.clone();
        let curves = Arc::clone(&self.curves);
        self.apply(config, curves, self.capacity);
    }

    fn apply(&mut self, config: EngineConfig, curves: Arc<ParticleCurves>, capacity: usize) {
        self.config = config;
        self.curves = curves;
        self.capacity = capacity;
        self.pool = Vec::with_capacity(capacity);
        self.free.clear();
        self.buffers = AttributeBuffers::new(capacity);
        self.emitter_age = 0.0;
        self.emitter_firing = true;
        self.spawn_debt = 0.0;
        self.live = 0;
    }

    // =========================================================================
    // EMISSION
    // =========================================================================

    /// Sample a new particle from the current configuration.
    ///
    /// The particle is not placed in the pool; see [`ParticleEngine::emit`].
    pub fn spawn(&mut self) -> Particle {
        let cfg = &self.config;
        let rng = &mut self.sampler;

        let mut particle = Particle::new(Arc::clone(&self.curves), cfg.particle_death);

        particle.position = match cfg.pos_style {
            EmitterStyle::Cube => rng.random_vec3(cfg.pos_base, cfg.pos_spread),
            EmitterStyle::Sphere => cfg.pos_base + rng.random_in_sphere(cfg.pos_radius),
        };

        particle.velocity = match cfg.vel_style {
            EmitterStyle::Cube => rng.random_vec3(cfg.vel_base, cfg.vel_spread),
            EmitterStyle::Sphere => {
                let speed = rng.random_value(cfg.speed_base, cfg.speed_spread);
                rng.random_direction() * speed
            }
        };

        particle.acceleration = rng.random_vec3(cfg.acc_base, cfg.acc_spread);
        particle.size = rng.random_value(cfg.size_base, cfg.size_spread).max(0.0);
        particle.opacity = rng
            .random_value(cfg.opacity_base, cfg.opacity_spread)
            .clamp(0.0, 1.0);
        particle.color = hsl_to_rgb(rng.random_vec3(cfg.col_base, cfg.col_spread));

        particle
    }

    /// Spawn one particle into the pool.
    ///
    /// Returns the slot it landed in, or `None` if every slot is live.
    pub fn emit(&mut self) -> Option<usize> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.pool.len() < self.capacity => self.pool.len(),
            None => {
                self.dropped_spawns += 1;
                return None;
            }
        };

        let particle = self.spawn();
        if index == self.pool.len() {
            self.pool.push(particle);
        } else {
            self.pool[index] = particle;
        }

        self.live += 1;
        self.total_spawned += 1;
        Some(index)
    }

    // =========================================================================
    // FRAME UPDATE
    // =========================================================================

    /// Advance the simulation by `dt` seconds and refresh the buffers.
    ///
    /// A negative or non-finite `dt` is treated as zero.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.emitter_age += dt;
        if self.emitter_firing && self.emitter_age >= self.config.emitter_death {
            self.emitter_firing = false;
            log::debug!(
                "emitter stopped after {:.2}s, {} particles spawned",
                self.emitter_age,
                self.total_spawned
            );
        }

        if self.emitter_firing {
            self.spawn_debt += self.config.pps as f64 * dt as f64;
            let due = self.spawn_debt.floor();
            self.spawn_debt -= due;

            // More than a full pool in one frame can only be a stalled clock.
            let due = due as u64;
            let attempts = due.min(self.capacity as u64);
            self.dropped_spawns += due - attempts;
            for i in 0..attempts {
                if self.emit().is_none() {
                    // emit counted this one; the rest of the frame is lost too.
                    self.dropped_spawns += attempts - i - 1;
                    break;
                }
            }
        }

        for (index, particle) in self.pool.iter_mut().enumerate() {
            if !particle.is_alive() {
                continue;
            }
            particle.advance(dt);
            if !particle.is_alive() {
                self.free.push(index);
                self.live -= 1;
            }
        }

        for (index, particle) in self.pool.iter().enumerate() {
            self.buffers.write_slot(index, particle);
        }
        self.buffers.mark_dirty();
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The attribute curves shared with live particles.
    pub fn curves(&self) -> &Arc<ParticleCurves> {
        &self.curves
    }

    /// Pool capacity in slots.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.capacity
    }

    /// Number of live particles.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Seconds since the emitter was last configured or restarted.
    #[inline]
    pub fn emitter_age(&self) -> f32 {
        self.emitter_age
    }

    /// Whether the emitter still spawns particles.
    #[inline]
    pub fn is_firing(&self) -> bool {
        self.emitter_firing
    }

    /// Particles spawned over the engine's whole life.
    #[inline]
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Spawns dropped because the pool was full.
    #[inline]
    pub fn dropped_spawns(&self) -> u64 {
        self.dropped_spawns
    }

    /// Attribute buffers as of the last tick.
    pub fn buffers(&self) -> &AttributeBuffers {
        &self.buffers
    }

    /// Mutable access for clearing the dirty flag after upload.
    pub fn buffers_mut(&mut self) -> &mut AttributeBuffers {
        &mut self.buffers
    }

    /// Iterate over live particles.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter().filter(|p| p.is_alive())
    }
}
