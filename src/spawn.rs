//! Random sampling for particle emission.
//!
//! Every attribute of a freshly emitted particle is drawn as
//! `base + spread * (u - 0.5)` with `u` uniform in `[0, 1)`, or from one of
//! the spherical helpers below.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seeded random source used by the engine when spawning particles.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    /// Create a sampler with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Create a sampler seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// `base` plus a uniform offset in `[-spread/2, spread/2)`.
    #[inline]
    pub fn random_value(&mut self, base: f32, spread: f32) -> f32 {
        base + spread * (self.random() - 0.5)
    }

    /// Per-axis [`Sampler::random_value`].
    pub fn random_vec3(&mut self, base: Vec3, spread: Vec3) -> Vec3 {
        let jitter = Vec3::new(
            self.random() - 0.5,
            self.random() - 0.5,
            self.random() - 0.5,
        );
        base + spread * jitter
    }

    /// Random unit vector, uniformly distributed on the unit sphere.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        // Uniform in cos(phi) keeps the poles from bunching up.
        let z: f32 = self.rng.gen_range(-1.0..=1.0);
        let ring = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(ring * theta.cos(), ring * theta.sin(), z)
    }

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        // Cube root for uniform volume distribution
        let r = radius * self.random().cbrt();
        self.random_direction() * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_value_stays_in_spread() {
        let mut sampler = Sampler::seeded(7);
        for _ in 0..1000 {
            let v = sampler.random_value(10.0, 4.0);
            assert!((8.0..=12.0).contains(&v));
        }
    }

    #[test]
    fn test_zero_spread_is_exact() {
        let mut sampler = Sampler::seeded(7);
        let base = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(sampler.random_vec3(base, Vec3::ZERO), base);
        assert_eq!(sampler.random_value(0.25, 0.0), 0.25);
    }

    #[test]
    fn test_random_in_sphere_bounds() {
        let mut sampler = Sampler::seeded(1);
        for _ in 0..1000 {
            let pos = sampler.random_in_sphere(0.5);
            assert!(pos.length() <= 0.5 + 1e-5);
        }
    }

    #[test]
    fn test_random_direction_is_unit_and_unbiased() {
        let mut sampler = Sampler::seeded(3);
        let mut sum = Vec3::ZERO;
        let n = 20_000;
        for _ in 0..n {
            let dir = sampler.random_direction();
            assert!((dir.length() - 1.0).abs() < 1e-4);
            sum += dir;
        }
        let mean = sum / n as f32;
        assert!(mean.length() < 0.05, "mean direction {mean:?} is biased");
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = Sampler::seeded(99);
        let mut b = Sampler::seeded(99);
        for _ in 0..16 {
            assert_eq!(a.random(), b.random());
        }
    }
}
