//! Emitter configuration.
//!
//! [`EngineConfig`] is the complete set of tunables for one emitter. It is
//! always applied wholesale through
//! [`ParticleEngine::configure`](crate::ParticleEngine::configure); callers that
//! edit a single field (the tuning panel, a JSON patch) merge the edit into a
//! full copy first.
//!
//! Configurations serialize to JSON. Missing fields take their defaults, so a
//! file only needs the values it changes:
//!
//! ```
//! use sparkfield::{EmitterStyle, EngineConfig};
//!
//! let config = EngineConfig::from_json_str(r#"{ "pos_style": "Sphere", "pps": 250.0 }"#).unwrap();
//! assert_eq!(config.pos_style, EmitterStyle::Sphere);
//! assert_eq!(config.particle_count().unwrap(), 250);
//! ```

use crate::error::ConfigError;
use crate::particle::ParticleCurves;
use crate::tween::{Lerp, Tween};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound on pool capacity.
pub const MAX_PARTICLES: usize = 1_000_000;

/// Names accepted by [`EngineConfig::preset`].
pub const PRESET_NAMES: &[&str] = &["default", "fountain", "fireball", "smoke", "starfield"];

/// Emission geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmitterStyle {
    /// Independent per-axis sampling inside a box (`base ± spread / 2`).
    #[default]
    Cube,
    /// Spherical sampling: a point inside a ball for positions, a random
    /// direction scaled by a speed for velocities.
    Sphere,
}

impl EmitterStyle {
    pub fn name(&self) -> &'static str {
        match self {
            EmitterStyle::Cube => "Cube",
            EmitterStyle::Sphere => "Sphere",
        }
    }
}

/// How particle sprites combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Standard alpha blending (default).
    #[default]
    Normal,
    /// Colors add up. Overlapping particles glow.
    Additive,
    /// Colors multiply, darkening what is behind.
    Multiply,
}

impl BlendMode {
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Additive => "Additive",
            BlendMode::Multiply => "Multiply",
        }
    }
}

/// Serializable keyframe list, the on-disk form of a [`Tween`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframes<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

impl<T> Default for Keyframes<T> {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Lerp> Keyframes<T> {
    /// Keyframes from `(time, value)` pairs.
    pub fn from_pairs(pairs: &[(f32, T)]) -> Self {
        Self {
            times: pairs.iter().map(|(t, _)| *t).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }

    /// Validate and build the runtime curve.
    pub fn to_tween(&self, curve: &'static str) -> Result<Tween<T>, ConfigError> {
        Tween::from_parts(curve, self.times.clone(), self.values.clone())
    }
}

/// Complete emitter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Position sampling geometry.
    pub pos_style: EmitterStyle,
    pub pos_base: Vec3,
    /// Box extent for [`EmitterStyle::Cube`].
    pub pos_spread: Vec3,
    /// Ball radius for [`EmitterStyle::Sphere`].
    pub pos_radius: f32,

    /// Velocity sampling geometry.
    pub vel_style: EmitterStyle,
    pub vel_base: Vec3,
    pub vel_spread: Vec3,
    /// Speed along a random direction for [`EmitterStyle::Sphere`].
    pub speed_base: f32,
    pub speed_spread: f32,

    pub acc_base: Vec3,
    pub acc_spread: Vec3,

    pub size_base: f32,
    pub size_spread: f32,
    pub size_tween: Keyframes<f32>,

    /// Base color as (hue, saturation, lightness).
    pub col_base: Vec3,
    pub col_spread: Vec3,
    /// Color over age, values are (hue, saturation, lightness).
    pub col_tween: Keyframes<Vec3>,

    pub opacity_base: f32,
    pub opacity_spread: f32,
    pub opacity_tween: Keyframes<f32>,

    /// Particles emitted per second.
    pub pps: f32,
    /// Lifetime of each particle in seconds.
    pub particle_death: f32,
    /// Time after which the emitter stops spawning, in seconds.
    pub emitter_death: f32,

    pub blend: BlendMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pos_style: EmitterStyle::Cube,
            pos_base: Vec3::ZERO,
            pos_spread: Vec3::ZERO,
            pos_radius: 0.0,
            vel_style: EmitterStyle::Cube,
            vel_base: Vec3::ZERO,
            vel_spread: Vec3::ZERO,
            speed_base: 0.0,
            speed_spread: 0.0,
            acc_base: Vec3::ZERO,
            acc_spread: Vec3::ZERO,
            size_base: 0.05,
            size_spread: 0.0,
            size_tween: Keyframes::default(),
            col_base: Vec3::new(0.0, 1.0, 0.5),
            col_spread: Vec3::ZERO,
            col_tween: Keyframes::default(),
            opacity_base: 1.0,
            opacity_spread: 0.0,
            opacity_tween: Keyframes::default(),
            pps: 100.0,
            particle_death: 1.0,
            emitter_death: 60.0,
            blend: BlendMode::Normal,
        }
    }
}

impl EngineConfig {
    // =========================================================================
    // PRESETS
    // =========================================================================

    /// Look up a preset by name. See [`PRESET_NAMES`].
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::default()),
            "fountain" => Ok(Self::fountain()),
            "fireball" => Ok(Self::fireball()),
            "smoke" => Ok(Self::smoke()),
            "starfield" => Ok(Self::starfield()),
            _ => Err(ConfigError::UnknownPreset(name.to_string())),
        }
    }

    /// Fountain preset: particles arc up, fall back down and fade.
    pub fn fountain() -> Self {
        Self {
            pos_base: Vec3::new(0.0, -0.6, 0.0),
            pos_spread: Vec3::new(0.1, 0.0, 0.1),
            vel_base: Vec3::new(0.0, 2.2, 0.0),
            vel_spread: Vec3::new(0.8, 0.4, 0.8),
            acc_base: Vec3::new(0.0, -2.0, 0.0),
            size_base: 0.04,
            size_spread: 0.02,
            col_base: Vec3::new(0.58, 0.8, 0.6),
            col_spread: Vec3::new(0.05, 0.0, 0.1),
            opacity_tween: Keyframes::from_pairs(&[(0.0, 1.0), (2.0, 0.8), (3.0, 0.0)]),
            pps: 400.0,
            particle_death: 3.0,
            ..Default::default()
        }
    }

    /// Fireball preset: a glowing ball of embers that rise and cool.
    pub fn fireball() -> Self {
        Self {
            pos_style: EmitterStyle::Sphere,
            pos_radius: 0.15,
            vel_style: EmitterStyle::Sphere,
            speed_base: 0.4,
            speed_spread: 0.2,
            acc_base: Vec3::new(0.0, 0.3, 0.0),
            size_tween: Keyframes::from_pairs(&[(0.0, 0.08), (1.0, 0.02)]),
            col_tween: Keyframes::from_pairs(&[
                (0.0, Vec3::new(0.12, 1.0, 0.6)),
                (1.0, Vec3::new(0.0, 1.0, 0.4)),
            ]),
            opacity_tween: Keyframes::from_pairs(&[(0.0, 1.0), (0.7, 0.8), (1.0, 0.0)]),
            pps: 600.0,
            particle_death: 1.0,
            blend: BlendMode::Additive,
            ..Default::default()
        }
    }

    /// Smoke preset: slow-rising puffs that expand and fade.
    pub fn smoke() -> Self {
        Self {
            pos_base: Vec3::new(0.0, -0.5, 0.0),
            pos_spread: Vec3::new(0.3, 0.0, 0.3),
            vel_base: Vec3::new(0.0, 0.3, 0.0),
            vel_spread: Vec3::new(0.2, 0.1, 0.2),
            acc_base: Vec3::new(0.05, 0.0, 0.0),
            size_tween: Keyframes::from_pairs(&[(0.0, 0.05), (4.0, 0.25)]),
            col_base: Vec3::new(0.0, 0.0, 0.4),
            col_spread: Vec3::new(0.0, 0.0, 0.1),
            opacity_tween: Keyframes::from_pairs(&[(0.0, 0.0), (0.5, 0.5), (4.0, 0.0)]),
            pps: 120.0,
            particle_death: 4.0,
            ..Default::default()
        }
    }

    /// Starfield preset: a ball of randomly hued, slowly drifting stars.
    pub fn starfield() -> Self {
        Self {
            pos_style: EmitterStyle::Sphere,
            pos_radius: 2.0,
            vel_spread: Vec3::splat(0.02),
            size_base: 0.03,
            size_spread: 0.02,
            col_base: Vec3::new(0.5, 1.0, 0.5),
            col_spread: Vec3::new(1.0, 0.0, 0.0),
            opacity_base: 0.7,
            opacity_spread: 0.3,
            opacity_tween: Keyframes::from_pairs(&[(0.0, 0.0), (1.0, 0.7), (4.0, 0.7), (5.0, 0.0)]),
            pps: 2000.0,
            particle_death: 5.0,
            ..Default::default()
        }
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Pool capacity: `pps * min(particle_death, emitter_death)`, rounded up.
    pub fn particle_count(&self) -> Result<usize, ConfigError> {
        let life = self.particle_death.min(self.emitter_death) as f64;
        let exact = self.pps as f64 * life;
        // Absorb f32 representation error so 0.1 * 10 stays 1.
        let count = (exact - 1e-6).ceil().max(1.0);
        if count > MAX_PARTICLES as f64 {
            return Err(ConfigError::CapacityTooLarge {
                requested: exact,
                max: MAX_PARTICLES,
            });
        }
        Ok(count as usize)
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prepare().map(|_| ())
    }

    /// Validate, then hand back the built curves and the pool capacity.
    pub(crate) fn prepare(&self) -> Result<(ParticleCurves, usize), ConfigError> {
        let scalars = [
            ("pos_radius", self.pos_radius),
            ("speed_base", self.speed_base),
            ("speed_spread", self.speed_spread),
            ("size_base", self.size_base),
            ("size_spread", self.size_spread),
            ("opacity_base", self.opacity_base),
            ("opacity_spread", self.opacity_spread),
            ("pps", self.pps),
            ("particle_death", self.particle_death),
            ("emitter_death", self.emitter_death),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        let vectors = [
            ("pos_base", self.pos_base),
            ("pos_spread", self.pos_spread),
            ("vel_base", self.vel_base),
            ("vel_spread", self.vel_spread),
            ("acc_base", self.acc_base),
            ("acc_spread", self.acc_spread),
            ("col_base", self.col_base),
            ("col_spread", self.col_spread),
        ];
        for (field, value) in vectors {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        for (field, value) in [
            ("pps", self.pps),
            ("particle_death", self.particle_death),
            ("emitter_death", self.emitter_death),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        for (field, value) in [("pos_radius", self.pos_radius), ("size_base", self.size_base)] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.opacity_base) {
            return Err(ConfigError::OutOfRange {
                field: "opacity_base",
                value: self.opacity_base,
                min: 0.0,
                max: 1.0,
            });
        }

        let curves = ParticleCurves::from_config(self)?;
        let capacity = self.particle_count()?;
        Ok((curves, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count().unwrap(), 100);
    }

    #[test]
    fn test_capacity_uses_shorter_lifetime() {
        let config = EngineConfig {
            pps: 30.0,
            particle_death: 10.0,
            emitter_death: 5.0,
            ..Default::default()
        };
        assert_eq!(config.particle_count().unwrap(), 150);

        let config = EngineConfig {
            pps: 0.1,
            particle_death: 10.0,
            emitter_death: 60.0,
            ..Default::default()
        };
        assert_eq!(config.particle_count().unwrap(), 1);
    }

    #[test]
    fn test_rejects_non_positive_lifetimes_and_rates() {
        let config = EngineConfig {
            particle_death: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "particle_death", .. })
        ));

        let config = EngineConfig {
            pps: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "pps", .. })
        ));

        let config = EngineConfig {
            emitter_death: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let config = EngineConfig {
            vel_base: Vec3::new(0.0, f32::NAN, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "vel_base" })
        ));
    }

    #[test]
    fn test_rejects_bad_curves() {
        let config = EngineConfig {
            size_tween: Keyframes {
                times: vec![0.0, 1.0],
                values: vec![1.0],
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyframeLengthMismatch { curve: "size_tween", .. })
        ));

        let config = EngineConfig {
            opacity_tween: Keyframes::from_pairs(&[(1.0, 1.0), (0.0, 0.0)]),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyframeOrder { curve: "opacity_tween", .. })
        ));
    }

    #[test]
    fn test_rejects_huge_capacity() {
        let config = EngineConfig {
            pps: 1.0e6,
            particle_death: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_opacity_out_of_range() {
        let config = EngineConfig {
            opacity_base: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "opacity_base", .. })
        ));
    }

    #[test]
    fn test_prepare_builds_curves_and_capacity() {
        let config = EngineConfig::fireball();
        let (curves, capacity) = config.prepare().unwrap();
        assert_eq!(capacity, config.particle_count().unwrap());
        assert_eq!(curves, ParticleCurves::from_config(&config).unwrap());

        let bad = EngineConfig {
            particle_death: 0.0,
            ..config
        };
        assert!(bad.prepare().is_err());
    }

    #[test]
    fn test_presets_validate() {
        for name in PRESET_NAMES {
            let config = EngineConfig::preset(name).unwrap();
            assert!(config.validate().is_ok(), "preset {name} is invalid");
        }
        assert!(matches!(
            EngineConfig::preset("volcano"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::fireball();
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_json_missing_fields_use_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "particle_death": 2.0 }"#).unwrap();
        assert_eq!(config.particle_death, 2.0);
        assert_eq!(config.pps, EngineConfig::default().pps);
        assert_eq!(config.blend, BlendMode::Normal);
    }

    #[test]
    fn test_json_invalid_config_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "pps": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive { field: "pps", .. }));

        let err = EngineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
