//! Piecewise-linear keyframe curves.
//!
//! A [`Tween`] maps a particle's age to a value by interpolating between
//! `(time, value)` keyframes. Before the first keyframe the first value is
//! held, after the last keyframe the last value is held.
//!
//! # Example
//!
//! ```
//! use sparkfield::Tween;
//!
//! let fade = Tween::<f32>::new(vec![(0.0, 1.0), (2.0, 0.0)]).unwrap();
//! assert_eq!(fade.lookup(1.0), Some(0.5));
//! assert_eq!(fade.lookup(5.0), Some(0.0));
//! ```

use crate::error::ConfigError;
use glam::Vec3;

/// Values a [`Tween`] can interpolate.
pub trait Lerp: Copy {
    /// Interpolate from `self` towards `other` by fraction `t`.
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + t * (other - self)
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// Keyframe curve over time.
///
/// Times are finite and non-decreasing. Two neighbouring keyframes may share
/// a time, which makes the curve jump at that instant.
///
/// An empty tween means "not animated": [`Tween::lookup`] returns `None` and
/// the caller keeps its static base value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T> Default for Tween<T> {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Lerp> Tween<T> {
    /// An empty, non-animated tween.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a tween from `(time, value)` pairs.
    pub fn new(keyframes: Vec<(f32, T)>) -> Result<Self, ConfigError> {
        let (times, values) = keyframes.into_iter().unzip();
        Self::from_parts("tween", times, values)
    }

    /// Build a tween from parallel time and value arrays.
    ///
    /// `curve` names the curve in error messages.
    pub fn from_parts(
        curve: &'static str,
        times: Vec<f32>,
        values: Vec<T>,
    ) -> Result<Self, ConfigError> {
        if times.len() != values.len() {
            return Err(ConfigError::KeyframeLengthMismatch {
                curve,
                times: times.len(),
                values: values.len(),
            });
        }
        for (index, &time) in times.iter().enumerate() {
            let ordered = index == 0 || time >= times[index - 1];
            if !time.is_finite() || !ordered {
                return Err(ConfigError::KeyframeOrder { curve, index });
            }
        }
        Ok(Self { times, values })
    }

    /// Number of keyframes.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether this tween has no keyframes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over `(time, value)` keyframes.
    pub fn keyframes(&self) -> impl Iterator<Item = (f32, T)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Sample the curve at time `t`.
    ///
    /// Returns `None` for an empty tween.
    pub fn lookup(&self, t: f32) -> Option<T> {
        let n = self.times.len();
        if n == 0 {
            return None;
        }

        // Keyframe lists are a handful of entries, a linear scan is enough.
        let i = self
            .times
            .iter()
            .position(|&time| time > t)
            .unwrap_or(n);

        if i == 0 {
            return Some(self.values[0]);
        }
        if i == n {
            return Some(self.values[n - 1]);
        }

        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let span = t1 - t0;
        if span <= 0.0 {
            return Some(self.values[i - 1]);
        }
        let p = (t - t0) / span;
        Some(self.values[i - 1].lerp_to(self.values[i], p))
    }

    /// Sample the curve, falling back to `base` when it is empty.
    #[inline]
    pub fn sample_or(&self, t: f32, base: T) -> T {
        self.lookup(t).unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tween_has_no_value() {
        let tween: Tween<f32> = Tween::empty();
        assert!(tween.is_empty());
        assert_eq!(tween.lookup(0.5), None);
        assert_eq!(tween.sample_or(0.5, 3.0), 3.0);
    }

    #[test]
    fn test_scalar_interpolation() {
        let tween = Tween::<f32>::new(vec![(0.0, 0.0), (10.0, 10.0)]).unwrap();
        assert_eq!(tween.lookup(5.0), Some(5.0));
    }

    #[test]
    fn test_clamps_outside_keyframes() {
        let tween = Tween::<f32>::new(vec![(1.0, 2.0), (3.0, 6.0)]).unwrap();
        assert_eq!(tween.lookup(-4.0), Some(2.0));
        assert_eq!(tween.lookup(1.0), Some(2.0));
        assert_eq!(tween.lookup(3.0), Some(6.0));
        assert_eq!(tween.lookup(100.0), Some(6.0));
    }

    #[test]
    fn test_vector_interpolation() {
        let tween = Tween::new(vec![
            (0.0, Vec3::ZERO),
            (2.0, Vec3::new(2.0, 4.0, 6.0)),
        ])
        .unwrap();
        let v = tween.lookup(1.0).unwrap();
        assert!((v - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let tween = Tween::<f32>::new(vec![(0.5, 7.0)]).unwrap();
        assert_eq!(tween.lookup(0.0), Some(7.0));
        assert_eq!(tween.lookup(9.0), Some(7.0));
    }

    #[test]
    fn test_shared_time_jumps_without_dividing_by_zero() {
        let tween = Tween::<f32>::new(vec![(0.0, 0.0), (1.0, 5.0), (1.0, 10.0), (2.0, 20.0)]).unwrap();

        let before = tween.lookup(0.5).unwrap();
        assert!((before - 2.5).abs() < 1e-6);

        let at_jump = tween.lookup(1.0).unwrap();
        assert!(at_jump.is_finite());
        assert_eq!(at_jump, 10.0);

        let after = tween.lookup(1.5).unwrap();
        assert!((after - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let err = Tween::<f32>::from_parts("size_tween", vec![0.0, 1.0], vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::KeyframeLengthMismatch { times: 2, values: 1, .. }
        ));
    }

    #[test]
    fn test_rejects_decreasing_times() {
        let err = Tween::<f32>::new(vec![(1.0, 0.0), (0.5, 1.0)]).unwrap_err();
        assert!(matches!(err, ConfigError::KeyframeOrder { index: 1, .. }));

        let err = Tween::<f32>::new(vec![(f32::NAN, 0.0)]).unwrap_err();
        assert!(matches!(err, ConfigError::KeyframeOrder { index: 0, .. }));
    }

    #[test]
    fn test_keyframes_iterates_in_order() {
        let tween = Tween::<f32>::new(vec![(0.0, 1.0), (1.0, 2.0)]).unwrap();
        let frames: Vec<_> = tween.keyframes().collect();
        assert_eq!(frames, vec![(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(tween.len(), 2);
    }
}
