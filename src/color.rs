//! HSL color helpers.
//!
//! Particle colors are configured and animated in HSL space and converted to
//! RGB before they reach the attribute buffers.

use glam::Vec3;

/// Convert an `(h, s, l)` triple to RGB, each channel 0-1.
///
/// * `h` - hue, wraps around (1.25 is the same hue as 0.25)
/// * `s` - saturation, clamped to 0-1
/// * `l` - lightness, clamped to 0-1
pub fn hsl_to_rgb(hsl: Vec3) -> Vec3 {
    let h = hsl.x.rem_euclid(1.0);
    let s = hsl.y.clamp(0.0, 1.0);
    let l = hsl.z.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let hi = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let lo = 2.0 * l - hi;

    Vec3::new(
        hue_to_channel(lo, hi, h + 1.0 / 3.0),
        hue_to_channel(lo, hi, h),
        hue_to_channel(lo, hi, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(lo: f32, hi: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        lo + (hi - lo) * 6.0 * t
    } else if t < 0.5 {
        hi
    } else if t < 2.0 / 3.0 {
        lo + (hi - lo) * 6.0 * (2.0 / 3.0 - t)
    } else {
        lo
    }
}
