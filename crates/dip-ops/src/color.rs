//! RGB <-> HSL conversion.
//!
//! All values are normalized: `r, g, b, s, l` in `[0, 1]`, hue in degrees
//! `[0, 360)`.
//!
//! ```rust
//! use dip_ops::color::{hsl_to_rgb, rgb_to_hsl};
//!
//! let hsl = rgb_to_hsl([1.0, 0.0, 0.0]);
//! assert_eq!(hsl, [0.0, 1.0, 0.5]);
//! let rgb = hsl_to_rgb([120.0, 1.0, 0.5]);
//! assert!((rgb[1] - 1.0).abs() < 1e-6);
//! ```

/// Saturation below which [`hsl_to_rgb`] treats a color as grey.
pub const GREY_SATURATION: f32 = 1e-3;

/// Converts RGB to `[hue, saturation, lightness]`.
///
/// Exact greys return `[0, 0, r]`.
pub fn rgb_to_hsl([r, g, b]: [f32; 3]) -> [f32; 3] {
    if r == g && r == b {
        return [0.0, 0.0, r];
    }

    let min = r.min(g).min(b);
    let (max, mut h) = if r >= g && r >= b {
        (r, 60.0 * (g - b) / (r - min))
    } else if g >= r && g >= b {
        (g, 60.0 * (b - r) / (g - min) + 120.0)
    } else {
        (b, 60.0 * (r - g) / (b - min) + 240.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    let l = (max + min) / 2.0;
    let s = if l < 0.5 {
        (max - min) / (max + min)
    } else {
        (max - min) / (2.0 - max - min)
    };
    [h, s, l]
}

/// Converts `[hue, saturation, lightness]` back to RGB.
pub fn hsl_to_rgb([h, s, l]: [f32; 3]) -> [f32; 3] {
    if s < GREY_SATURATION {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let t = h / 360.0;

    [t + 1.0 / 3.0, t, t - 1.0 / 3.0].map(|tc| hue_segment(p, q, wrap_unit(tc)))
}

#[inline]
fn wrap_unit(t: f32) -> f32 {
    if t < 0.0 {
        t + 1.0
    } else if t >= 1.0 {
        t - 1.0
    } else {
        t
    }
}

#[inline]
fn hue_segment(p: f32, q: f32, t: f32) -> f32 {
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Returns `(lightness, saturation)` of an RGB pixel.
///
/// Greys (including pure black and white) report zero saturation instead
/// of dividing by zero.
pub fn lightness_saturation([r, g, b]: [f32; 3]) -> (f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let chroma = max - min;
    if chroma <= 0.0 {
        return (l, 0.0);
    }
    let s = if max + min < 1.0 {
        chroma / (max + min)
    } else {
        chroma / (2.0 - max - min)
    };
    (l, s)
}

/// Wraps a hue angle into `[0, 360)`.
pub fn wrap_hue(h: f32) -> f32 {
    let w = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if w >= 360.0 { 0.0 } else { w }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    #[test]
    fn test_primaries() {
        assert_eq!(rgb_to_hsl([0.0, 1.0, 0.0]), [120.0, 1.0, 0.5]);
        assert_eq!(rgb_to_hsl([0.0, 0.0, 1.0]), [240.0, 1.0, 0.5]);
        let magenta = rgb_to_hsl([1.0, 0.0, 1.0]);
        assert_abs_diff_eq!(magenta[0], 300.0, epsilon = 1e-4);
    }

    #[test]
    fn test_grey_is_hueless() {
        assert_eq!(rgb_to_hsl([0.3, 0.3, 0.3]), [0.0, 0.0, 0.3]);
        assert_eq!(hsl_to_rgb([200.0, 0.0, 0.7]), [0.7, 0.7, 0.7]);
    }

    #[test]
    fn test_roundtrip_random() {
        let mut rng = rand::rng();
        for i in 0..2000 {
            let rgb = if i % 10 == 0 {
                let v: f32 = rng.random();
                [v, v, v]
            } else {
                [rng.random(), rng.random(), rng.random()]
            };
            let back = hsl_to_rgb(rgb_to_hsl(rgb));
            for c in 0..3 {
                assert_abs_diff_eq!(back[c], rgb[c], epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_lightness_saturation_extremes() {
        assert_eq!(lightness_saturation([0.0, 0.0, 0.0]), (0.0, 0.0));
        assert_eq!(lightness_saturation([1.0, 1.0, 1.0]), (1.0, 0.0));
        let (l, s) = lightness_saturation([1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(l, 0.5);
        assert_abs_diff_eq!(s, 1.0);
    }

    #[test]
    fn test_wrap_hue() {
        assert_abs_diff_eq!(wrap_hue(370.0), 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(wrap_hue(-30.0), 330.0, epsilon = 1e-4);
        assert_eq!(wrap_hue(360.0), 0.0);
    }
}
