//! Point-wise tonal adjustments.
//!
//! Every function maps each pixel independently, runs through the tile
//! fan-out driver, and returns a new buffer of the same size. Outputs are
//! clamped to `[0, 1]`; NaN results become 0, so degenerate parameters
//! saturate instead of producing garbage.
//!
//! | Operation | Formula |
//! |-----------|---------|
//! | [`lightness`] | blend toward white (`delta < 1`) or scale (`delta >= 1`) |
//! | [`saturation`] | push channels away from / toward the pixel lightness |
//! | [`hue`] | rotate the HSL hue |
//! | [`gamma`] | `c * v^gamma` |
//! | [`log`] | `a + ln(v + 1) / (b * ln c)` |
//! | [`power`] | `b^(c * (v - a)) - 1` |
//! | [`piecewise_linear`] | [`ToneCurve`] lookup |
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::tone::{gamma, ToneOp};
//!
//! let img = PixelBuffer::filled(8, 8, [0.25, 0.5, 1.0]);
//! let out = gamma(&img, 0.5, 1.0);
//! assert!((out.pixel(0, 0)[0] - 0.5).abs() < 1e-6);
//!
//! let op = ToneOp::Gamma { gamma: 0.5, c: 1.0 };
//! assert_eq!(op.apply(&img), out);
//! ```

use crate::color::{hsl_to_rgb, lightness_saturation, rgb_to_hsl, wrap_hue};
use crate::curve::ToneCurve;
use crate::parallel::map_pixels;
use dip_core::PixelBuffer;
use tracing::trace;

/// Clamps to `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[inline]
fn clamp_px(px: [f32; 3]) -> [f32; 3] {
    px.map(clamp_unit)
}

/// Lightness adjustment.
///
/// `delta` is the already-remapped factor (`exp(-raw / 100)` for a slider
/// value `raw`); `delta = 1` is the identity. Below 1 each pixel is blended
/// toward white by `alpha = L(1 - delta) / (L(1 - delta) + delta)`, above 1
/// it is divided by `L(1 - delta) + delta`.
pub fn lightness(src: &PixelBuffer, delta: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), delta, "lightness");
    map_pixels(src, |px| clamp_px(lightness_px(px, delta)))
}

#[inline]
fn lightness_px(px: [f32; 3], delta: f32) -> [f32; 3] {
    let (l, _) = lightness_saturation(px);
    let denom = l * (1.0 - delta) + delta;
    if delta < 1.0 {
        let alpha = l * (1.0 - delta) / denom;
        px.map(|v| (1.0 - alpha) * v + alpha)
    } else {
        px.map(|v| v / denom)
    }
}

/// Saturation adjustment with `delta` in `[-1, 1]`.
///
/// Positive values push channels away from the pixel lightness by
/// `1 / max(S, 1 - delta) - 1`; non-positive values pull them toward it by
/// `1 + delta`. `delta = -1` yields grey.
pub fn saturation(src: &PixelBuffer, delta: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), delta, "saturation");
    map_pixels(src, |px| clamp_px(saturation_px(px, delta)))
}

#[inline]
fn saturation_px(px: [f32; 3], delta: f32) -> [f32; 3] {
    let (l, s) = lightness_saturation(px);
    if s <= 0.0 {
        return px;
    }
    if delta > 0.0 {
        let alpha = 1.0 / s.max(1.0 - delta) - 1.0;
        px.map(|v| v + (v - l) * alpha)
    } else {
        px.map(|v| l + (v - l) * (1.0 + delta))
    }
}

/// Rotates the hue by `degrees`.
pub fn hue(src: &PixelBuffer, degrees: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), degrees, "hue");
    map_pixels(src, |px| {
        let [h, s, l] = rgb_to_hsl(px);
        clamp_px(hsl_to_rgb([wrap_hue(h + degrees), s, l]))
    })
}

/// Gamma curve `c * v^gamma`.
pub fn gamma(src: &PixelBuffer, gamma: f32, c: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), gamma, c, "gamma");
    map_pixels(src, |px| px.map(|v| clamp_unit(c * v.powf(gamma))))
}

/// Logarithmic curve `a + ln(v + 1) / (b * ln c)`.
pub fn log(src: &PixelBuffer, a: f32, b: f32, c: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), a, b, c, "log");
    let scale = b * c.ln();
    map_pixels(src, |px| px.map(|v| clamp_unit(a + (v + 1.0).ln() / scale)))
}

/// Exponential curve `b^(c * (v - a)) - 1`.
pub fn power(src: &PixelBuffer, a: f32, b: f32, c: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), a, b, c, "power");
    map_pixels(src, |px| px.map(|v| clamp_unit(b.powf(c * (v - a)) - 1.0)))
}

/// Maps every channel through a piecewise-linear [`ToneCurve`].
pub fn piecewise_linear(src: &PixelBuffer, curve: &ToneCurve) -> PixelBuffer {
    trace!(
        width = src.width(),
        height = src.height(),
        vertices = curve.points().len(),
        "piecewise_linear"
    );
    map_pixels(src, |px| px.map(|v| clamp_unit(curve.eval(v))))
}

/// One tonal operation together with its physical parameters.
///
/// Lets callers store, compare, and replay adjustments. With the `serde`
/// feature the enum serializes as `{"op": "gamma", "gamma": 0.5, "c": 1.0}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum ToneOp {
    /// See [`lightness`].
    Lightness {
        /// Remapped factor, 1.0 is identity.
        delta: f32,
    },
    /// See [`saturation`].
    Saturation {
        /// Amount in `[-1, 1]`.
        delta: f32,
    },
    /// See [`hue`].
    Hue {
        /// Rotation in degrees.
        degrees: f32,
    },
    /// See [`gamma`].
    Gamma {
        /// Exponent.
        gamma: f32,
        /// Multiplier.
        c: f32,
    },
    /// See [`log`].
    Log {
        /// Offset.
        a: f32,
        /// Scale.
        b: f32,
        /// Logarithm base.
        c: f32,
    },
    /// See [`power`].
    Power {
        /// Input offset.
        a: f32,
        /// Base.
        b: f32,
        /// Exponent scale.
        c: f32,
    },
    /// See [`piecewise_linear`].
    Curve {
        /// Curve vertices.
        curve: ToneCurve,
    },
}

impl ToneOp {
    /// Runs the operation on `src`.
    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        match self {
            Self::Lightness { delta } => lightness(src, *delta),
            Self::Saturation { delta } => saturation(src, *delta),
            Self::Hue { degrees } => hue(src, *degrees),
            Self::Gamma { gamma: g, c } => gamma(src, *g, *c),
            Self::Log { a, b, c } => log(src, *a, *b, *c),
            Self::Power { a, b, c } => power(src, *a, *b, *c),
            Self::Curve { curve } => piecewise_linear(src, curve),
        }
    }

    /// Short human-readable name, used for undo descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lightness { .. } => "lightness",
            Self::Saturation { .. } => "saturation",
            Self::Hue { .. } => "hue",
            Self::Gamma { .. } => "gamma",
            Self::Log { .. } => "log",
            Self::Power { .. } => "power",
            Self::Curve { .. } => "piecewise linear",
        }
    }
}
