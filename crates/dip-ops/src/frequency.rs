//! Frequency-domain filtering.
//!
//! Each channel goes through a 2-D FFT (rows then columns), gets multiplied
//! by a real mask, and comes back through the inverse transform scaled by
//! `1 / (w * h)`. The mask depends on the distance of a frequency sample
//! from the zero-frequency origin, measured on the wrapped index grid
//! (index `u` stands for frequency `u` when `u <= w/2`, `u - w` otherwise),
//! which is what a quadrant-shifted spectrum shows centered.
//!
//! # Filter families
//!
//! Low-pass responses for distance `d` and cutoff `D0`:
//!
//! | Family | `H(d)` |
//! |--------|--------|
//! | Ideal | `1` if `d <= D0`, else `0` |
//! | Butterworth(n) | `1 / (1 + (d / D0)^(2n))` |
//! | Gaussian | `exp(-d^2 / (2 D0^2))` |
//! | Trapezoid(D0, D1) | `1` below `D0`, `0` above `D1`, linear between |
//! | Exponential(n) | `exp(-(d / D0)^n)` |
//!
//! High-pass is `1 - H(d)`. [`FrequencyFilter::laplace`] uses
//! `-4 pi^2 (u^2 + v^2)` with `u, v` in cycles per pixel.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::frequency::{FilterKind, FrequencyFilter};
//!
//! let img = PixelBuffer::filled(16, 16, [0.5, 0.5, 0.5]);
//! let lp = FrequencyFilter::low_pass(FilterKind::Gaussian { cutoff: 4.0 }).unwrap();
//! let out = lp.apply(&img);
//! assert!((out.pixel(3, 3)[0] - 0.5).abs() < 1e-4);
//! ```

use crate::tone::clamp_unit;
use crate::{OpsError, OpsResult};
use dip_core::{PixelBuffer, CHANNELS};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use tracing::{debug, trace};

/// Shape of the frequency response.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum FilterKind {
    /// Hard cutoff at `cutoff`.
    Ideal {
        /// Cutoff distance.
        cutoff: f32,
    },
    /// Butterworth response of the given order.
    Butterworth {
        /// Cutoff distance.
        cutoff: f32,
        /// Filter order (>= 1).
        order: u32,
    },
    /// Gaussian response with standard deviation `cutoff`.
    Gaussian {
        /// Cutoff distance.
        cutoff: f32,
    },
    /// Linear roll-off between `inner` and `outer`.
    Trapezoid {
        /// Distance where the roll-off starts.
        inner: f32,
        /// Distance where the response reaches zero.
        outer: f32,
    },
    /// Exponential response of the given order.
    Exponential {
        /// Cutoff distance.
        cutoff: f32,
        /// Filter order (>= 1).
        order: u32,
    },
    /// Laplacian operator `-4 pi^2 (u^2 + v^2)`.
    Laplace,
}

impl FilterKind {
    fn validate(&self) -> OpsResult<()> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(OpsError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        };
        let order_ok = |order: u32| {
            if order == 0 {
                Err(OpsError::InvalidParameter("filter order must be >= 1".into()))
            } else {
                Ok(())
            }
        };
        match *self {
            Self::Ideal { cutoff } | Self::Gaussian { cutoff } => positive("cutoff", cutoff),
            Self::Butterworth { cutoff, order } | Self::Exponential { cutoff, order } => {
                positive("cutoff", cutoff)?;
                order_ok(order)
            }
            Self::Trapezoid { inner, outer } => {
                positive("inner cutoff", inner)?;
                if !outer.is_finite() || outer <= inner {
                    return Err(OpsError::InvalidParameter(format!(
                        "outer cutoff {} must exceed inner cutoff {}",
                        outer, inner
                    )));
                }
                Ok(())
            }
            Self::Laplace => Ok(()),
        }
    }

    /// Low-pass response at distance `d`.
    ///
    /// For [`FilterKind::Laplace`], `d` is the radius in cycles per pixel.
    pub fn low_pass_value(&self, d: f32) -> f32 {
        match *self {
            Self::Ideal { cutoff } => {
                if d <= cutoff { 1.0 } else { 0.0 }
            }
            Self::Butterworth { cutoff, order } => 1.0 / (1.0 + (d / cutoff).powi(2 * order as i32)),
            Self::Gaussian { cutoff } => (-d * d / (2.0 * cutoff * cutoff)).exp(),
            Self::Trapezoid { inner, outer } => {
                if d < inner {
                    1.0
                } else if d > outer {
                    0.0
                } else {
                    (d - outer) / (inner - outer)
                }
            }
            Self::Exponential { cutoff, order } => (-(d / cutoff).powi(order as i32)).exp(),
            Self::Laplace => -4.0 * PI * PI * d * d,
        }
    }
}

/// Which side of the cutoff passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Pass {
    /// Keep low frequencies.
    #[default]
    Low,
    /// Keep high frequencies (`1 - low-pass`).
    High,
}

/// A frequency-domain filter: a response family plus a pass side.
///
/// Deserialization goes through [`FrequencyFilter::new`], so invalid
/// cutoffs or orders are rejected there as well.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFilter", into = "RawFilter"))]
pub struct FrequencyFilter {
    kind: FilterKind,
    pass: Pass,
}

/// Unvalidated serialized form of [`FrequencyFilter`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawFilter {
    kind: FilterKind,
    #[serde(default)]
    pass: Pass,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFilter> for FrequencyFilter {
    type Error = OpsError;

    fn try_from(raw: RawFilter) -> OpsResult<Self> {
        Self::new(raw.kind, raw.pass)
    }
}

#[cfg(feature = "serde")]
impl From<FrequencyFilter> for RawFilter {
    fn from(f: FrequencyFilter) -> Self {
        Self {
            kind: f.kind,
            pass: f.pass,
        }
    }
}

impl FrequencyFilter {
    /// Creates a validated filter.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for non-positive cutoffs, an outer
    /// trapezoid cutoff not above the inner one, or order 0.
    pub fn new(kind: FilterKind, pass: Pass) -> OpsResult<Self> {
        kind.validate()?;
        Ok(Self { kind, pass })
    }

    /// Low-pass filter of the given family.
    pub fn low_pass(kind: FilterKind) -> OpsResult<Self> {
        Self::new(kind, Pass::Low)
    }

    /// High-pass filter of the given family.
    pub fn high_pass(kind: FilterKind) -> OpsResult<Self> {
        Self::new(kind, Pass::High)
    }

    /// Laplacian in the frequency domain.
    pub fn laplace() -> Self {
        Self {
            kind: FilterKind::Laplace,
            pass: Pass::Low,
        }
    }

    /// Response family.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Pass side. Ignored for the Laplacian.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Mask value at distance `d` from the origin.
    pub fn mask_value(&self, d: f32) -> f32 {
        let low = self.kind.low_pass_value(d);
        match (self.kind, self.pass) {
            (FilterKind::Laplace, _) | (_, Pass::Low) => low,
            (_, Pass::High) => 1.0 - low,
        }
    }

    /// Mask for a `width x height` spectrum, row-major.
    pub fn mask(&self, width: usize, height: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(width * height);
        for v in 0..height {
            let fv = wrapped(v, height);
            for u in 0..width {
                let fu = wrapped(u, width);
                let d = match self.kind {
                    FilterKind::Laplace => {
                        let (cu, cv) = (fu / width as f32, fv / height as f32);
                        (cu * cu + cv * cv).sqrt()
                    }
                    _ => (fu * fu + fv * fv).sqrt(),
                };
                out.push(self.mask_value(d));
            }
        }
        out
    }

    /// Filters every channel of `src`, clamping the result to `[0, 1]`.
    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        let (w, h) = (src.width() as usize, src.height() as usize);
        trace!(width = w, height = h, kind = ?self.kind, pass = ?self.pass, "frequency filter");
        if src.is_empty() {
            return src.clone();
        }

        let mask = self.mask(w, h);
        let mut planner = FftPlanner::<f32>::new();
        let row_fwd = planner.plan_fft_forward(w);
        let row_inv = planner.plan_fft_inverse(w);
        let col_fwd = planner.plan_fft_forward(h);
        let col_inv = planner.plan_fft_inverse(h);
        let scale = 1.0 / (w * h) as f32;

        let mut dst = PixelBuffer::new(src.width(), src.height());
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); w * h];
        let mut col_buf = vec![Complex::new(0.0f32, 0.0); h];

        for c in 0..CHANNELS {
            for (z, px) in spectrum.iter_mut().zip(src.data().chunks_exact(CHANNELS)) {
                *z = Complex::new(px[c], 0.0);
            }

            for row in spectrum.chunks_exact_mut(w) {
                row_fwd.process(row);
            }
            columns(&mut spectrum, w, h, &mut col_buf, |col| col_fwd.process(col));

            for (z, &m) in spectrum.iter_mut().zip(&mask) {
                *z *= m;
            }

            columns(&mut spectrum, w, h, &mut col_buf, |col| col_inv.process(col));
            for row in spectrum.chunks_exact_mut(w) {
                row_inv.process(row);
            }

            for (px, z) in dst.data_mut().chunks_exact_mut(CHANNELS).zip(&spectrum) {
                px[c] = clamp_unit(z.re * scale);
            }
        }
        debug!(width = w, height = h, "frequency filter done");
        dst
    }
}

/// Signed frequency for index `i` on an `n`-point grid.
#[inline]
fn wrapped(i: usize, n: usize) -> f32 {
    if i <= n / 2 {
        i as f32
    } else {
        i as f32 - n as f32
    }
}

/// Runs `f` on every column of a row-major `w x h` grid.
fn columns<F>(data: &mut [Complex<f32>], w: usize, h: usize, buf: &mut [Complex<f32>], mut f: F)
where
    F: FnMut(&mut [Complex<f32>]),
{
    for x in 0..w {
        for y in 0..h {
            buf[y] = data[y * w + x];
        }
        f(buf);
        for y in 0..h {
            data[y * w + x] = buf[y];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::generate;
    use approx::assert_abs_diff_eq;

    fn checker(w: u32, h: u32) -> PixelBuffer {
        generate(w, h, |x, y| {
            let v = if (x + y) % 2 == 0 { 0.8 } else { 0.2 };
            [v, v, v]
        })
    }

    #[test]
    fn test_low_pass_values() {
        let ideal = FilterKind::Ideal { cutoff: 5.0 };
        assert_eq!(ideal.low_pass_value(5.0), 1.0);
        assert_eq!(ideal.low_pass_value(5.1), 0.0);

        let bw = FilterKind::Butterworth { cutoff: 4.0, order: 2 };
        assert_abs_diff_eq!(bw.low_pass_value(4.0), 0.5);

        let g = FilterKind::Gaussian { cutoff: 3.0 };
        assert_abs_diff_eq!(g.low_pass_value(0.0), 1.0);

        let t = FilterKind::Trapezoid { inner: 2.0, outer: 6.0 };
        assert_abs_diff_eq!(t.low_pass_value(4.0), 0.5);
        assert_eq!(t.low_pass_value(7.0), 0.0);

        let e = FilterKind::Exponential { cutoff: 2.0, order: 1 };
        assert_abs_diff_eq!(e.low_pass_value(2.0), (-1.0f32).exp());
    }

    #[test]
    fn test_high_pass_complements() {
        let kind = FilterKind::Butterworth { cutoff: 3.0, order: 1 };
        let lp = FrequencyFilter::low_pass(kind).unwrap();
        let hp = FrequencyFilter::high_pass(kind).unwrap();
        for d in [0.0, 1.0, 3.0, 10.0] {
            assert_abs_diff_eq!(lp.mask_value(d) + hp.mask_value(d), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(FrequencyFilter::low_pass(FilterKind::Ideal { cutoff: 0.0 }).is_err());
        assert!(FrequencyFilter::low_pass(FilterKind::Butterworth { cutoff: 1.0, order: 0 }).is_err());
        assert!(FrequencyFilter::high_pass(FilterKind::Trapezoid { inner: 4.0, outer: 4.0 }).is_err());
    }

    #[test]
    fn test_wrapped_indices() {
        assert_eq!(wrapped(0, 8), 0.0);
        assert_eq!(wrapped(4, 8), 4.0);
        assert_eq!(wrapped(5, 8), -3.0);
        assert_eq!(wrapped(7, 8), -1.0);
    }

    #[test]
    fn test_low_pass_keeps_constant() {
        let img = PixelBuffer::filled(12, 10, [0.3, 0.6, 0.9]);
        let lp = FrequencyFilter::low_pass(FilterKind::Ideal { cutoff: 2.0 }).unwrap();
        let out = lp.apply(&img);
        for (a, b) in img.data().iter().zip(out.data()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_low_pass_flattens_checkerboard() {
        let img = checker(16, 16);
        let lp = FrequencyFilter::low_pass(FilterKind::Ideal { cutoff: 3.0 }).unwrap();
        let out = lp.apply(&img);
        for &v in out.data() {
            assert_abs_diff_eq!(v, 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_high_pass_removes_mean() {
        let img = PixelBuffer::filled(8, 8, [0.7; 3]);
        let hp = FrequencyFilter::high_pass(FilterKind::Gaussian { cutoff: 2.0 }).unwrap();
        let out = hp.apply(&img);
        for &v in out.data() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_laplace_flat_is_zero() {
        let img = PixelBuffer::filled(8, 6, [0.5; 3]);
        let out = FrequencyFilter::laplace().apply(&img);
        for &v in out.data() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-4);
        }
    }
}
