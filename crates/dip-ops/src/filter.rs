//! Spatial filters: median, Gaussian blur, edge operators, sharpening.
//!
//! # Kernel size
//!
//! [`median`] and [`gaussian`] share one size policy:
//! - `size < 3` is a no-op, the input comes back unchanged
//! - even sizes drop to the next smaller odd size
//! - the kernel must be smaller than the image in both dimensions
//!
//! Both filters only emit pixels whose window lies fully inside the image,
//! so the output shrinks by `size` in each dimension.
//!
//! # Edge operators
//!
//! [`edge_response`] keeps the input size and clamps reads to the nearest
//! edge pixel. [`edge_detect`] clamps the response to `[0, 1]`;
//! [`sharpen`] adds a scaled response back onto the input.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::filter::{gaussian, median, Kernel};
//!
//! let img = PixelBuffer::filled(32, 32, [0.5, 0.5, 0.5]);
//! let k = Kernel::gaussian(5, 1.0).unwrap();
//! assert!((k.sum() - 1.0).abs() < 1e-6);
//!
//! let blurred = gaussian(&img, 5, 1.0).unwrap();
//! assert_eq!(blurred.dimensions(), (27, 27));
//! let denoised = median(&img, 3).unwrap();
//! assert_eq!(denoised.dimensions(), (29, 29));
//! ```

use crate::histogram::{quantize, LEVELS};
use crate::parallel::for_each_row;
use crate::tone::clamp_unit;
use crate::{OpsError, OpsResult};
use dip_core::{PixelBuffer, CHANNELS};
use std::f32::consts::PI;
use tracing::{debug, trace};

/// 1-D convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Kernel weights.
    pub data: Vec<f32>,
}

impl Kernel {
    /// Sampled Gaussian `exp(-(i - mid)^2 / (2 sigma^2)) / (sqrt(2 pi) sigma)`,
    /// normalized to unit sum.
    ///
    /// Even sizes are made odd by subtracting one; sizes below 1 become 1.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidParameter`] if `sigma` is not a positive
    /// finite number.
    pub fn gaussian(size: usize, sigma: f32) -> OpsResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "gaussian sigma must be positive, got {}",
                sigma
            )));
        }
        let size = odd_size(size).max(1);
        let mid = (size / 2) as f32;
        let norm = (2.0 * PI).sqrt() * sigma;
        let two_s2 = 2.0 * sigma * sigma;

        let mut data: Vec<f32> = (0..size)
            .map(|i| {
                let d = i as f32 - mid;
                (-d * d / two_s2).exp() / norm
            })
            .collect();
        let sum: f32 = data.iter().sum();
        for w in &mut data {
            *w /= sum;
        }
        Ok(Self { data })
    }

    /// Number of taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the kernel has no taps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

#[inline]
fn odd_size(size: usize) -> usize {
    if size % 2 == 0 { size.saturating_sub(1) } else { size }
}

/// Applies the size policy. `Ok(None)` means "return the input unchanged".
fn window_size(src: &PixelBuffer, size: usize) -> OpsResult<Option<usize>> {
    if size < 3 {
        return Ok(None);
    }
    let size = odd_size(size);
    if size >= src.width() as usize || size >= src.height() as usize {
        return Err(OpsError::InvalidParameter(format!(
            "kernel size {} too large for {}x{} image",
            size,
            src.width(),
            src.height()
        )));
    }
    Ok(Some(size))
}

// === Median ===

/// Median filter with a `size x size` window.
///
/// Each channel takes the `(size^2 - 1) / 2`-th smallest value of the
/// window at 8-bit precision. Output pixel `(x, y)` uses the window whose
/// top-left corner is `(x, y)`; the result is `(w - size) x (h - size)`.
///
/// Runs one sliding histogram per output row and channel: stepping right
/// removes the leaving column, adds the entering one, and nudges the
/// median pointer instead of re-sorting.
pub fn median(src: &PixelBuffer, size: usize) -> OpsResult<PixelBuffer> {
    let Some(size) = window_size(src, size)? else {
        return Ok(src.clone());
    };
    let (w, h) = (src.width() as usize, src.height() as usize);
    let (out_w, out_h) = (w - size, h - size);
    trace!(width = w, height = h, size, "median");

    let levels: Vec<u8> = src.data().iter().map(|&v| quantize(v) as u8).collect();
    let rank = (size * size - 1) / 2;
    let stride = w * CHANNELS;

    let mut dst = PixelBuffer::new(out_w as u32, out_h as u32);
    for_each_row(dst.data_mut(), out_w * CHANNELS, |y, row| {
        for c in 0..CHANNELS {
            let at = |x: usize, yy: usize| levels[yy * stride + x * CHANNELS + c] as usize;
            let mut window = SlidingMedian::new(rank);
            for yy in y..y + size {
                for x in 0..size {
                    window.add(at(x, yy));
                }
            }
            row[c] = window.settle() as f32 / 255.0;

            for x in 1..out_w {
                for yy in y..y + size {
                    window.remove(at(x - 1, yy));
                    window.add(at(x + size - 1, yy));
                }
                row[x * CHANNELS + c] = window.settle() as f32 / 255.0;
            }
        }
    });
    debug!(out_w, out_h, "median done");
    Ok(dst)
}

/// Histogram of the current window plus a pointer at its `rank`-th value.
///
/// Keeps `below` = number of samples strictly less than `median`.
struct SlidingMedian {
    hist: [u32; LEVELS],
    rank: u32,
    median: usize,
    below: u32,
}

impl SlidingMedian {
    fn new(rank: usize) -> Self {
        Self {
            hist: [0; LEVELS],
            rank: rank as u32,
            median: 0,
            below: 0,
        }
    }

    #[inline]
    fn add(&mut self, v: usize) {
        self.hist[v] += 1;
        if v < self.median {
            self.below += 1;
        }
    }

    #[inline]
    fn remove(&mut self, v: usize) {
        self.hist[v] -= 1;
        if v < self.median {
            self.below -= 1;
        }
    }

    /// Moves the pointer until `below <= rank < below + hist[median]`.
    fn settle(&mut self) -> usize {
        while self.below > self.rank {
            self.median -= 1;
            self.below -= self.hist[self.median];
        }
        while self.median < LEVELS - 1 && self.below + self.hist[self.median] <= self.rank {
            self.below += self.hist[self.median];
            self.median += 1;
        }
        self.median
    }
}

// === Gaussian ===

/// Separable Gaussian blur.
///
/// Vertical pass then horizontal pass, each emitting only positions whose
/// window fits, so the output is `(w - size) x (h - size)`.
///
/// # Errors
///
/// [`OpsError::InvalidParameter`] for a non-positive `sigma` or a kernel
/// that does not fit the image.
pub fn gaussian(src: &PixelBuffer, size: usize, sigma: f32) -> OpsResult<PixelBuffer> {
    let Some(size) = window_size(src, size)? else {
        return Ok(src.clone());
    };
    let kernel = Kernel::gaussian(size, sigma)?;
    let (w, h) = (src.width() as usize, src.height() as usize);
    trace!(width = w, height = h, size, sigma, "gaussian");

    let (out_w, out_h) = (w - size, h - size);
    let stride = w * CHANNELS;
    let data = src.data();

    // Vertical: w x out_h.
    let mut tmp = vec![0.0f32; stride * out_h];
    for_each_row(&mut tmp, stride, |y, row| {
        for (k, &wt) in kernel.data.iter().enumerate() {
            let src_row = &data[(y + k) * stride..(y + k + 1) * stride];
            for (d, &s) in row.iter_mut().zip(src_row) {
                *d += wt * s;
            }
        }
    });

    // Horizontal: out_w x out_h.
    let mut dst = PixelBuffer::new(out_w as u32, out_h as u32);
    let tmp = &tmp;
    for_each_row(dst.data_mut(), out_w * CHANNELS, |y, row| {
        let src_row = &tmp[y * stride..(y + 1) * stride];
        for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            for (k, &wt) in kernel.data.iter().enumerate() {
                let i = (x + k) * CHANNELS;
                for c in 0..CHANNELS {
                    px[c] += wt * src_row[i + c];
                }
            }
        }
    });
    Ok(dst)
}

// === Edge operators ===

/// Gradient operator used by [`edge_response`] and [`sharpen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EdgeOperator {
    /// 2x2 diagonal differences.
    Robert,
    /// 3x3 row/column differences.
    Prewitt,
    /// 3x3 row/column differences with center weight 2.
    Sobel,
    /// `8 * center - sum of the 8 neighbours`.
    Laplace,
}

impl EdgeOperator {
    /// All operators.
    pub const ALL: [EdgeOperator; 4] = [Self::Robert, Self::Prewitt, Self::Sobel, Self::Laplace];

    /// Weight of the response when sharpening.
    pub fn sharpen_gain(self) -> f32 {
        match self {
            Self::Robert | Self::Laplace => 0.2,
            Self::Prewitt | Self::Sobel => 0.1,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Robert => "robert",
            Self::Prewitt => "prewitt",
            Self::Sobel => "sobel",
            Self::Laplace => "laplace",
        }
    }
}

/// Raw edge response per channel, same size as the input.
///
/// Robert, Prewitt and Sobel are non-negative (`|gx| + |gy|`); Laplace is
/// signed. Values are not clamped.
pub fn edge_response(src: &PixelBuffer, op: EdgeOperator) -> PixelBuffer {
    let (w, h) = (src.width() as i64, src.height() as i64);
    trace!(width = w, height = h, op = op.name(), "edge_response");

    let mut dst = PixelBuffer::new(src.width(), src.height());
    if src.is_empty() {
        return dst;
    }
    let data = src.data();
    let stride = w as usize * CHANNELS;
    let at = |x: i64, y: i64, c: usize| -> f32 {
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        data[y * stride + x * CHANNELS + c]
    };

    for_each_row(dst.data_mut(), stride, |y, row| {
        let y = y as i64;
        for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let x = x as i64;
            for (c, out) in px.iter_mut().enumerate() {
                let p = |dx: i64, dy: i64| at(x + dx, y + dy, c);
                *out = match op {
                    EdgeOperator::Robert => {
                        (p(0, 0) - p(1, 1)).abs() + (p(1, 0) - p(0, 1)).abs()
                    }
                    EdgeOperator::Prewitt => {
                        let gx = (p(1, -1) + p(1, 0) + p(1, 1)) - (p(-1, -1) + p(-1, 0) + p(-1, 1));
                        let gy = (p(-1, 1) + p(0, 1) + p(1, 1)) - (p(-1, -1) + p(0, -1) + p(1, -1));
                        gx.abs() + gy.abs()
                    }
                    EdgeOperator::Sobel => {
                        let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1))
                            - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
                        let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1))
                            - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
                        gx.abs() + gy.abs()
                    }
                    EdgeOperator::Laplace => {
                        let mut sum = 0.0;
                        for dy in -1..=1 {
                            for dx in -1..=1 {
                                if dx != 0 || dy != 0 {
                                    sum += p(dx, dy);
                                }
                            }
                        }
                        8.0 * p(0, 0) - sum
                    }
                };
            }
        }
    });
    dst
}

/// Edge map: [`edge_response`] clamped to `[0, 1]`.
pub fn edge_detect(src: &PixelBuffer, op: EdgeOperator) -> PixelBuffer {
    let mut out = edge_response(src, op);
    for v in out.data_mut() {
        *v = clamp_unit(*v);
    }
    out
}

/// Sharpening: `clamp(in + gain * response)` with the operator's
/// [`EdgeOperator::sharpen_gain`].
pub fn sharpen(src: &PixelBuffer, op: EdgeOperator) -> PixelBuffer {
    let gain = op.sharpen_gain();
    trace!(width = src.width(), height = src.height(), op = op.name(), gain, "sharpen");
    let mut out = edge_response(src, op);
    for (r, &s) in out.data_mut().iter_mut().zip(src.data()) {
        *r = clamp_unit(s + gain * *r);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::generate;
    use approx::assert_abs_diff_eq;

    fn noise(w: u32, h: u32) -> PixelBuffer {
        generate(w, h, |x, y| {
            let v = ((x * 37 + y * 91 + x * y * 13) % 256) as f32 / 255.0;
            [v, 1.0 - v, ((x + y) % 7) as f32 / 6.0]
        })
    }

    fn brute_median(src: &PixelBuffer, size: usize, x: u32, y: u32, c: usize) -> f32 {
        let mut vals = Vec::new();
        for yy in y..y + size as u32 {
            for xx in x..x + size as u32 {
                vals.push(quantize(src.pixel(xx, yy)[c]));
            }
        }
        vals.sort_unstable();
        vals[(size * size - 1) / 2] as f32 / 255.0
    }

    #[test]
    fn test_kernel_gaussian_unit_sum() {
        for size in [1, 3, 5, 9, 15] {
            for sigma in [0.5, 1.0, 3.0] {
                let k = Kernel::gaussian(size, sigma).unwrap();
                assert_abs_diff_eq!(k.sum(), 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_kernel_gaussian_symmetric_peak() {
        let k = Kernel::gaussian(6, 1.0).unwrap();
        assert_eq!(k.len(), 5);
        assert_abs_diff_eq!(k.data[0], k.data[4]);
        assert!(k.data[2] > k.data[1]);
    }

    #[test]
    fn test_kernel_gaussian_bad_sigma() {
        assert!(Kernel::gaussian(3, 0.0).is_err());
        assert!(Kernel::gaussian(3, f32::NAN).is_err());
    }

    #[test]
    fn test_small_size_is_noop() {
        let img = noise(8, 8);
        assert_eq!(median(&img, 2).unwrap(), img);
        assert_eq!(gaussian(&img, 1, 1.0).unwrap(), img);
    }

    #[test]
    fn test_kernel_too_large() {
        let img = noise(5, 20);
        assert!(matches!(median(&img, 5), Err(OpsError::InvalidParameter(_))));
        assert!(gaussian(&img, 7, 1.0).is_err());
    }

    #[test]
    fn test_median_constant() {
        let img = PixelBuffer::filled(12, 10, [0.2, 0.6, 1.0]);
        let out = median(&img, 5).unwrap();
        assert_eq!(out.dimensions(), (7, 5));
        for (_, _, px) in out.pixels() {
            assert_eq!(quantize(px[0]), quantize(0.2));
            assert_eq!(quantize(px[1]), quantize(0.6));
            assert_eq!(px[2], 1.0);
        }
    }

    #[test]
    fn test_median_matches_sort() {
        let img = noise(19, 14);
        for size in [3, 5, 6] {
            let out = median(&img, size).unwrap();
            let size = odd_size(size);
            for (x, y, px) in out.pixels() {
                for c in 0..3 {
                    assert_eq!(px[c], brute_median(&img, size, x, y, c), "({}, {}) c{}", x, y, c);
                }
            }
        }
    }

    #[test]
    fn test_median_removes_impulse() {
        let mut img = PixelBuffer::filled(9, 9, [0.5; 3]);
        img.set_pixel(4, 4, [1.0; 3]);
        let out = median(&img, 3).unwrap();
        for (_, _, px) in out.pixels() {
            assert_eq!(quantize(px[0]), quantize(0.5));
        }
    }

    #[test]
    fn test_gaussian_constant_preserved() {
        let img = PixelBuffer::filled(20, 16, [0.25, 0.5, 0.75]);
        let out = gaussian(&img, 5, 1.0).unwrap();
        assert_eq!(out.dimensions(), (15, 11));
        for (_, _, px) in out.pixels() {
            assert_abs_diff_eq!(px[0], 0.25, epsilon = 1e-5);
            assert_abs_diff_eq!(px[2], 0.75, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_gaussian_smooths() {
        let img = noise(24, 24);
        let out = gaussian(&img, 5, 2.0).unwrap();
        let spread = |b: &PixelBuffer| {
            let d = b.data();
            let mean = d.iter().sum::<f32>() / d.len() as f32;
            d.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / d.len() as f32
        };
        assert!(spread(&out) < spread(&img));
    }

    #[test]
    fn test_edges_flat_is_zero() {
        let img = PixelBuffer::filled(6, 6, [0.4; 3]);
        for op in EdgeOperator::ALL {
            let out = edge_response(&img, op);
            assert_eq!(out.dimensions(), (6, 6));
            for &v in out.data() {
                assert_abs_diff_eq!(v, 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_sobel_vertical_step() {
        let img = generate(6, 4, |x, _| if x < 3 { [0.0; 3] } else { [1.0; 3] });
        let out = edge_response(&img, EdgeOperator::Sobel);
        assert_abs_diff_eq!(out.pixel(2, 1)[0], 4.0);
        assert_abs_diff_eq!(out.pixel(3, 1)[0], 4.0);
        assert_abs_diff_eq!(out.pixel(0, 1)[0], 0.0);
        let clamped = edge_detect(&img, EdgeOperator::Sobel);
        assert_eq!(clamped.pixel(2, 1)[0], 1.0);
    }

    #[test]
    fn test_robert_diagonal() {
        let mut img = PixelBuffer::new(3, 3);
        img.set_pixel(1, 1, [1.0; 3]);
        let out = edge_response(&img, EdgeOperator::Robert);
        // |p00 - p11| at (0, 0) sees the bright pixel on the diagonal.
        assert_abs_diff_eq!(out.pixel(0, 0)[0], 1.0);
    }

    #[test]
    fn test_laplace_signed() {
        let mut img = PixelBuffer::filled(5, 5, [0.5; 3]);
        img.set_pixel(2, 2, [0.0; 3]);
        let out = edge_response(&img, EdgeOperator::Laplace);
        assert_abs_diff_eq!(out.pixel(2, 2)[0], -4.0);
        assert_abs_diff_eq!(out.pixel(1, 1)[0], 0.5);
    }

    #[test]
    fn test_sharpen_gains_and_clamp() {
        assert_eq!(EdgeOperator::Robert.sharpen_gain(), 0.2);
        assert_eq!(EdgeOperator::Sobel.sharpen_gain(), 0.1);

        let mut img = PixelBuffer::filled(5, 5, [0.5; 3]);
        img.set_pixel(2, 2, [0.9; 3]);
        let out = sharpen(&img, EdgeOperator::Laplace);
        // 0.9 + 0.2 * 8 * 0.4 overshoots and clamps.
        assert_eq!(out.pixel(2, 2)[0], 1.0);
        // Neighbours get darker.
        assert!(out.pixel(1, 2)[0] < 0.5);
    }
}
