//! 256-bucket histograms and cumulative distributions.
//!
//! Samples are bucketed with [`quantize`]: `round(v * 255)` clamped to
//! `[0, 255]`, NaN counted as 0.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::histogram::{histogram_channel, histogram_rgb};
//!
//! let img = PixelBuffer::filled(4, 4, [1.0, 0.5, 0.0]);
//! let red = histogram_channel(&img, 0).unwrap();
//! assert_eq!(red.count(255), 16);
//! assert_eq!(histogram_rgb(&img).total(), 48);
//! ```

use crate::{OpsError, OpsResult};
use dip_core::{PixelBuffer, CHANNELS};
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of intensity buckets.
pub const LEVELS: usize = 256;

/// Maps a normalized sample to its 8-bit bucket.
#[inline]
pub fn quantize(v: f32) -> usize {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as usize
}

/// Frequency table over 256 intensity levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; LEVELS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { counts: [0; LEVELS] }
    }
}

impl Histogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a histogram from raw counts.
    pub fn from_counts(counts: [u64; LEVELS]) -> Self {
        Self { counts }
    }

    /// Counts one sample.
    #[inline]
    pub fn add(&mut self, v: f32) {
        self.counts[quantize(v)] += 1;
    }

    /// Count for bucket `level`.
    #[inline]
    pub fn count(&self, level: usize) -> u64 {
        self.counts[level]
    }

    /// All bucket counts.
    #[inline]
    pub fn counts(&self) -> &[u64; LEVELS] {
        &self.counts
    }

    /// Number of sampled values.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Returns `true` if no value was sampled.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Largest bucket count.
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Counts scaled so the tallest bucket is 1.0 (for display).
    pub fn normalized(&self) -> [f32; LEVELS] {
        let max = self.max_count();
        if max == 0 {
            return [0.0; LEVELS];
        }
        self.counts.map(|c| c as f32 / max as f32)
    }

    /// Adds every bucket of `other` into this histogram.
    pub fn merge(&mut self, other: &Histogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    /// Cumulative distribution normalized by this histogram's own total.
    ///
    /// The prefix sum is kept in integers, so `cdf[255]` is exactly 1.0 for
    /// a non-empty histogram. An empty histogram yields all zeros.
    pub fn cdf(&self) -> [f32; LEVELS] {
        self.cdf_with_total(self.total())
    }

    /// Cumulative distribution normalized by an explicit `total`.
    pub fn cdf_with_total(&self, total: u64) -> [f32; LEVELS] {
        let mut out = [0.0f32; LEVELS];
        if total == 0 {
            return out;
        }
        let mut acc = 0u64;
        for (dst, &c) in out.iter_mut().zip(self.counts.iter()) {
            acc += c;
            *dst = (acc as f64 / total as f64) as f32;
        }
        out
    }
}

/// Builds one histogram by folding a per-row sampler over the image rows.
#[cfg(feature = "parallel")]
fn fold_rows<F>(buf: &PixelBuffer, sample_row: F) -> Histogram
where
    F: Fn(&mut Histogram, &[f32]) + Sync + Send,
{
    let row_len = buf.row_len();
    if row_len == 0 {
        return Histogram::new();
    }
    buf.data()
        .par_chunks(row_len)
        .fold(Histogram::new, |mut h, row| {
            sample_row(&mut h, row);
            h
        })
        .reduce(Histogram::new, |mut a, b| {
            a.merge(&b);
            a
        })
}

/// Builds one histogram by folding a per-row sampler (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
fn fold_rows<F>(buf: &PixelBuffer, sample_row: F) -> Histogram
where
    F: Fn(&mut Histogram, &[f32]) + Sync + Send,
{
    let row_len = buf.row_len();
    let mut h = Histogram::new();
    if row_len == 0 {
        return h;
    }
    for row in buf.data().chunks(row_len) {
        sample_row(&mut h, row);
    }
    h
}

/// Histogram of a single channel (0 = R, 1 = G, 2 = B).
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] for any other channel index.
pub fn histogram_channel(buf: &PixelBuffer, channel: usize) -> OpsResult<Histogram> {
    if channel >= CHANNELS {
        return Err(OpsError::InvalidParameter(format!(
            "channel {} out of range 0..{}",
            channel, CHANNELS
        )));
    }
    trace!(width = buf.width(), height = buf.height(), channel, "histogram_channel");
    Ok(fold_rows(buf, |h, row| {
        for px in row.chunks_exact(CHANNELS) {
            h.add(px[channel]);
        }
    }))
}

/// Histogram of all three channels pooled together.
pub fn histogram_rgb(buf: &PixelBuffer) -> Histogram {
    trace!(width = buf.width(), height = buf.height(), "histogram_rgb");
    fold_rows(buf, |h, row| {
        for &v in row {
            h.add(v);
        }
    })
}

/// Histogram of per-pixel grey level `(r + g + b) / 3`.
pub fn histogram_luma(buf: &PixelBuffer) -> Histogram {
    trace!(width = buf.width(), height = buf.height(), "histogram_luma");
    fold_rows(buf, |h, row| {
        for px in row.chunks_exact(CHANNELS) {
            h.add(grey(px));
        }
    })
}

/// Per-pixel grey level used by [`histogram_luma`].
#[inline]
pub fn grey(px: &[f32]) -> f32 {
    (px[0] + px[1] + px[2]) / 3.0
}

/// Histograms of R, G and B, in that order.
pub fn histogram_per_channel(buf: &PixelBuffer) -> [Histogram; CHANNELS] {
    [0, 1, 2].map(|c| {
        fold_rows(buf, |h, row| {
            for px in row.chunks_exact(CHANNELS) {
                h.add(px[c]);
            }
        })
    })
}
