//! Histogram equalization and specification.
//!
//! All three operations build a 256-entry lookup table from cumulative
//! distributions and then map every sample through it:
//!
//! - [`equalize`] - one table from the pooled R+G+B distribution
//! - [`specify_sml`] - per channel, single mapping law: each source level
//!   goes to the pattern level with the closest CDF value
//! - [`specify_gml`] - per channel, group mapping law: each pattern level
//!   claims the run of source levels whose CDF lies closest to it
//!
//! Every scan is bounded by the 256 levels, so degenerate CDFs (plateaus,
//! all mass in one bucket) cannot loop.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::remap::specify_sml;
//!
//! let dark = PixelBuffer::filled(4, 4, [0.1, 0.1, 0.1]);
//! let bright = PixelBuffer::filled(2, 2, [0.9, 0.9, 0.9]);
//! let out = specify_sml(&dark, &bright).unwrap();
//! assert!((out.pixel(0, 0)[0] - 0.9).abs() < 1.0 / 255.0);
//! ```

use crate::histogram::{histogram_per_channel, histogram_rgb, quantize, Histogram, LEVELS};
use crate::parallel::map_pixels;
use crate::{OpsError, OpsResult};
use dip_core::PixelBuffer;
use tracing::{debug, trace};

/// Lookup table from source bucket to output value.
type Lut = [f32; LEVELS];

fn ensure_not_empty(buf: &PixelBuffer, what: &str) -> OpsResult<()> {
    if buf.is_empty() {
        return Err(OpsError::InvalidDimensions(format!(
            "{} image is empty ({}x{})",
            what,
            buf.width(),
            buf.height()
        )));
    }
    Ok(())
}

fn apply_luts(src: &PixelBuffer, luts: &[Lut; 3]) -> PixelBuffer {
    map_pixels(src, |px| {
        [
            luts[0][quantize(px[0])],
            luts[1][quantize(px[1])],
            luts[2][quantize(px[2])],
        ]
    })
}

/// Finds the level `j` in `target` closest to `value`.
///
/// Scans forward from `start` while `value > target[j]`, never past 255,
/// then prefers `j - 1` only when it is strictly closer. Returns the chosen
/// level and the scan position, which callers with non-decreasing `value`
/// can reuse as the next `start`.
#[inline]
fn closest_level(value: f32, target: &Lut, start: usize) -> (usize, usize) {
    let mut j = start;
    while j < LEVELS - 1 && value > target[j] {
        j += 1;
    }
    let pick = if j > 0 && (value - target[j - 1]).abs() < (target[j] - value).abs() {
        j - 1
    } else {
        j
    };
    (pick, j)
}

/// Single mapping law table: source level -> pattern level.
pub fn sml_table(orig_cdf: &Lut, pattern_cdf: &Lut) -> [u8; LEVELS] {
    let mut table = [0u8; LEVELS];
    let mut j = 0;
    for (i, dst) in table.iter_mut().enumerate() {
        let (pick, next) = closest_level(orig_cdf[i], pattern_cdf, j);
        j = next;
        *dst = pick as u8;
    }
    table
}

/// Group mapping law table: source level -> pattern level.
///
/// `pattern` supplies which pattern levels actually occur; empty levels
/// never claim source levels.
pub fn gml_table(orig_cdf: &Lut, pattern_cdf: &Lut, pattern: &Histogram) -> [u8; LEVELS] {
    let mut inv = [0usize; LEVELS];
    let mut k = 0;
    for (i, dst) in inv.iter_mut().enumerate() {
        let (pick, next) = closest_level(pattern_cdf[i], orig_cdf, k);
        k = next;
        *dst = pick;
    }

    let mut table = [0u8; LEVELS];
    let mut next_free = 0usize;
    let mut last: Option<u8> = None;
    for (i, &hi) in inv.iter().enumerate() {
        if pattern.count(i) == 0 || hi < next_free {
            continue;
        }
        for dst in &mut table[next_free..=hi] {
            *dst = i as u8;
        }
        next_free = hi + 1;
        last = Some(i as u8);
    }
    let fill = last.unwrap_or(u8::MAX);
    for dst in &mut table[next_free.min(LEVELS)..] {
        *dst = fill;
    }
    table
}

fn level_lut(table: &[u8; LEVELS]) -> Lut {
    table.map(|l| l as f32 / 255.0)
}

/// Histogram equalization.
///
/// Every channel is mapped through the CDF of the pooled three-channel
/// histogram: `out = cdf[quantize(in)]`.
pub fn equalize(src: &PixelBuffer) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), "equalize");
    let cdf = histogram_rgb(src).cdf();
    apply_luts(src, &[cdf, cdf, cdf])
}

/// Per-channel CDFs of source and pattern images.
fn channel_cdfs(src: &PixelBuffer, pattern: &PixelBuffer) -> ([Histogram; 3], [Lut; 3], [Lut; 3]) {
    let orig = histogram_per_channel(src);
    let pat = histogram_per_channel(pattern);
    let orig_cdf = [orig[0].cdf(), orig[1].cdf(), orig[2].cdf()];
    let pat_cdf = [pat[0].cdf(), pat[1].cdf(), pat[2].cdf()];
    (pat, orig_cdf, pat_cdf)
}

/// Histogram specification with the single mapping law.
///
/// The pattern may have any dimensions.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`] if either image is empty.
pub fn specify_sml(src: &PixelBuffer, pattern: &PixelBuffer) -> OpsResult<PixelBuffer> {
    ensure_not_empty(src, "source")?;
    ensure_not_empty(pattern, "pattern")?;
    trace!(
        width = src.width(),
        height = src.height(),
        pattern_width = pattern.width(),
        pattern_height = pattern.height(),
        "specify_sml"
    );

    let (_, orig_cdf, pat_cdf) = channel_cdfs(src, pattern);
    let luts: [Lut; 3] = std::array::from_fn(|c| level_lut(&sml_table(&orig_cdf[c], &pat_cdf[c])));
    debug!("SML tables built");
    Ok(apply_luts(src, &luts))
}

/// Histogram specification with the group mapping law.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`] if either image is empty.
pub fn specify_gml(src: &PixelBuffer, pattern: &PixelBuffer) -> OpsResult<PixelBuffer> {
    ensure_not_empty(src, "source")?;
    ensure_not_empty(pattern, "pattern")?;
    trace!(
        width = src.width(),
        height = src.height(),
        pattern_width = pattern.width(),
        pattern_height = pattern.height(),
        "specify_gml"
    );

    let (pat_hist, orig_cdf, pat_cdf) = channel_cdfs(src, pattern);
    let luts: [Lut; 3] = std::array::from_fn(|c| {
        level_lut(&gml_table(&orig_cdf[c], &pat_cdf[c], &pat_hist[c]))
    });
    debug!("GML tables built");
    Ok(apply_luts(src, &luts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::generate;
    use approx::assert_abs_diff_eq;

    fn ramp(w: u32, h: u32, lo: u32, hi: u32) -> PixelBuffer {
        let n = (w * h) as f32;
        generate(w, h, move |x, y| {
            let t = (y * w + x) as f32 / n;
            let level = lo as f32 + t * (hi - lo) as f32;
            let v = level.floor() / 255.0;
            [v, v, v]
        })
    }

    #[test]
    fn test_equalize_spreads_narrow_range() {
        let img = ramp(32, 32, 100, 140);
        let out = equalize(&img);
        let hist = histogram_rgb(&out);
        let lo = (0..LEVELS).find(|&l| hist.count(l) > 0).unwrap();
        let hi = (0..LEVELS).rev().find(|&l| hist.count(l) > 0).unwrap();
        assert!(lo < 30, "lowest level {}", lo);
        assert_eq!(hi, 255);
    }

    #[test]
    fn test_equalize_constant_goes_white() {
        let img = PixelBuffer::filled(4, 4, [0.3; 3]);
        let out = equalize(&img);
        assert_eq!(out.pixel(0, 0), [1.0; 3]);
    }

    #[test]
    fn test_sml_identity_with_self() {
        let img = ramp(16, 16, 0, 256);
        let out = specify_sml(&img, &img).unwrap();
        for (a, b) in img.data().iter().zip(out.data()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_sml_tie_picks_upper() {
        let mut orig = [1.0f32; LEVELS];
        orig[0] = 0.5;
        let mut pat = [1.0f32; LEVELS];
        pat[0] = 0.25;
        pat[1] = 0.75;
        let table = sml_table(&orig, &pat);
        // 0.5 is equally far from 0.25 and 0.75.
        assert_eq!(table[0], 1);
    }

    #[test]
    fn test_sml_degenerate_cdf_terminates() {
        let orig = [1.0f32; LEVELS];
        let pat = [0.0f32; LEVELS];
        let table = sml_table(&orig, &pat);
        assert!(table.iter().all(|&l| l == 255));
    }

    #[test]
    fn test_gml_maps_onto_pattern_levels() {
        let src = ramp(16, 16, 0, 256);
        let pattern = generate(4, 4, |x, _| if x < 2 { [0.2; 3] } else { [0.8; 3] });
        let out = specify_gml(&src, &pattern).unwrap();
        let allowed = [quantize(0.2), quantize(0.8)];
        for &v in out.data() {
            assert!(allowed.contains(&quantize(v)), "unexpected level {}", v);
        }
        // Dark half goes to the dark pattern level.
        assert_eq!(quantize(out.pixel(0, 0)[0]), quantize(0.2));
        assert_eq!(quantize(out.pixel(15, 15)[0]), quantize(0.8));
    }

    #[test]
    fn test_gml_table_is_monotone() {
        let src = ramp(8, 8, 10, 200);
        let pattern = ramp(5, 3, 50, 90);
        let orig = histogram_per_channel(&src);
        let pat = histogram_per_channel(&pattern);
        let table = gml_table(&orig[0].cdf(), &pat[0].cdf(), &pat[0]);
        for w in table.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let src = PixelBuffer::filled(2, 2, [0.5; 3]);
        let empty = PixelBuffer::new(0, 3);
        assert!(matches!(
            specify_sml(&src, &empty),
            Err(OpsError::InvalidDimensions(_))
        ));
        assert!(matches!(
            specify_gml(&empty, &src),
            Err(OpsError::InvalidDimensions(_))
        ));
    }
}
