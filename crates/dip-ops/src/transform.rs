//! Geometric transforms: arbitrary rotation, quarter turns, flips, crop.
//!
//! # Operations
//!
//! - [`rotate`] - Rotation by any angle with bilinear sampling
//! - [`rotate_90_cw`], [`rotate_180`], [`rotate_90_ccw`] - Exact quarter turns
//! - [`flip_horizontal`], [`flip_vertical`] - Mirrors
//! - [`crop`] - Extract a region
//!
//! Coordinates are `x` = column, `y` = row, origin top-left. Positive
//! angles rotate clockwise as seen on screen.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::transform::{flip_horizontal, rotate};
//! use std::f32::consts::FRAC_PI_2;
//!
//! let img = PixelBuffer::filled(6, 4, [0.5, 0.5, 0.5]);
//! let turned = rotate(&img, FRAC_PI_2);
//! assert_eq!(turned.dimensions(), (4, 6));
//! assert_eq!(flip_horizontal(&flip_horizontal(&img)), img);
//! ```

use crate::parallel::{for_each_row, generate};
use crate::OpsResult;
use dip_core::{PixelBuffer, Rect, CHANNELS};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, trace};

/// Tolerance for the rotated canvas size and the source sampling domain.
pub const ROTATE_EPSILON: f32 = 1e-3;

/// Angles closer than this to a multiple of 90 degrees use exact copies.
pub const RIGHT_ANGLE_SNAP: f32 = 1e-6;

/// Fill color for output pixels that map outside the source.
pub const BACKGROUND: [f32; CHANNELS] = [1.0, 1.0, 1.0];

/// Bilinear sample at `(x, y)`, clamped to `[0, w-1] x [0, h-1]`.
///
/// Uses 4 neighbours, falling back to 2 or 1 on the last row/column.
/// An empty buffer yields [`BACKGROUND`].
pub fn sample_bilinear(src: &PixelBuffer, x: f32, y: f32) -> [f32; CHANNELS] {
    if src.is_empty() {
        return BACKGROUND;
    }
    let (w, h) = (src.width(), src.height());
    let x0 = (x.floor().max(0.0) as u32).min(w - 1);
    let y0 = (y.floor().max(0.0) as u32).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = (x - x0 as f32).clamp(0.0, 1.0);
    let fy = (y - y0 as f32).clamp(0.0, 1.0);

    let p00 = src.pixel(x0, y0);
    let p10 = src.pixel(x1, y0);
    let p01 = src.pixel(x0, y1);
    let p11 = src.pixel(x1, y1);

    let mut out = [0.0; CHANNELS];
    for c in 0..CHANNELS {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bot = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bot * fy;
    }
    out
}

/// Canvas size that holds `width x height` rotated by `theta`.
pub fn rotated_size(width: u32, height: u32, theta: f32) -> (u32, u32) {
    let (s, c) = theta.sin_cos();
    let (s, c) = (s.abs(), c.abs());
    let (w, h) = (width as f32, height as f32);
    let new_w = (w * c + h * s - ROTATE_EPSILON).ceil().max(0.0) as u32;
    let new_h = (w * s + h * c - ROTATE_EPSILON).ceil().max(0.0) as u32;
    (new_w, new_h)
}

/// Returns the quarter-turn count (0..4) if `theta` is a multiple of 90 degrees.
fn right_angle_turns(theta: f32) -> Option<u32> {
    let k = (theta / FRAC_PI_2).round();
    if (theta - k * FRAC_PI_2).abs() <= RIGHT_ANGLE_SNAP {
        Some((k as i64).rem_euclid(4) as u32)
    } else {
        None
    }
}

/// Rotates by `theta` radians, clockwise on screen.
///
/// The canvas grows to hold the whole rotated image; uncovered pixels are
/// white. Each output pixel is mapped back about the centers of both
/// images and sampled with [`sample_bilinear`]. Multiples of 90 degrees
/// are exact copies.
pub fn rotate(src: &PixelBuffer, theta: f32) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), theta, "rotate");

    if let Some(turns) = right_angle_turns(theta) {
        debug!(turns, "rotate: exact quarter turn");
        return match turns {
            1 => rotate_90_cw(src),
            2 => rotate_180(src),
            3 => rotate_90_ccw(src),
            _ => src.clone(),
        };
    }

    let (new_w, new_h) = rotated_size(src.width(), src.height(), theta);
    if src.is_empty() {
        return PixelBuffer::new(new_w, new_h);
    }

    let (w, h) = (src.width() as f32, src.height() as f32);
    let (sin, cos) = theta.sin_cos();
    let cx = (w - 1.0) / 2.0;
    let cy = (h - 1.0) / 2.0;
    let dx = (new_w as f32 - w) / 2.0;
    let dy = (new_h as f32 - h) / 2.0;
    // Open interval: the band past the last column or row copies the edge.
    let inside = |v: f32, n: f32| v > -ROTATE_EPSILON && v < n + ROTATE_EPSILON;

    generate(new_w, new_h, |i, j| {
        let u = i as f32 - cx - dx;
        let v = j as f32 - cy - dy;
        let sx = cos * u + sin * v + cx;
        let sy = -sin * u + cos * v + cy;
        if inside(sx, w) && inside(sy, h) {
            sample_bilinear(src, sx.clamp(0.0, w - 1.0), sy.clamp(0.0, h - 1.0))
        } else {
            BACKGROUND
        }
    })
}

/// Rotates 90 degrees clockwise.
pub fn rotate_90_cw(src: &PixelBuffer) -> PixelBuffer {
    let (w, h) = src.dimensions();
    generate(h, w, |x, y| src.pixel(y, h - 1 - x))
}

/// Rotates 90 degrees counter-clockwise (270 clockwise).
pub fn rotate_90_ccw(src: &PixelBuffer) -> PixelBuffer {
    let (w, h) = src.dimensions();
    generate(h, w, |x, y| src.pixel(w - 1 - y, x))
}

/// Rotates 180 degrees.
pub fn rotate_180(src: &PixelBuffer) -> PixelBuffer {
    let (w, h) = src.dimensions();
    generate(w, h, |x, y| src.pixel(w - 1 - x, h - 1 - y))
}

/// Mirrors left to right.
pub fn flip_horizontal(src: &PixelBuffer) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), "flip_horizontal");
    let mut dst = PixelBuffer::new(src.width(), src.height());
    for_each_row(dst.data_mut(), src.row_len(), |y, row| {
        let src_row = src.row(y as u32);
        for (d, s) in row
            .chunks_exact_mut(CHANNELS)
            .zip(src_row.chunks_exact(CHANNELS).rev())
        {
            d.copy_from_slice(s);
        }
    });
    dst
}

/// Mirrors top to bottom.
pub fn flip_vertical(src: &PixelBuffer) -> PixelBuffer {
    trace!(width = src.width(), height = src.height(), "flip_vertical");
    let h = src.height();
    let mut dst = PixelBuffer::new(src.width(), h);
    for_each_row(dst.data_mut(), src.row_len(), |y, row| {
        row.copy_from_slice(src.row(h - 1 - y as u32));
    });
    dst
}

/// Copies out the region `rect`.
///
/// # Errors
///
/// Returns [`crate::OpsError::Core`] wrapping an invalid-region error when
/// `rect` is not inside the image.
pub fn crop(src: &PixelBuffer, rect: Rect) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), %rect, "crop");
    Ok(src.crop(rect)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        generate(w, h, |x, y| {
            let v = (y * w + x) as f32;
            [v, v + 0.5, -v]
        })
    }

    #[test]
    fn test_rotate_90_cw_layout() {
        // 3x2:  0 1 2      ->   3 0
        //       3 4 5           4 1
        //                       5 2
        let src = numbered(3, 2);
        let dst = rotate_90_cw(&src);
        assert_eq!(dst.dimensions(), (2, 3));
        assert_eq!(dst.pixel(0, 0)[0], 3.0);
        assert_eq!(dst.pixel(1, 0)[0], 0.0);
        assert_eq!(dst.pixel(0, 2)[0], 5.0);
    }

    #[test]
    fn test_rotate_90_ccw_layout() {
        let src = numbered(3, 2);
        let dst = rotate_90_ccw(&src);
        assert_eq!(dst.dimensions(), (2, 3));
        assert_eq!(dst.pixel(0, 0)[0], 2.0);
        assert_eq!(dst.pixel(1, 2)[0], 3.0);
    }

    #[test]
    fn test_quarter_turns_compose() {
        let src = numbered(5, 3);
        assert_eq!(rotate_90_ccw(&rotate_90_cw(&src)), src);
        assert_eq!(rotate_90_cw(&rotate_90_cw(&src)), rotate_180(&src));
        assert_eq!(rotate_180(&rotate_180(&src)), src);
    }

    #[test]
    fn test_rotate_snaps_to_exact_copies() {
        let src = numbered(5, 3);
        assert_eq!(rotate(&src, FRAC_PI_2), rotate_90_cw(&src));
        assert_eq!(rotate(&src, PI), rotate_180(&src));
        assert_eq!(rotate(&src, -FRAC_PI_2), rotate_90_ccw(&src));
        assert_eq!(rotate(&src, 0.0), src);
        assert_eq!(rotate(&src, 2.0 * PI), src);
    }

    #[test]
    fn test_rotated_size() {
        assert_eq!(rotated_size(10, 20, 0.0), (10, 20));
        let (w, h) = rotated_size(10, 10, PI / 4.0);
        assert_eq!((w, h), (15, 15));
    }

    #[test]
    fn test_rotate_corners_are_white() {
        let src = PixelBuffer::filled(10, 10, [0.0; 3]);
        let out = rotate(&src, PI / 4.0);
        assert_eq!(out.pixel(0, 0), BACKGROUND);
        let (w, h) = out.dimensions();
        assert_eq!(out.pixel(w - 1, h - 1), BACKGROUND);
        assert_eq!(out.pixel(w / 2, h / 2), [0.0; 3]);
    }

    #[test]
    fn test_rotate_direction_is_clockwise() {
        // A bright pixel right of center moves below center for a
        // small clockwise turn.
        let mut src = PixelBuffer::filled(21, 21, [0.0; 3]);
        for x in 15..21 {
            src.set_pixel(x, 10, [1.0; 3]);
        }
        let out = rotate(&src, 0.3);
        let (cx, cy) = (out.width() / 2, out.height() / 2);
        let below: f32 = (cy + 1..cy + 6).map(|y| out.pixel(cx + 7, y)[0]).sum();
        let above: f32 = (cy - 5..cy).map(|y| out.pixel(cx + 7, y)[0]).sum();
        assert!(below > above, "below {} above {}", below, above);
    }

    #[test]
    fn test_rotate_sampling_domain() {
        // 10x10 turned slightly lands on an 11x11 canvas. Column 10 maps
        // back to x ~ 9.5, inside the edge band; column 0 to x ~ -0.5.
        let src = PixelBuffer::filled(10, 10, [0.0; 3]);
        let out = rotate(&src, 0.01);
        assert_eq!(out.dimensions(), (11, 11));
        assert_eq!(out.pixel(10, 5), [0.0; 3]);
        assert_eq!(out.pixel(0, 5), BACKGROUND);
    }

    #[test]
    fn test_bilinear_empty_source() {
        assert_eq!(sample_bilinear(&PixelBuffer::new(0, 0), 0.0, 0.0), BACKGROUND);
    }

    #[test]
    fn test_bilinear_midpoint_and_edge() {
        let src = generate(2, 2, |x, y| [x as f32, y as f32, 0.0]);
        let mid = sample_bilinear(&src, 0.5, 0.5);
        assert_abs_diff_eq!(mid[0], 0.5);
        assert_abs_diff_eq!(mid[1], 0.5);
        let edge = sample_bilinear(&src, 1.0, 1.0);
        assert_eq!(edge, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_flips_are_involutions() {
        let src = numbered(7, 4);
        let h = flip_horizontal(&src);
        assert_eq!(h.pixel(0, 0), src.pixel(6, 0));
        assert_eq!(flip_horizontal(&h), src);
        let v = flip_vertical(&src);
        assert_eq!(v.pixel(2, 0), src.pixel(2, 3));
        assert_eq!(flip_vertical(&v), src);
    }

    #[test]
    fn test_crop_bounds() {
        let src = numbered(6, 6);
        let c = crop(&src, Rect::new(2, 3, 3, 2)).unwrap();
        assert_eq!(c.pixel(0, 0), src.pixel(2, 3));
        assert!(crop(&src, Rect::new(5, 5, 2, 2)).is_err());
    }
}
