//! Pixel buffer type shared by every transform.
//!
//! [`PixelBuffer`] is the one image container of the workspace: a rectangular
//! grid of RGB samples stored as normalized `f32` values in `[0.0, 1.0]`.
//!
//! # Memory Layout
//!
//! Pixels are stored in **row-major** order, top-to-bottom, with the three
//! channels interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//!         ...
//! ```
//!
//! # Byte Boundary
//!
//! 8-bit data only exists at the edges of the library. [`PixelBuffer::from_rgb8`]
//! divides by 255, [`PixelBuffer::to_rgb8`] rounds back. Editors that keep
//! their pixels in BGR order use [`PixelBuffer::from_bgr8`] and
//! [`PixelBuffer::to_bgr8`].
//!
//! ```rust
//! use dip_core::PixelBuffer;
//!
//! let bytes = [255u8, 128, 0, 0, 0, 255];
//! let buf = PixelBuffer::from_rgb8(2, 1, &bytes).unwrap();
//! assert_eq!(buf.pixel(0, 0)[0], 1.0);
//! assert_eq!(buf.to_rgb8(), bytes);
//! ```
//!
//! # Sharing
//!
//! Storage sits behind an [`Arc`], so `clone()` is cheap and the first write
//! to a shared buffer copies it. Undo histories rely on this to keep
//! before/after snapshots without duplicating pixels.

use crate::{Error, Rect, Result};
use std::sync::Arc;

/// Number of interleaved channels per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// Normalized RGB image buffer.
///
/// # Example
///
/// ```rust
/// use dip_core::PixelBuffer;
///
/// let mut img = PixelBuffer::new(4, 3);
/// img.set_pixel(1, 2, [1.0, 0.5, 0.25]);
/// assert_eq!(img.pixel(1, 2), [1.0, 0.5, 0.25]);
/// assert_eq!(img.dimensions(), (4, 3));
/// ```
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    data: Arc<Vec<f32>>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Creates a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; CHANNELS])
    }

    /// Creates an image where every pixel has the given value.
    pub fn filled(width: u32, height: u32, value: [f32; CHANNELS]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&value);
        }
        Self {
            data: Arc::new(data),
            width,
            height,
        }
    }

    /// Wraps existing interleaved RGB samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len()` is not
    /// `width * height * 3` or the size computation overflows.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = sample_count(width, height)?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
        })
    }

    /// Imports 8-bit RGB bytes (value / 255).
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        check_bytes(width, height, bytes)?;
        let data = bytes.iter().map(|&b| b as f32 / 255.0).collect();
        Self::from_data(width, height, data)
    }

    /// Imports 8-bit BGR bytes, swapping into RGB order.
    pub fn from_bgr8(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        check_bytes(width, height, bytes)?;
        let mut data = Vec::with_capacity(bytes.len());
        for px in bytes.chunks_exact(CHANNELS) {
            data.push(px[2] as f32 / 255.0);
            data.push(px[1] as f32 / 255.0);
            data.push(px[0] as f32 / 255.0);
        }
        Self::from_data(width, height, data)
    }

    /// Exports as 8-bit RGB bytes.
    ///
    /// Values are clamped to `[0, 1]` and rounded; NaN becomes 0.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| to_byte(v)).collect()
    }

    /// Exports as 8-bit BGR bytes.
    pub fn to_bgr8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(CHANNELS) {
            out.push(to_byte(px[2]));
            out.push(to_byte(px[1]));
            out.push(to_byte(px[0]));
        }
        out
    }

    /// Image width in pixels (number of columns).
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels (number of rows).
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` when the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Full-image rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Number of samples in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Raw interleaved samples.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the samples, copying first if the storage is shared.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Returns `true` if both buffers point at the same storage.
    #[inline]
    pub fn shares_storage(&self, other: &PixelBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let len = self.row_len();
        let start = y as usize * len;
        &self.data[start..start + len]
    }

    /// Pixel at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; CHANNELS] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Writes the pixel at `(x, y)`.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [f32; CHANNELS]) {
        let i = self.index(x, y);
        self.data_mut()[i..i + CHANNELS].copy_from_slice(&value);
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: [f32; CHANNELS]) {
        for px in self.data_mut().chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&value);
        }
    }

    /// Iterates over `(x, y, pixel)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, [f32; CHANNELS])> + '_ {
        let width = self.width.max(1);
        self.data
            .chunks_exact(CHANNELS)
            .enumerate()
            .map(move |(i, px)| {
                let i = i as u32;
                (i % width, i / width, [px[0], px[1], px[2]])
            })
    }

    /// Applies `f` to every pixel and returns a new buffer.
    pub fn map_pixels<F>(&self, f: F) -> PixelBuffer
    where
        F: Fn([f32; CHANNELS]) -> [f32; CHANNELS],
    {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(CHANNELS) {
            data.extend_from_slice(&f([px[0], px[1], px[2]]));
        }
        Self {
            data: Arc::new(data),
            width: self.width,
            height: self.height,
        }
    }

    /// Copies out the sub-image covered by `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if `rect` does not fit inside the image.
    pub fn crop(&self, rect: Rect) -> Result<PixelBuffer> {
        let fits = rect.x.checked_add(rect.width).is_some_and(|r| r <= self.width)
            && rect.y.checked_add(rect.height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(Error::invalid_region(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                self.width,
                self.height,
            ));
        }
        let x0 = rect.x as usize * CHANNELS;
        let x1 = x0 + rect.width as usize * CHANNELS;
        let mut data = Vec::with_capacity(rect.area() as usize * CHANNELS);
        for y in rect.y..rect.bottom() {
            data.extend_from_slice(&self.row(y)[x0..x1]);
        }
        Ok(Self {
            data: Arc::new(data),
            width: rect.width,
            height: rect.height,
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("shared", &(Arc::strong_count(&self.data) > 1))
            .finish()
    }
}

fn sample_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "buffer size overflows"))
}

fn check_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<()> {
    if bytes.len() % CHANNELS != 0 {
        return Err(Error::channel_mismatch(CHANNELS, bytes.len()));
    }
    let expected = sample_count(width, height)?;
    if bytes.len() != expected {
        return Err(Error::invalid_dimensions(
            width,
            height,
            format!("expected {} bytes, got {}", expected, bytes.len()),
        ));
    }
    Ok(())
}

#[inline]
fn to_byte(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_is_black() {
        let img = PixelBuffer::new(3, 2);
        assert_eq!(img.data().len(), 18);
        assert!(img.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_data_rejects_bad_length() {
        let err = PixelBuffer::from_data(2, 2, vec![0.0; 11]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_rgb8_roundtrip() {
        let bytes: Vec<u8> = (0..=255u8).flat_map(|v| [v, 255 - v, v / 2]).collect();
        let img = PixelBuffer::from_rgb8(16, 16, &bytes).unwrap();
        assert_eq!(img.to_rgb8(), bytes);
    }

    #[test]
    fn test_bgr8_swaps_channels() {
        let img = PixelBuffer::from_bgr8(1, 1, &[10, 20, 255]).unwrap();
        assert_relative_eq!(img.pixel(0, 0)[0], 1.0);
        assert_relative_eq!(img.pixel(0, 0)[2], 10.0 / 255.0);
        assert_eq!(img.to_bgr8(), vec![10, 20, 255]);
    }

    #[test]
    fn test_from_rgb8_partial_pixel() {
        let err = PixelBuffer::from_rgb8(1, 1, &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::ChannelMismatch { .. }));
    }

    #[test]
    fn test_to_rgb8_clamps_and_nan() {
        let img = PixelBuffer::from_data(1, 1, vec![f32::NAN, -3.0, 7.0]).unwrap();
        assert_eq!(img.to_rgb8(), vec![0, 0, 255]);
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let a = PixelBuffer::filled(2, 2, [0.5; 3]);
        let mut b = a.clone();
        assert!(a.shares_storage(&b));
        b.set_pixel(0, 0, [1.0, 1.0, 1.0]);
        assert!(!a.shares_storage(&b));
        assert_eq!(a.pixel(0, 0), [0.5; 3]);
        assert_eq!(b.pixel(0, 0), [1.0; 3]);
    }

    #[test]
    fn test_crop() {
        let mut img = PixelBuffer::new(4, 4);
        img.set_pixel(2, 1, [1.0, 0.0, 0.0]);
        let c = img.crop(Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(c.dimensions(), (2, 2));
        assert_eq!(c.pixel(1, 0), [1.0, 0.0, 0.0]);
        assert!(img.crop(Rect::new(3, 3, 2, 1)).is_err());
    }

    #[test]
    fn test_pixels_iterates_row_major() {
        let mut img = PixelBuffer::new(2, 2);
        img.set_pixel(1, 1, [0.25; 3]);
        let last = img.pixels().last().unwrap();
        assert_eq!(last, (1, 1, [0.25; 3]));
    }

    #[test]
    fn test_map_pixels() {
        let img = PixelBuffer::filled(2, 1, [0.2, 0.4, 0.6]);
        let out = img.map_pixels(|[r, g, b]| [b, g, r]);
        assert_eq!(out.pixel(1, 0), [0.6, 0.4, 0.2]);
    }
}
