//! Tile fan-out driver and row-parallel helpers.
//!
//! Point-wise operations split their output into a fixed grid of 8 tiles
//! (4 row bands by 2 column halves) and fill every tile on its own task:
//!
//! ```text
//!        0        w/2        w
//!    0   +---------+---------+
//!        | tile 0  | tile 1  |
//!  h/4   +---------+---------+
//!        | tile 2  | tile 3  |
//!  h/2   +---------+---------+
//!        | tile 4  | tile 5  |
//! 3h/4   +---------+---------+
//!        | tile 6  | tile 7  |
//!    h   +---------+---------+
//! ```
//!
//! The output buffer is cut into disjoint mutable slices before any task
//! starts, so workers never share writable memory. With the `parallel`
//! feature the tiles run inside a [`rayon::scope`]; without it they run one
//! after another on the calling thread. Either way [`fan_out`] returns only
//! once all tiles are complete.
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::parallel::map_pixels;
//!
//! let src = PixelBuffer::filled(16, 9, [0.2, 0.4, 0.6]);
//! let inverted = map_pixels(&src, |[r, g, b]| [1.0 - r, 1.0 - g, 1.0 - b]);
//! assert_eq!(inverted.pixel(15, 8), [0.8, 0.6, 0.4]);
//! ```

use dip_core::{PixelBuffer, Rect, CHANNELS};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of tiles produced by [`tiles`].
pub const TILE_COUNT: usize = 8;

/// Computes the 8-tile partition of a `width x height` image.
///
/// Row boundaries are `{0, h/4, h/2, 3h/4, h}` and column boundaries
/// `{0, w/2, w}`. Tiles are ordered band by band, left half first. Tiles
/// may be empty for images smaller than the grid.
///
/// ```rust
/// use dip_ops::parallel::tiles;
///
/// let t = tiles(10, 9);
/// let total: u64 = t.iter().map(|r| r.area()).sum();
/// assert_eq!(total, 90);
/// ```
pub fn tiles(width: u32, height: u32) -> [Rect; TILE_COUNT] {
    let h = height as u64;
    let rows = [0, h / 4, h / 2, h * 3 / 4, h].map(|v| v as u32);
    let cols = [0, width / 2, width];

    let mut out = [Rect::default(); TILE_COUNT];
    for band in 0..4 {
        for half in 0..2 {
            out[band * 2 + half] = Rect::from_bounds(
                cols[half],
                rows[band],
                cols[half + 1],
                rows[band + 1],
            );
        }
    }
    out
}

/// Mutable view of one tile of an output buffer.
///
/// Holds one slice per image row covered by the tile. Coordinates passed
/// to its methods are image coordinates, not tile-local ones.
pub struct TileMut<'a> {
    rect: Rect,
    rows: Vec<&'a mut [f32]>,
}

impl<'a> TileMut<'a> {
    /// Region of the image covered by this tile.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Iterates over `(y, samples)` for each row of the tile.
    ///
    /// `samples` starts at column `rect().x`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (u32, &mut [f32])> + '_ {
        let y0 = self.rect.y;
        self.rows
            .iter_mut()
            .enumerate()
            .map(move |(i, row)| (y0 + i as u32, &mut **row))
    }

    /// Calls `f(x, y, pixel)` for every pixel in the tile.
    pub fn for_each_pixel<F>(&mut self, mut f: F)
    where
        F: FnMut(u32, u32, &mut [f32]),
    {
        let x0 = self.rect.x;
        for (y, row) in self.rows_mut() {
            for (i, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                f(x0 + i as u32, y, px);
            }
        }
    }
}

/// Splits `data` into the 8 disjoint tiles of [`tiles`].
fn split_tiles(data: &mut [f32], width: u32, height: u32) -> Vec<TileMut<'_>> {
    let rects = tiles(width, height);
    let row_len = width as usize * CHANNELS;
    let split = (width / 2) as usize * CHANNELS;

    let mut out = Vec::with_capacity(TILE_COUNT);
    let mut rest = data;
    for band in 0..4 {
        let left = rects[band * 2];
        let right = rects[band * 2 + 1];
        let (band_data, tail) = std::mem::take(&mut rest).split_at_mut(left.height as usize * row_len);
        rest = tail;

        let mut left_rows = Vec::with_capacity(left.height as usize);
        let mut right_rows = Vec::with_capacity(right.height as usize);
        for row in band_data.chunks_exact_mut(row_len) {
            let (l, r) = row.split_at_mut(split);
            left_rows.push(l);
            right_rows.push(r);
        }
        out.push(TileMut { rect: left, rows: left_rows });
        out.push(TileMut { rect: right, rows: right_rows });
    }
    out
}

/// Runs `worker` once per non-empty tile of `dst` and waits for all of them.
///
/// Each invocation gets exclusive access to its own [`TileMut`].
#[cfg(feature = "parallel")]
pub fn fan_out<F>(dst: &mut PixelBuffer, worker: F)
where
    F: Fn(&mut TileMut<'_>) + Sync,
{
    if dst.is_empty() {
        return;
    }
    let (width, height) = dst.dimensions();
    let tiles = split_tiles(dst.data_mut(), width, height);
    let worker = &worker;
    rayon::scope(|s| {
        for mut tile in tiles.into_iter().filter(|t| !t.rect.is_empty()) {
            s.spawn(move |_| worker(&mut tile));
        }
    });
}

/// Runs `worker` once per tile of `dst` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn fan_out<F>(dst: &mut PixelBuffer, worker: F)
where
    F: Fn(&mut TileMut<'_>) + Sync,
{
    if dst.is_empty() {
        return;
    }
    let (width, height) = dst.dimensions();
    for mut tile in split_tiles(dst.data_mut(), width, height)
        .into_iter()
        .filter(|t| !t.rect.is_empty())
    {
        worker(&mut tile);
    }
}

/// Applies `f` to every pixel of `src` through the tile driver.
pub fn map_pixels<F>(src: &PixelBuffer, f: F) -> PixelBuffer
where
    F: Fn([f32; CHANNELS]) -> [f32; CHANNELS] + Sync,
{
    let mut dst = PixelBuffer::new(src.width(), src.height());
    fan_out(&mut dst, |tile| {
        let x0 = tile.rect().x as usize * CHANNELS;
        for (y, row) in tile.rows_mut() {
            let src_row = &src.row(y)[x0..x0 + row.len()];
            for (out, px) in row.chunks_exact_mut(CHANNELS).zip(src_row.chunks_exact(CHANNELS)) {
                out.copy_from_slice(&f([px[0], px[1], px[2]]));
            }
        }
    });
    dst
}

/// Builds a `width x height` image where pixel `(x, y)` is `f(x, y)`.
pub fn generate<F>(width: u32, height: u32, f: F) -> PixelBuffer
where
    F: Fn(u32, u32) -> [f32; CHANNELS] + Sync,
{
    let mut dst = PixelBuffer::new(width, height);
    fan_out(&mut dst, |tile| {
        tile.for_each_pixel(|x, y, px| px.copy_from_slice(&f(x, y)));
    });
    dst
}

/// Calls `f(y, row)` for every row of length `row_len` in `data`.
///
/// Rows are processed in parallel when the `parallel` feature is enabled.
#[cfg(feature = "parallel")]
pub fn for_each_row<F>(data: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }
    data.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Calls `f(y, row)` for every row of length `row_len` in `data` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn for_each_row<F>(data: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }
    for (y, row) in data.chunks_mut(row_len).enumerate() {
        f(y, row);
    }
}
