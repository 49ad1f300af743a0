//! Deterministic test images.

use dip_core::PixelBuffer;
use dip_ops::parallel::generate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform noise from a fixed seed.
pub fn noise(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..width as usize * height as usize * 3)
        .map(|_| rng.random::<f32>())
        .collect();
    // Lengths always match here.
    PixelBuffer::from_data(width, height, data).unwrap_or_else(|_| PixelBuffer::new(width, height))
}

/// Checkerboard with cells of `cell` pixels.
pub fn checker(width: u32, height: u32, cell: u32) -> PixelBuffer {
    let cell = cell.max(1);
    generate(width, height, move |x, y| {
        if (x / cell + y / cell) % 2 == 0 { [1.0; 3] } else { [0.0; 3] }
    })
}

/// Mean absolute difference between horizontally adjacent samples.
pub fn roughness(img: &PixelBuffer) -> f32 {
    let mut sum = 0.0f64;
    let mut n = 0u64;
    for y in 0..img.height() {
        let row = img.row(y);
        for pair in row.windows(4) {
            sum += (pair[3] - pair[0]).abs() as f64;
            n += 1;
        }
    }
    if n == 0 { 0.0 } else { (sum / n as f64) as f32 }
}
