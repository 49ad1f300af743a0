//! Integration tests for dip-rs crates.
//!
//! End-to-end checks of the properties the editor relies on: color
//! round trips, histogram bookkeeping, remapping, filters, geometry, and
//! the editing session on top of them.
//!
//! Set `RUST_LOG=dip_ops=trace` to see the operation log while tests run.

use dip_core::PixelBuffer;
use dip_ops::parallel::generate;
use std::sync::Once;

pub mod fixtures;

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Smooth diagonal gradient, distinct per channel.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    let (w, h) = (width.max(2) as f32 - 1.0, height.max(2) as f32 - 1.0);
    generate(width, height, move |x, y| {
        let fx = x as f32 / w;
        let fy = y as f32 / h;
        [0.5 * (fx + fy), fx, 1.0 - fy]
    })
}
