//! # dip-ops
//!
//! Image editing operations on [`dip_core::PixelBuffer`].
//!
//! Every operation is pure: it reads its input and returns a freshly
//! allocated buffer.
//!
//! # Modules
//!
//! - [`color`] - RGB <-> HSL conversion
//! - [`histogram`] - 256-bucket histograms and CDFs
//! - [`tone`] - Lightness, saturation, hue, gamma, log, power, tone curves
//! - [`curve`] - Piecewise-linear [`ToneCurve`]
//! - [`remap`] - Histogram equalization and specification (SML/GML)
//! - [`filter`] - Median, Gaussian, edge operators, sharpening
//! - [`transform`] - Rotation, quarter turns, flips, crop
//! - [`frequency`] - FFT low/high-pass and Laplacian (feature `fft`)
//! - [`parallel`] - 8-tile fan-out driver and row-parallel helpers
//!
//! # Example
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_ops::{filter, remap, tone};
//!
//! let img = PixelBuffer::filled(32, 24, [0.2, 0.4, 0.6]);
//! let brighter = tone::lightness(&img, (-0.3f32).exp());
//! let equalized = remap::equalize(&brighter);
//! let blurred = filter::gaussian(&equalized, 3, 1.0).unwrap();
//! assert_eq!(blurred.dimensions(), (29, 21));
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - Run tiles and rows on the rayon thread pool
//! - `fft` (default) - Frequency-domain filters via rustfft
//! - `serde` - Serialize [`ToneOp`], [`ToneCurve`] and filter parameters

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod color;
pub mod curve;
pub mod filter;
pub mod histogram;
pub mod parallel;
pub mod remap;
pub mod tone;
pub mod transform;

#[cfg(feature = "fft")]
pub mod frequency;

pub use curve::ToneCurve;
pub use error::{OpsError, OpsResult};
pub use filter::{EdgeOperator, Kernel};
pub use histogram::Histogram;
pub use tone::ToneOp;

#[cfg(feature = "fft")]
pub use frequency::{FilterKind, FrequencyFilter, Pass};
