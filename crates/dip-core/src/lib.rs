//! # dip-core
//!
//! Core types for dip-rs image editing.
//!
//! - [`PixelBuffer`] - Normalized RGB image buffer shared copy-on-write
//! - [`Rect`] - Pixel rectangle for tiles and crop regions
//! - [`Error`] / [`Result`] - Construction and region errors
//!
//! ## Crate Structure
//!
//! ```text
//! dip-core (this crate)
//!    ^
//!    |
//!    +-- dip-ops (transforms)
//!    +-- dip-edit (sliders, undo history)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod rect;

pub use error::{Error, Result};
pub use image::{PixelBuffer, CHANNELS};
pub use rect::Rect;

/// Prelude module for convenient imports.
///
/// ```
/// use dip_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{PixelBuffer, CHANNELS};
    pub use crate::rect::Rect;
}
