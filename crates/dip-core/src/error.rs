//! Error types for dip-core operations.
//!
//! The [`Error`] enum covers failures that can happen while building or
//! slicing a [`crate::PixelBuffer`]:
//! - Buffer construction (length checks, zero or overflowing dimensions)
//! - Region extraction (crop rectangles outside the image)
//! - Byte-level import (wrong channel layout)
//!
//! # Usage
//!
//! ```rust
//! use dip_core::{Error, PixelBuffer, Rect};
//!
//! let img = PixelBuffer::new(10, 10);
//! let err = img.crop(Rect::new(8, 8, 4, 4)).unwrap_err();
//! assert!(matches!(err, Error::InvalidRegion { .. }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while working with pixel buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// Region extends beyond image bounds.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Sample slice does not describe whole pixels of the expected layout.
    #[error("channel mismatch: expected {expected} channels, got {got} samples")]
    ChannelMismatch {
        /// Expected channel count
        expected: usize,
        /// Number of samples received
        got: usize,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when the sample count does not match `width * height * 3`,
    /// or the dimensions would overflow the buffer size computation.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(rx: u32, ry: u32, rw: u32, rh: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx,
            ry,
            rw,
            rh,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(expected: usize, got: usize) -> Self {
        Self::ChannelMismatch { expected, got }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_region_message() {
        let err = Error::invalid_region(8, 8, 4, 4, 10, 10);
        let msg = err.to_string();
        assert!(msg.contains("4x4"));
        assert!(msg.contains("10x10"));
    }

    #[test]
    fn test_channel_mismatch() {
        let err = Error::channel_mismatch(3, 10);
        assert!(err.to_string().contains("expected 3"));
    }
}
