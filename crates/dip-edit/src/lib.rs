//! # dip-edit
//!
//! Editing-session model on top of dip-ops.
//!
//! - [`slider`] - Slider positions to physical parameters, adjustment presets
//! - [`history`] - Bounded before/after undo/redo history
//! - [`session`] - [`EditSession`]: current image, apply, preview, undo, redo

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod history;
pub mod session;
pub mod slider;

pub use error::{EditError, EditResult};
pub use history::{EditCommand, History};
pub use session::EditSession;
pub use slider::{Adjustment, ParameterInfo, Preset, SliderMapping};
