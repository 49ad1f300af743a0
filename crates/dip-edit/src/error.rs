//! Error types for editing sessions.

use dip_ops::OpsError;
use thiserror::Error;

/// Error type for editing sessions.
#[derive(Error, Debug)]
pub enum EditError {
    /// The operation itself failed.
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Undo requested with an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Wrong number of slider values for an adjustment.
    #[error("{adjustment} takes {expected} parameter(s), got {got}")]
    ParameterCount {
        /// Adjustment name.
        adjustment: &'static str,
        /// Expected number of values.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },
}

/// Result type for editing sessions.
pub type EditResult<T> = Result<T, EditError>;
