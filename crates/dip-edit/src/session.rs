//! Editing session: the current image plus its undo history.
//!
//! ```rust
//! use dip_core::PixelBuffer;
//! use dip_edit::{slider::Adjustment, EditSession};
//!
//! let mut session = EditSession::new(PixelBuffer::filled(8, 8, [0.4, 0.4, 0.4]));
//! session.apply_adjustment(Adjustment::Lightness, &[50]).unwrap();
//! assert!(session.image().pixel(0, 0)[0] > 0.4);
//!
//! session.undo().unwrap();
//! assert_eq!(session.image().pixel(0, 0), [0.4, 0.4, 0.4]);
//! ```

use crate::history::{EditCommand, History};
use crate::slider::Adjustment;
use crate::{EditError, EditResult};
use dip_core::PixelBuffer;
use dip_ops::{OpsResult, ToneOp};
use tracing::debug;

/// Current image and undo history.
#[derive(Debug, Clone)]
pub struct EditSession {
    image: PixelBuffer,
    history: History,
}

impl EditSession {
    /// Starts a session on `image` with the default history depth.
    pub fn new(image: PixelBuffer) -> Self {
        Self::with_history(image, History::default())
    }

    /// Starts a session with a custom history.
    pub fn with_history(image: PixelBuffer, history: History) -> Self {
        Self { image, history }
    }

    /// Current image.
    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// Undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replaces the image (e.g. after opening a file) and clears the history.
    pub fn load(&mut self, image: PixelBuffer) {
        self.image = image;
        self.history.clear();
    }

    /// Runs `op` on the current image and records the change.
    ///
    /// On error the image and history are left untouched.
    pub fn apply<F>(&mut self, description: impl Into<String>, op: F) -> EditResult<()>
    where
        F: FnOnce(&PixelBuffer) -> OpsResult<PixelBuffer>,
    {
        let description = description.into();
        let after = op(&self.image)?;
        debug!(
            %description,
            width = after.width(),
            height = after.height(),
            "apply edit"
        );
        let before = std::mem::replace(&mut self.image, after.clone());
        self.history.push(EditCommand::new(description, before, after));
        Ok(())
    }

    /// Applies a tonal operation.
    pub fn apply_tone(&mut self, op: &ToneOp) -> EditResult<()> {
        self.apply(op.name(), |img| Ok(op.apply(img)))
    }

    /// Applies a slider-driven adjustment.
    pub fn apply_adjustment(&mut self, adjustment: Adjustment, raw: &[i32]) -> EditResult<()> {
        let op = adjustment.build(raw)?;
        self.apply_tone(&op)
    }

    /// Runs `op` on the current image without recording anything.
    pub fn preview<F>(&self, op: F) -> OpsResult<PixelBuffer>
    where
        F: FnOnce(&PixelBuffer) -> OpsResult<PixelBuffer>,
    {
        op(&self.image)
    }

    /// Preview of a slider-driven adjustment.
    pub fn preview_adjustment(&self, adjustment: Adjustment, raw: &[i32]) -> EditResult<PixelBuffer> {
        let op = adjustment.build(raw)?;
        Ok(op.apply(&self.image))
    }

    /// Reverts the last edit; returns its description.
    pub fn undo(&mut self) -> EditResult<String> {
        let command = self.history.undo().ok_or(EditError::NothingToUndo)?;
        self.image = command.before.clone();
        debug!(description = %command.description, "undo");
        Ok(command.description.clone())
    }

    /// Reapplies the last undone edit; returns its description.
    pub fn redo(&mut self) -> EditResult<String> {
        let command = self.history.redo().ok_or(EditError::NothingToRedo)?;
        self.image = command.after.clone();
        debug!(description = %command.description, "redo");
        Ok(command.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dip_ops::{filter, transform};

    fn session() -> EditSession {
        EditSession::new(PixelBuffer::filled(12, 10, [0.25, 0.5, 0.75]))
    }

    #[test]
    fn test_apply_and_undo_restores_snapshot() {
        let mut s = session();
        let original = s.image().clone();
        s.apply("flip", |img| Ok(transform::flip_vertical(img))).unwrap();
        s.apply("median", |img| filter::median(img, 3)).unwrap();
        assert_eq!(s.image().dimensions(), (9, 7));

        assert_eq!(s.undo().unwrap(), "median");
        assert_eq!(s.undo().unwrap(), "flip");
        assert!(s.image().shares_storage(&original));
        assert!(matches!(s.undo(), Err(EditError::NothingToUndo)));
    }

    #[test]
    fn test_redo() {
        let mut s = session();
        s.apply_tone(&ToneOp::Gamma { gamma: 2.0, c: 1.0 }).unwrap();
        let edited = s.image().clone();
        s.undo().unwrap();
        assert_eq!(s.redo().unwrap(), "gamma");
        assert_eq!(s.image(), &edited);
        assert!(matches!(s.redo(), Err(EditError::NothingToRedo)));
    }

    #[test]
    fn test_failed_op_leaves_state() {
        let mut s = session();
        let err = s.apply("median", |img| filter::median(img, 99));
        assert!(matches!(err, Err(EditError::Ops(_))));
        assert!(!s.history().can_undo());
        assert_eq!(s.image().dimensions(), (12, 10));
    }

    #[test]
    fn test_preview_does_not_commit() {
        let s = session();
        let p = s.preview_adjustment(Adjustment::Saturation, &[-100]).unwrap();
        assert!((p.pixel(0, 0)[0] - 0.5).abs() < 1e-6);
        assert_eq!(s.image().pixel(0, 0), [0.25, 0.5, 0.75]);
        assert!(!s.history().can_undo());
    }

    #[test]
    fn test_load_clears_history() {
        let mut s = session();
        s.apply_adjustment(Adjustment::Hue, &[90]).unwrap();
        s.load(PixelBuffer::new(2, 2));
        assert!(!s.history().can_undo());
        assert_eq!(s.image().dimensions(), (2, 2));
    }
}
