//! Before/after undo history.
//!
//! Every edit is recorded as an [`EditCommand`] holding the image before
//! and after the change. Snapshots are [`PixelBuffer`]s, which share their
//! storage, so keeping both sides costs no extra pixel copies when the
//! session already holds one of them.

use dip_core::PixelBuffer;
use std::collections::VecDeque;
use tracing::debug;

/// Default number of undo steps kept.
pub const DEFAULT_DEPTH: usize = 50;

/// One recorded edit.
#[derive(Debug, Clone)]
pub struct EditCommand {
    /// Human-readable description ("gamma", "rotate", ...).
    pub description: String,
    /// Image before the edit.
    pub before: PixelBuffer,
    /// Image after the edit.
    pub after: PixelBuffer,
}

impl EditCommand {
    /// Creates a command.
    pub fn new(description: impl Into<String>, before: PixelBuffer, after: PixelBuffer) -> Self {
        Self {
            description: description.into(),
            before,
            after,
        }
    }
}

/// Bounded undo/redo stacks.
///
/// Pushing a new command clears the redo stack. When the undo stack grows
/// past `max_depth` the oldest command is dropped.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<EditCommand>,
    redo_stack: VecDeque<EditCommand>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl History {
    /// Creates a history keeping at most `max_depth` undo steps (at least 1).
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Records a command.
    pub fn push(&mut self, command: EditCommand) {
        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(description = %dropped.description, "history full, dropping oldest");
            }
        }
    }

    /// Steps back; returns the image to restore.
    pub fn undo(&mut self) -> Option<&EditCommand> {
        let command = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(command);
        self.redo_stack.back()
    }

    /// Steps forward again; returns the image to restore.
    pub fn redo(&mut self) -> Option<&EditCommand> {
        let command = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(command);
        self.undo_stack.back()
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the command [`undo`](Self::undo) would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description.as_str())
    }

    /// Description of the command [`redo`](Self::redo) would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description.as_str())
    }

    /// Undo descriptions, most recent first.
    pub fn undo_history(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(|c| c.description.as_str()).collect()
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo steps.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drops all commands.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(name: &str, a: f32, b: f32) -> EditCommand {
        EditCommand::new(
            name,
            PixelBuffer::filled(1, 1, [a; 3]),
            PixelBuffer::filled(1, 1, [b; 3]),
        )
    }

    #[test]
    fn test_undo_redo_order() {
        let mut h = History::default();
        h.push(cmd("one", 0.0, 0.1));
        h.push(cmd("two", 0.1, 0.2));
        assert_eq!(h.undo_description(), Some("two"));

        let undone = h.undo().unwrap();
        assert_eq!(undone.before.pixel(0, 0), [0.1; 3]);
        assert_eq!(h.redo_description(), Some("two"));
        assert_eq!(h.undo_description(), Some("one"));

        let redone = h.redo().unwrap();
        assert_eq!(redone.after.pixel(0, 0), [0.2; 3]);
        assert!(!h.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut h = History::default();
        h.push(cmd("one", 0.0, 0.1));
        h.undo();
        assert!(h.can_redo());
        h.push(cmd("other", 0.0, 0.5));
        assert!(!h.can_redo());
        assert_eq!(h.undo_history(), vec!["other"]);
    }

    #[test]
    fn test_bounded_depth() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(cmd(&format!("step{}", i), 0.0, 0.0));
        }
        assert_eq!(h.undo_count(), 3);
        assert_eq!(h.undo_history(), vec!["step4", "step3", "step2"]);
    }

    #[test]
    fn test_empty() {
        let mut h = History::new(0);
        assert_eq!(h.max_depth(), 1);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        h.push(cmd("x", 0.0, 1.0));
        h.clear();
        assert!(!h.can_undo());
    }
}
