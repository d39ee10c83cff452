// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounded undo/redo history over mask rasters.
//!
//! Each entry is a full snapshot of the active label's mask taken at the
//! start of a stroke. The history is capped; the oldest snapshot is evicted
//! first, and any new stroke invalidates the redo stack.

use image::GrayImage;

/// History system for undo/redo functionality.
pub struct History {
    /// Undo stack (past states)
    undo_stack: Vec<GrayImage>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<GrayImage>,
    /// Maximum history size
    max_size: usize,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: 50, // Keep last 50 states
        }
    }

    /// Save current state before making a change
    pub fn push(&mut self, mask: GrayImage) {
        self.undo_stack.push(mask);
        // Limit history size
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        // Clear redo stack when new action is performed
        self.redo_stack.clear();
    }

    /// Undo: restore previous state
    pub fn undo(&mut self, current: GrayImage) -> Option<GrayImage> {
        if let Some(previous) = self.undo_stack.pop() {
            self.redo_stack.push(current);
            Some(previous)
        } else {
            None
        }
    }

    /// Redo: restore next state
    pub fn redo(&mut self, current: GrayImage) -> Option<GrayImage> {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(current);
            Some(next)
        } else {
            None
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
