//! History cursor: which prefix of the log is currently rendered.
//!
//! `Live` follows the end of the log as it grows. `Scrubbing` pins the cursor
//! to a prefix chosen on the timeline; new events raise the ceiling the user
//! can scrub to but never move the pinned position.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::log::{LogEntry, PlacementLog};

/// Cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// Tracks the log length.
    #[default]
    Live,
    /// Pinned to an exclusive prefix boundary.
    Scrubbing(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryCursor {
    mode: CursorMode,
}

impl HistoryCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> CursorMode {
        self.mode
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.mode == CursorMode::Live
    }

    /// Rendered prefix length for a log of `log_len` entries.
    #[must_use]
    pub fn position(&self, log_len: usize) -> usize {
        match self.mode {
            CursorMode::Live => log_len,
            CursorMode::Scrubbing(at) => at.min(log_len),
        }
    }

    /// Move the cursor to `value`. Reaching the end of the log is Live.
    ///
    /// Returns the resulting position.
    pub fn scrub_to(&mut self, value: usize, log_len: usize) -> usize {
        self.mode = if value >= log_len {
            CursorMode::Live
        } else {
            CursorMode::Scrubbing(value)
        };
        self.position(log_len)
    }

    /// Freeze at the current position, even at the live edge.
    ///
    /// Grabbing the timeline handle pins it so events arriving mid-drag do
    /// not move the view. Returns the pinned position.
    pub fn pin(&mut self, log_len: usize) -> usize {
        let position = self.position(log_len);
        self.mode = CursorMode::Scrubbing(position);
        position
    }

    /// Return to Live. Returns `true` if the cursor was scrubbing.
    pub fn reset_to_live(&mut self) -> bool {
        let was_scrubbing = !self.is_live();
        self.mode = CursorMode::Live;
        was_scrubbing
    }

    /// The entry the timeline handle points at: the last one inside the prefix.
    #[must_use]
    pub fn label_entry<'a>(&self, log: &'a PlacementLog) -> Option<&'a LogEntry> {
        let position = self.position(log.len());
        position.checked_sub(1).and_then(|index| log.get(index))
    }
}
