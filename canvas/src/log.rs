//! The placement log: the single source of truth for what was placed, in what order.
//!
//! Entries are only ever appended. Rolling back a speculative local placement
//! marks its entry retracted (a tombstone) instead of removing it, so indices
//! held by the history cursor, the submission queue, and snapshot checkpoints
//! stay valid while realtime events keep arriving behind it.

#[cfg(test)]
#[path = "log_test.rs"]
mod log_test;

use std::ops::Range;

use crate::placement::{Author, Cell, Placement};

/// Where a log entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Delivered by the initial bulk load.
    Bulk,
    /// Pushed by the realtime channel.
    Realtime,
    /// Appended optimistically for a local submission.
    Local,
}

/// A placement plus its bookkeeping in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub placement: Placement,
    pub origin: Origin,
    retracted: bool,
}

impl LogEntry {
    #[must_use]
    pub fn is_retracted(&self) -> bool {
        self.retracted
    }

    /// Whether this entry contributes to a view restricted to `filter`.
    #[must_use]
    pub fn is_visible_to(&self, filter: Option<&Author>) -> bool {
        !self.retracted && filter.is_none_or(|author| *author == self.placement.author)
    }
}

/// Append-only, insertion-ordered sequence of placements.
#[derive(Debug, Clone, Default)]
pub struct PlacementLog {
    entries: Vec<LogEntry>,
    retracted: usize,
}

impl PlacementLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one placement and return its index.
    pub fn append(&mut self, placement: Placement, origin: Origin) -> usize {
        self.entries.push(LogEntry {
            placement,
            origin,
            retracted: false,
        });
        self.entries.len() - 1
    }

    /// Append a batch in delivery order and return the index range it occupies.
    pub fn extend<I>(&mut self, placements: I, origin: Origin) -> Range<usize>
    where
        I: IntoIterator<Item = Placement>,
    {
        let start = self.entries.len();
        self.entries.extend(placements.into_iter().map(|placement| LogEntry {
            placement,
            origin,
            retracted: false,
        }));
        start..self.entries.len()
    }

    /// Number of entries, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tombstoned entries.
    #[must_use]
    pub fn retracted_count(&self) -> usize {
        self.retracted
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// The first `prefix` entries, clamped to the log length.
    #[must_use]
    pub fn prefix(&self, prefix: usize) -> &[LogEntry] {
        &self.entries[..prefix.min(self.entries.len())]
    }

    /// Tombstone the entry at `index`.
    ///
    /// Returns the retracted placement, or `None` if the index is out of range
    /// or the entry was already retracted.
    pub fn retract(&mut self, index: usize) -> Option<&Placement> {
        let entry = self.entries.get_mut(index)?;
        if entry.retracted {
            return None;
        }
        entry.retracted = true;
        self.retracted += 1;
        Some(&entry.placement)
    }

    /// Most recent visible placement at `cell` within `[0, prefix)`.
    #[must_use]
    pub fn latest_at(&self, cell: Cell, prefix: usize, filter: Option<&Author>) -> Option<(usize, &Placement)> {
        self.prefix(prefix)
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| entry.placement.cell == cell && entry.is_visible_to(filter))
            .map(|(index, entry)| (index, &entry.placement))
    }
}
