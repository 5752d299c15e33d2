//! Board snapshots derived from a log prefix.
//!
//! A [`Snapshot`] is the visible color of every cell as of some prefix of the
//! [`PlacementLog`], optionally restricted to one author. Snapshots are never
//! stored durably; they are rebuilt whenever the cursor or filter moves and
//! patched incrementally when a live event lands.
//!
//! [`SnapshotCache`] keeps unfiltered checkpoints every `interval` entries so
//! that scrubbing to an arbitrary prefix only replays the tail after the
//! nearest checkpoint.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use crate::config::BoardConfig;
use crate::log::{LogEntry, PlacementLog};
use crate::placement::{Author, Cell, Color, Placement};

/// Dense per-cell colors. Cells nobody has painted have no color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    cells: Vec<Option<Color>>,
}

impl Snapshot {
    /// An unpainted board.
    #[must_use]
    pub fn empty(config: &BoardConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            cells: vec![None; config.cell_count()],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn slot(&self, cell: Cell) -> Option<usize> {
        (cell.x < self.width && cell.y < self.height).then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Visible color of `cell`, if painted.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<Color> {
        self.slot(cell).and_then(|slot| self.cells[slot])
    }

    /// Overwrite one cell.
    pub fn set(&mut self, cell: Cell, color: Option<Color>) {
        if let Some(slot) = self.slot(cell) {
            self.cells[slot] = color;
        }
    }

    /// Apply one placement on top of this snapshot.
    pub fn apply(&mut self, placement: &Placement) {
        self.set(placement.cell, Some(placement.color));
    }

    /// Painted cells in row-major order.
    pub fn painted(&self) -> impl Iterator<Item = (Cell, Color)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(slot, color)| {
            let color = (*color)?;
            let x = u32::try_from(slot % width).unwrap_or(u32::MAX);
            let y = u32::try_from(slot / width).unwrap_or(u32::MAX);
            Some((Cell { x, y }, color))
        })
    }

    /// Number of painted cells.
    #[must_use]
    pub fn painted_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Replay `entries` on top of `snapshot`, skipping tombstones and entries the
/// filter excludes.
pub fn replay(snapshot: &mut Snapshot, entries: &[LogEntry], filter: Option<&Author>) {
    for entry in entries {
        if entry.is_visible_to(filter) {
            snapshot.apply(&entry.placement);
        }
    }
}

/// Build the snapshot for `[0, prefix)` with one pass over the log.
#[must_use]
pub fn build_snapshot(config: &BoardConfig, log: &PlacementLog, prefix: usize, filter: Option<&Author>) -> Snapshot {
    let mut snapshot = Snapshot::empty(config);
    replay(&mut snapshot, log.prefix(prefix), filter);
    snapshot
}

/// Unfiltered snapshot checkpoints keyed by prefix length.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    interval: usize,
    checkpoints: Vec<(usize, Snapshot)>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            checkpoints: Vec::new(),
        }
    }

    /// Number of cached checkpoints.
    #[must_use]
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Build the snapshot for `[0, prefix)`.
    ///
    /// Unfiltered builds start from the nearest checkpoint at or below
    /// `prefix` and record new checkpoints as they cross interval boundaries.
    /// Filtered builds always scan from the start.
    pub fn build(&mut self, config: &BoardConfig, log: &PlacementLog, prefix: usize, filter: Option<&Author>) -> Snapshot {
        if filter.is_some() {
            return build_snapshot(config, log, prefix, filter);
        }

        let entries = log.prefix(prefix);
        let target = entries.len();
        let (mut pos, mut snapshot) = match self.checkpoints.iter().rev().find(|(at, _)| *at <= target) {
            Some((at, snap)) => (*at, snap.clone()),
            None => (0, Snapshot::empty(config)),
        };

        let mut boundary = (pos / self.interval + 1) * self.interval;
        while boundary <= target {
            replay(&mut snapshot, &entries[pos..boundary], None);
            self.store(boundary, &snapshot);
            pos = boundary;
            boundary += self.interval;
        }
        replay(&mut snapshot, &entries[pos..target], None);
        snapshot
    }

    /// Drop checkpoints that include the entry at `index`.
    pub fn invalidate_from(&mut self, index: usize) {
        self.checkpoints.retain(|(at, _)| *at <= index);
    }

    fn store(&mut self, at: usize, snapshot: &Snapshot) {
        match self.checkpoints.binary_search_by_key(&at, |(p, _)| *p) {
            Ok(_) => {}
            Err(pos) => self.checkpoints.insert(pos, (at, snapshot.clone())),
        }
    }
}
