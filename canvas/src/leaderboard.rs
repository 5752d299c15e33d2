//! Per-author placement counts for a log prefix.

#[cfg(test)]
#[path = "leaderboard_test.rs"]
mod leaderboard_test;

use std::collections::HashMap;

use crate::log::PlacementLog;
use crate::placement::Author;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// 1-based position in the unfiltered ranking.
    pub rank: usize,
    pub author: Author,
    pub count: usize,
}

/// Ranked counts for one prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leaderboard {
    /// Rows ordered by count descending, ties by first appearance.
    pub standings: Vec<Standing>,
    /// Visible placements in the prefix (tombstones excluded).
    pub total: usize,
}

impl Leaderboard {
    /// Rows ranked within the first `n` places.
    #[must_use]
    pub fn top(&self, n: usize) -> &[Standing] {
        let end = self.standings.partition_point(|s| s.rank <= n);
        &self.standings[..end]
    }

    /// The author at `rank` (1-based), if present.
    #[must_use]
    pub fn author_at(&self, rank: usize) -> Option<&Author> {
        self.standings.iter().find(|s| s.rank == rank).map(|s| &s.author)
    }

    /// Percentage of the prefix placed by this row's author.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share_percent(&self, standing: &Standing) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        standing.count as f64 / self.total as f64 * 100.0
    }
}

/// Count placements per author in `[0, prefix)`.
///
/// Ranking always covers every author. With a filter, only the filtered
/// author's row is returned, keeping its global rank.
#[must_use]
pub fn aggregate(log: &PlacementLog, prefix: usize, filter: Option<&Author>) -> Leaderboard {
    let mut order: Vec<(Author, usize)> = Vec::new();
    let mut slots: HashMap<&Author, usize> = HashMap::new();
    let mut total = 0;

    for entry in log.prefix(prefix) {
        if entry.is_retracted() {
            continue;
        }
        total += 1;
        let author = &entry.placement.author;
        match slots.get(author) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                slots.insert(author, order.len());
                order.push((author.clone(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let standings = order
        .into_iter()
        .enumerate()
        .map(|(i, (author, count))| Standing {
            rank: i + 1,
            author,
            count,
        })
        .filter(|s| filter.is_none_or(|f| *f == s.author))
        .collect();

    Leaderboard { standings, total }
}
