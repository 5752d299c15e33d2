#![allow(clippy::float_cmp)]

use super::*;
use crate::log::Origin;
use crate::placement::{Cell, Color, Placement};

fn log_by(authors: &[&str]) -> PlacementLog {
    let mut log = PlacementLog::new();
    for (i, author) in authors.iter().enumerate() {
        let x = u32::try_from(i).unwrap_or(0);
        log.append(
            Placement::new(Cell::new(x, 0), Color::BLACK, Author::named(author), None),
            Origin::Bulk,
        );
    }
    log
}

fn rows(board: &Leaderboard) -> Vec<(usize, String, usize)> {
    board
        .standings
        .iter()
        .map(|s| (s.rank, s.author.to_string(), s.count))
        .collect()
}

#[test]
fn empty_prefix_is_empty() {
    let board = aggregate(&log_by(&["a", "b"]), 0, None);
    assert!(board.standings.is_empty());
    assert_eq!(board.total, 0);
}

#[test]
fn counts_sorted_descending() {
    let board = aggregate(&log_by(&["a", "b", "b", "c", "b", "c"]), 6, None);
    assert_eq!(
        rows(&board),
        vec![
            (1, "b".to_owned(), 3),
            (2, "c".to_owned(), 2),
            (3, "a".to_owned(), 1)
        ]
    );
    assert_eq!(board.total, 6);
}

#[test]
fn ties_break_by_first_seen() {
    let board = aggregate(&log_by(&["z", "y", "x", "x", "y", "z"]), 6, None);
    let names: Vec<_> = board.standings.iter().map(|s| s.author.to_string()).collect();
    assert_eq!(names, vec!["z", "y", "x"]);
}

#[test]
fn prefix_limits_counting() {
    let board = aggregate(&log_by(&["a", "b", "b"]), 2, None);
    assert_eq!(rows(&board), vec![(1, "a".to_owned(), 1), (2, "b".to_owned(), 1)]);
}

#[test]
fn tombstones_are_not_counted() {
    let mut log = log_by(&["a", "b", "b"]);
    log.retract(1);
    let board = aggregate(&log, 3, None);
    assert_eq!(board.total, 2);
    assert_eq!(rows(&board), vec![(1, "a".to_owned(), 1), (2, "b".to_owned(), 1)]);
}

#[test]
fn filter_keeps_global_rank() {
    let log = log_by(&["a", "b", "b", "c"]);
    let c = Author::named("c");
    let board = aggregate(&log, 4, Some(&c));
    assert_eq!(rows(&board), vec![(3, "c".to_owned(), 1)]);
    assert_eq!(board.total, 4);
}

#[test]
fn anonymous_authors_group_together() {
    let mut log = PlacementLog::new();
    for raw in [None, Some(""), Some("Anonymous")] {
        log.append(
            Placement::new(Cell::new(0, 0), Color::BLACK, Author::new(raw), None),
            Origin::Realtime,
        );
    }
    let board = aggregate(&log, 3, None);
    assert_eq!(board.standings.len(), 1);
    assert_eq!(board.standings[0].count, 3);
}

#[test]
fn top_truncates_by_rank() {
    let board = aggregate(&log_by(&["a", "b", "c", "d"]), 4, None);
    assert_eq!(board.top(2).len(), 2);
    assert_eq!(board.top(10).len(), 4);
    assert!(board.top(0).is_empty());
}

#[test]
fn author_at_rank() {
    let board = aggregate(&log_by(&["a", "b", "b"]), 3, None);
    assert_eq!(board.author_at(1).map(Author::as_str), Some("b"));
    assert_eq!(board.author_at(2).map(Author::as_str), Some("a"));
    assert!(board.author_at(3).is_none());
}

#[test]
fn share_percent_of_total() {
    let board = aggregate(&log_by(&["a", "b", "b", "b"]), 4, None);
    assert_eq!(board.share_percent(&board.standings[0]), 75.0);
    assert_eq!(board.share_percent(&board.standings[1]), 25.0);
    assert_eq!(Leaderboard::default().share_percent(&board.standings[0]), 0.0);
}
