use super::*;
use crate::log::Origin;
use crate::placement::{Author, Cell, Color, Placement};

fn log_of(len: u32) -> PlacementLog {
    let mut log = PlacementLog::new();
    for i in 0..len {
        log.append(
            Placement::new(Cell::new(i, 0), Color::BLACK, Author::named("a"), None),
            Origin::Bulk,
        );
    }
    log
}

#[test]
fn default_is_live() {
    let cursor = HistoryCursor::new();
    assert!(cursor.is_live());
    assert_eq!(cursor.mode(), CursorMode::Live);
}

#[test]
fn live_tracks_log_length() {
    let cursor = HistoryCursor::new();
    assert_eq!(cursor.position(0), 0);
    assert_eq!(cursor.position(17), 17);
}

#[test]
fn scrubbing_pins_position_as_log_grows() {
    let mut cursor = HistoryCursor::new();
    assert_eq!(cursor.scrub_to(3, 10), 3);
    assert_eq!(cursor.mode(), CursorMode::Scrubbing(3));
    assert_eq!(cursor.position(11), 3);
    assert_eq!(cursor.position(500), 3);
}

#[test]
fn scrubbing_to_the_end_is_live() {
    let mut cursor = HistoryCursor::new();
    cursor.scrub_to(3, 10);
    assert_eq!(cursor.scrub_to(10, 10), 10);
    assert!(cursor.is_live());
    assert_eq!(cursor.scrub_to(99, 10), 10);
    assert!(cursor.is_live());
}

#[test]
fn scrub_to_zero_is_an_empty_prefix() {
    let mut cursor = HistoryCursor::new();
    assert_eq!(cursor.scrub_to(0, 5), 0);
    assert_eq!(cursor.mode(), CursorMode::Scrubbing(0));
}

#[test]
fn pin_freezes_the_live_edge() {
    let mut cursor = HistoryCursor::new();
    assert_eq!(cursor.pin(4), 4);
    assert!(!cursor.is_live());
    assert_eq!(cursor.position(6), 4);
    assert_eq!(cursor.scrub_to(6, 6), 6);
    assert!(cursor.is_live());
}

#[test]
fn pin_while_scrubbing_keeps_position() {
    let mut cursor = HistoryCursor::new();
    cursor.scrub_to(2, 9);
    assert_eq!(cursor.pin(9), 2);
    assert_eq!(cursor.mode(), CursorMode::Scrubbing(2));
}

#[test]
fn reset_to_live_reports_change() {
    let mut cursor = HistoryCursor::new();
    assert!(!cursor.reset_to_live());
    cursor.scrub_to(1, 4);
    assert!(cursor.reset_to_live());
    assert_eq!(cursor.position(4), 4);
}

#[test]
fn label_entry_is_last_inside_prefix() {
    let log = log_of(4);
    let mut cursor = HistoryCursor::new();
    assert_eq!(cursor.label_entry(&log).map(|e| e.placement.cell), Some(Cell::new(3, 0)));
    cursor.scrub_to(2, log.len());
    assert_eq!(cursor.label_entry(&log).map(|e| e.placement.cell), Some(Cell::new(1, 0)));
    cursor.scrub_to(0, log.len());
    assert!(cursor.label_entry(&log).is_none());
}
