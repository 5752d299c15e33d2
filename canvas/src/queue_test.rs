use super::*;
use crate::consts::ECHO_TIMEOUT_MS;
use crate::placement::{Author, Cell, Color};

fn place(x: u32, y: u32, hex: &str, author: &str) -> Placement {
    Placement::new(
        Cell::new(x, y),
        Color::parse(hex).unwrap(),
        Author::named(author),
        None,
    )
}

fn visible(log: &PlacementLog) -> usize {
    log.len() - log.retracted_count()
}

// =============================================================
// submit
// =============================================================

#[test]
fn submit_appends_speculative_entry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let dispatch = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();

    assert_eq!(dispatch.log_index, 0);
    assert_eq!(log.get(0).map(|e| e.origin), Some(Origin::Local));
    let pending = queue.get(dispatch.id).unwrap();
    assert_eq!(pending.state, SubmissionState::InFlight);
    assert_eq!(pending.log_index, Some(0));
    assert_eq!(queue.stats().submitted, 1);
}

#[test]
fn duplicate_while_in_flight_is_a_no_op() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    // The speculative entry makes the cell already show the assignment.
    assert_eq!(
        queue.submit(&mut log, place(1, 1, "FF0000", "alice")),
        Err(SubmitError::Unchanged)
    );
    assert_eq!(log.len(), 1);
    assert_eq!(queue.len(), 1);
}

#[test]
fn duplicate_while_waiting_for_retry_is_a_no_op() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(0, 0, "0000FF", "carol")).unwrap();
    queue
        .resolve(&mut log, d.id, &SubmitResponse::RateLimited { retry_after_secs: 10 }, 0)
        .unwrap();
    assert_eq!(
        queue.submit(&mut log, place(0, 0, "0000FF", "carol")),
        Err(SubmitError::Duplicate)
    );
    assert_eq!(log.len(), 1);
}

#[test]
fn unchanged_cell_is_a_no_op() {
    let mut log = PlacementLog::new();
    log.append(place(2, 2, "00FF00", "bob"), Origin::Bulk);
    let mut queue = SubmissionQueue::new();
    assert_eq!(
        queue.submit(&mut log, place(2, 2, "00FF00", "bob")),
        Err(SubmitError::Unchanged)
    );
    // A different author painting the same color is a real change.
    assert!(queue.submit(&mut log, place(2, 2, "00FF00", "alice")).is_ok());
}

#[test]
fn newer_submission_supersedes_older_for_same_cell() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let first = queue.submit(&mut log, place(3, 3, "FF0000", "alice")).unwrap();
    let second = queue.submit(&mut log, place(3, 3, "00FF00", "alice")).unwrap();

    assert!(queue.get(first.id).unwrap().superseded);
    assert!(!queue.get(second.id).unwrap().superseded);

    let resolution = queue
        .resolve(&mut log, first.id, &SubmitResponse::RateLimited { retry_after_secs: 1 }, 0)
        .unwrap();
    assert!(matches!(
        resolution,
        Resolution::RateLimited {
            retracted: Some(0),
            retry_at_ms: None,
            ..
        }
    ));
    assert!(queue.get(first.id).is_none());
    assert!(queue.poll(&mut log, 10_000).is_empty());
}

#[test]
fn superseding_drops_a_queued_retry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let first = queue.submit(&mut log, place(0, 0, "FF0000", "a")).unwrap();
    queue
        .resolve(&mut log, first.id, &SubmitResponse::RateLimited { retry_after_secs: 1 }, 0)
        .unwrap();
    queue.submit(&mut log, place(0, 0, "00FF00", "a")).unwrap();
    assert!(queue.get(first.id).is_none());
    assert_eq!(queue.next_retry_at(), None);
}

#[test]
fn silent_errors() {
    assert!(SubmitError::Unchanged.is_silent());
    assert!(SubmitError::Duplicate.is_silent());
    assert!(!SubmitError::NotInteractive.is_silent());
    assert!(!SubmitError::UnknownSubmission(SubmissionId(1)).is_silent());
}

// =============================================================
// resolve
// =============================================================

#[test]
fn ok_marks_acked_and_keeps_entry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    assert_eq!(
        queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0),
        Ok(Resolution::Acked)
    );
    assert_eq!(queue.get(d.id).unwrap().state, SubmissionState::Acked);
    assert_eq!(visible(&log), 1);
    assert_eq!(queue.stats().acknowledged, 1);
}

#[test]
fn resolve_unknown_id_errors() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    assert_eq!(
        queue.resolve(&mut log, SubmissionId(42), &SubmitResponse::Ok, 0),
        Err(SubmitError::UnknownSubmission(SubmissionId(42)))
    );
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0).unwrap();
    // A second answer for an acknowledged submission is not accepted.
    assert!(queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0).is_err());
}

#[test]
fn rate_limit_retracts_and_schedules_one_retry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(0, 0, "0000FF", "carol")).unwrap();
    let resolution = queue
        .resolve(&mut log, d.id, &SubmitResponse::RateLimited { retry_after_secs: 10 }, 1_000)
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::RateLimited {
            retracted: Some(0),
            wait_secs: 10,
            retry_at_ms: Some(11_000),
        }
    );
    assert!(log.get(0).unwrap().is_retracted());
    assert_eq!(visible(&log), 0);
    assert_eq!(queue.next_retry_at(), Some(11_000));

    assert!(queue.poll(&mut log, 10_999).is_empty());
    let outcomes = queue.poll(&mut log, 11_000);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], RetryOutcome::Dispatched(retry) if retry.id == d.id && retry.log_index == 1));
    assert!(queue.poll(&mut log, 50_000).is_empty());
    assert_eq!(queue.stats().retried, 1);
    assert_eq!(visible(&log), 1);
}

#[test]
fn repeated_rate_limits_retry_once_each() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(0, 0, "0000FF", "carol")).unwrap();
    let limited = SubmitResponse::RateLimited { retry_after_secs: 2 };

    queue.resolve(&mut log, d.id, &limited, 0).unwrap();
    assert_eq!(queue.poll(&mut log, 2_000).len(), 1);
    queue.resolve(&mut log, d.id, &limited, 2_000).unwrap();
    // Same fixed delay again, no backoff.
    assert_eq!(queue.next_retry_at(), Some(4_000));
    assert_eq!(queue.poll(&mut log, 4_000).len(), 1);
    assert_eq!(visible(&log), 1);
    assert_eq!(log.retracted_count(), 2);
}

#[test]
fn retry_is_dropped_when_cell_already_matches() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(0, 0, "0000FF", "carol")).unwrap();
    queue
        .resolve(&mut log, d.id, &SubmitResponse::RateLimited { retry_after_secs: 1 }, 0)
        .unwrap();
    log.append(place(0, 0, "0000FF", "carol"), Origin::Realtime);

    let outcomes = queue.poll(&mut log, 1_000);
    assert_eq!(
        outcomes,
        vec![RetryOutcome::Dropped {
            id: d.id,
            reason: SubmitError::Unchanged
        }]
    );
    assert!(queue.is_empty());
}

#[test]
fn error_retracts_without_retry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 2, "123456", "dave")).unwrap();
    let resolution = queue
        .resolve(
            &mut log,
            d.id,
            &SubmitResponse::Error {
                message: "banned".to_owned(),
            },
            0,
        )
        .unwrap();

    let Resolution::Failed {
        retracted,
        submission,
        message,
    } = resolution
    else {
        panic!("expected failure");
    };
    assert_eq!(retracted, Some(0));
    assert_eq!(submission.state, SubmissionState::Rejected);
    assert_eq!(message, "banned");
    assert!(queue.is_empty());
    assert_eq!(queue.stats().rejected, 1);
    assert!(queue.poll(&mut log, i64::MAX).is_empty());
}

// =============================================================
// reconcile
// =============================================================

#[test]
fn echo_after_ack_tombstones_the_echo() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0).unwrap();

    let echo = log.append(place(1, 1, "FF0000", "alice"), Origin::Realtime);
    assert_eq!(queue.reconcile(&mut log, echo), Some(echo));
    assert!(queue.is_empty());
    assert_eq!(visible(&log), 1);
    assert!(!log.get(0).unwrap().is_retracted());
}

#[test]
fn echo_before_ack_removes_on_ack() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();

    let echo = log.append(place(1, 1, "FF0000", "alice"), Origin::Realtime);
    assert_eq!(queue.reconcile(&mut log, echo), Some(echo));
    assert_eq!(queue.len(), 1);

    queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0).unwrap();
    assert!(queue.is_empty());
    assert_eq!(visible(&log), 1);
}

#[test]
fn echo_after_intervening_placement_tombstones_speculative_entry() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 0).unwrap();
    log.append(place(1, 1, "00FF00", "bob"), Origin::Realtime);

    let echo = log.append(place(1, 1, "FF0000", "alice"), Origin::Realtime);
    assert_eq!(queue.reconcile(&mut log, echo), Some(0));
    assert!(queue.is_empty());
    let (latest, _) = log.latest_at(Cell::new(1, 1), log.len(), None).unwrap();
    assert_eq!(latest, echo);
}

#[test]
fn late_failure_after_echo_counts_as_acknowledged() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    let echo = log.append(place(1, 1, "FF0000", "alice"), Origin::Realtime);
    queue.reconcile(&mut log, echo);

    let resolution = queue
        .resolve(&mut log, d.id, &SubmitResponse::RateLimited { retry_after_secs: 5 }, 0)
        .unwrap();
    assert_eq!(resolution, Resolution::Acked);
    assert!(queue.is_empty());
    assert_eq!(visible(&log), 1);
    assert_eq!(queue.next_retry_at(), None);
}

#[test]
fn unrelated_realtime_placement_does_not_reconcile() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    let other_author = log.append(place(1, 1, "FF0000", "bob"), Origin::Realtime);
    let other_color = log.append(place(1, 1, "00FF00", "alice"), Origin::Realtime);
    assert_eq!(queue.reconcile(&mut log, other_author), None);
    assert_eq!(queue.reconcile(&mut log, other_color), None);
    assert_eq!(queue.reconcile(&mut log, 99), None);
    assert_eq!(log.retracted_count(), 0);
}

#[test]
fn acked_entry_without_echo_expires() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let d = queue.submit(&mut log, place(1, 1, "FF0000", "alice")).unwrap();
    queue.resolve(&mut log, d.id, &SubmitResponse::Ok, 1_000).unwrap();

    assert!(queue.poll(&mut log, 1_000 + ECHO_TIMEOUT_MS - 1).is_empty());
    assert_eq!(queue.len(), 1);
    assert!(queue.poll(&mut log, 1_000 + ECHO_TIMEOUT_MS).is_empty());
    assert!(queue.is_empty());
    assert_eq!(visible(&log), 1);
}

// =============================================================
// wire request
// =============================================================

#[test]
fn dispatch_request_carries_placement_fields() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let dispatch = queue.submit(&mut log, place(4, 9, "00ff7f", "alice")).unwrap();

    let request = dispatch.request(1_714_564_800_000).unwrap();
    assert_eq!((request.x, request.y), (4, 9));
    assert_eq!(request.c, "00FF7F");
    assert_eq!(request.p, "alice");
    assert_eq!(frames::parse_timestamp(&request.t), Some(1_714_564_800_000));
}

#[test]
fn dispatch_request_prefers_placement_timestamp() {
    let mut log = PlacementLog::new();
    let mut queue = SubmissionQueue::new();
    let mut placement = place(0, 0, "000000", "bob");
    placement.ts = Some(1_000);
    let dispatch = queue.submit(&mut log, placement).unwrap();

    let request = dispatch.request(99_000).unwrap();
    assert_eq!(frames::parse_timestamp(&request.t), Some(1_000));
}
