//! Optimistic submission queue.
//!
//! A submission appends a speculative `Local` entry to the log right away and
//! asks the host to dispatch it. The server's answer either acknowledges it,
//! rate-limits it (tombstone now, one retry later), or rejects it (tombstone,
//! no retry). When the realtime echo of a submission arrives, exactly one of
//! the two copies is tombstoned: the echo itself, unless another placement
//! landed on the cell in between, in which case the speculative entry goes so
//! the server-ordered copy wins.
//!
//! The queue never reads a clock. Every time-dependent call takes `now_ms`.

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;

use std::fmt;

use frames::{CodecError, SubmitRequest, SubmitResponse};
use tracing::{debug, warn};

use crate::consts::ECHO_TIMEOUT_MS;
use crate::log::{Origin, PlacementLog};
use crate::placement::Placement;

/// Identifies one submission across its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Waiting for its retry time after a rate limit. No log entry.
    Queued,
    /// Dispatched; the speculative entry is in the log.
    InFlight,
    /// Accepted by the server; waiting for the realtime echo.
    Acked,
    /// Terminally failed. Only seen on values handed back to the caller.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub id: SubmissionId,
    pub placement: Placement,
    /// Index of the current speculative entry, if one is in the log.
    pub log_index: Option<usize>,
    pub state: SubmissionState,
    pub retry_at_ms: Option<i64>,
    /// A newer submission for the same cell exists; this one never retries.
    pub superseded: bool,
    /// The realtime echo has been reconciled.
    pub echoed: bool,
    /// Acknowledged entries whose echo never arrives are dropped after this.
    pub echo_deadline_ms: Option<i64>,
}

impl PendingSubmission {
    /// Waiting on the server or on a retry.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        matches!(self.state, SubmissionState::Queued | SubmissionState::InFlight)
    }
}

/// Why a submission did not produce a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("cell already has that color from that author")]
    Unchanged,
    #[error("an identical submission is already outstanding")]
    Duplicate,
    #[error("the board is not interactive yet")]
    NotInteractive,
    #[error("no in-flight submission {0}")]
    UnknownSubmission(SubmissionId),
}

impl SubmitError {
    /// Errors the host should swallow without telling the user.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Unchanged | Self::Duplicate)
    }
}

/// A submission ready to hand to the submission channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub id: SubmissionId,
    pub placement: Placement,
    pub log_index: usize,
}

impl Dispatch {
    /// Wire request for this submission. A placement with no timestamp is sent
    /// with `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TimestampRange`] if the timestamp cannot be formatted.
    pub fn request(&self, now_ms: i64) -> Result<SubmitRequest, CodecError> {
        let p = &self.placement;
        Ok(SubmitRequest {
            x: p.cell.x,
            y: p.cell.y,
            c: p.color.to_hex(),
            p: p.author.as_str().to_owned(),
            t: frames::format_timestamp(p.ts.unwrap_or(now_ms))?,
        })
    }
}

/// What a server response did to the queue and the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Acked,
    /// Speculative entry tombstoned. `retry_at_ms` is `None` when superseded.
    RateLimited {
        retracted: Option<usize>,
        wait_secs: u64,
        retry_at_ms: Option<i64>,
    },
    /// Speculative entry tombstoned; the submission is gone.
    Failed {
        retracted: Option<usize>,
        submission: PendingSubmission,
        message: String,
    },
}

/// Result of a due retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Dispatched(Dispatch),
    /// The live log already shows the requested assignment.
    Dropped { id: SubmissionId, reason: SubmitError },
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub submitted: u64,
    pub acknowledged: u64,
    pub rejected: u64,
    pub retried: u64,
}

#[derive(Debug, Default)]
pub struct SubmissionQueue {
    next_id: u64,
    pending: Vec<PendingSubmission>,
    stats: QueueStats,
}

impl SubmissionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: SubmissionId) -> Option<&PendingSubmission> {
        self.pending.iter().find(|p| p.id == id)
    }

    /// Earliest scheduled retry, for hosts that arm a timer.
    #[must_use]
    pub fn next_retry_at(&self) -> Option<i64> {
        self.pending
            .iter()
            .filter(|p| p.state == SubmissionState::Queued && !p.superseded)
            .filter_map(|p| p.retry_at_ms)
            .min()
    }

    /// Optimistically append `placement` and return it for dispatch.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Unchanged`] if the live log already shows this
    ///   color from this author at the cell.
    /// - [`SubmitError::Duplicate`] if an identical submission is outstanding.
    pub fn submit(&mut self, log: &mut PlacementLog, placement: Placement) -> Result<Dispatch, SubmitError> {
        if is_unchanged(log, &placement) {
            return Err(SubmitError::Unchanged);
        }
        if self
            .pending
            .iter()
            .any(|p| p.is_outstanding() && !p.superseded && p.placement.same_assignment(&placement))
        {
            return Err(SubmitError::Duplicate);
        }

        self.supersede(&placement);

        self.next_id += 1;
        let id = SubmissionId(self.next_id);
        let log_index = log.append(placement.clone(), Origin::Local);
        self.pending.push(PendingSubmission {
            id,
            placement: placement.clone(),
            log_index: Some(log_index),
            state: SubmissionState::InFlight,
            retry_at_ms: None,
            superseded: false,
            echoed: false,
            echo_deadline_ms: None,
        });
        self.stats.submitted += 1;
        debug!(%id, x = placement.cell.x, y = placement.cell.y, "submission dispatched");

        Ok(Dispatch {
            id,
            placement,
            log_index,
        })
    }

    /// Apply the server's answer for an in-flight submission.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::UnknownSubmission`] if `id` is not in flight.
    pub fn resolve(
        &mut self,
        log: &mut PlacementLog,
        id: SubmissionId,
        response: &SubmitResponse,
        now_ms: i64,
    ) -> Result<Resolution, SubmitError> {
        let slot = self
            .pending
            .iter()
            .position(|p| p.id == id && p.state == SubmissionState::InFlight)
            .ok_or(SubmitError::UnknownSubmission(id))?;

        if self.pending[slot].echoed {
            // The realtime channel already carried it; the server placed it.
            self.pending.remove(slot);
            self.stats.acknowledged += 1;
            if *response != SubmitResponse::Ok {
                debug!(%id, ?response, "late failure for an echoed submission ignored");
            }
            return Ok(Resolution::Acked);
        }

        match response {
            SubmitResponse::Ok => {
                self.stats.acknowledged += 1;
                let pending = &mut self.pending[slot];
                pending.state = SubmissionState::Acked;
                pending.echo_deadline_ms = Some(now_ms.saturating_add(ECHO_TIMEOUT_MS));
                Ok(Resolution::Acked)
            }
            SubmitResponse::RateLimited { retry_after_secs } => {
                let retracted = retract_speculative(log, &mut self.pending[slot]);
                let wait_ms = i64::try_from(retry_after_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
                let pending = &mut self.pending[slot];
                let retry_at_ms = if pending.superseded {
                    self.pending.remove(slot);
                    None
                } else {
                    let at = now_ms.saturating_add(wait_ms);
                    pending.state = SubmissionState::Queued;
                    pending.retry_at_ms = Some(at);
                    Some(at)
                };
                warn!(%id, retry_after_secs, "submission rate limited");
                Ok(Resolution::RateLimited {
                    retracted,
                    wait_secs: *retry_after_secs,
                    retry_at_ms,
                })
            }
            SubmitResponse::Error { message } => {
                let retracted = retract_speculative(log, &mut self.pending[slot]);
                let mut submission = self.pending.remove(slot);
                submission.state = SubmissionState::Rejected;
                self.stats.rejected += 1;
                warn!(%id, %message, "submission rejected");
                Ok(Resolution::Failed {
                    retracted,
                    submission,
                    message: message.clone(),
                })
            }
        }
    }

    /// Fire every retry due at `now_ms`.
    ///
    /// Each retry re-checks the live log; if the cell already shows the
    /// requested assignment the submission is dropped instead. Acknowledged
    /// entries past their echo deadline are forgotten; their speculative
    /// entry stays in the log.
    pub fn poll(&mut self, log: &mut PlacementLog, now_ms: i64) -> Vec<RetryOutcome> {
        self.pending.retain(|p| {
            let stale = p.state == SubmissionState::Acked && p.echo_deadline_ms.is_some_and(|at| at <= now_ms);
            if stale {
                debug!(id = %p.id, "echo never arrived; keeping speculative entry");
            }
            !stale
        });

        let mut outcomes = Vec::new();
        let mut slot = 0;
        while slot < self.pending.len() {
            let pending = &self.pending[slot];
            let due = pending.state == SubmissionState::Queued && pending.retry_at_ms.is_some_and(|at| at <= now_ms);
            if !due {
                slot += 1;
                continue;
            }
            if pending.superseded {
                self.pending.remove(slot);
                continue;
            }
            if is_unchanged(log, &pending.placement) {
                let id = pending.id;
                self.pending.remove(slot);
                debug!(%id, "retry no longer needed");
                outcomes.push(RetryOutcome::Dropped {
                    id,
                    reason: SubmitError::Unchanged,
                });
                continue;
            }

            let pending = &mut self.pending[slot];
            let log_index = log.append(pending.placement.clone(), Origin::Local);
            pending.log_index = Some(log_index);
            pending.state = SubmissionState::InFlight;
            pending.retry_at_ms = None;
            self.stats.retried += 1;
            debug!(id = %pending.id, "submission retried");
            outcomes.push(RetryOutcome::Dispatched(Dispatch {
                id: pending.id,
                placement: pending.placement.clone(),
                log_index,
            }));
            slot += 1;
        }
        outcomes
    }

    /// Match the realtime placement at `echo_index` against speculative entries.
    ///
    /// The oldest in-flight or acknowledged submission with the same
    /// assignment is reconciled. The echo is tombstoned when the speculative
    /// entry is still the latest visible placement at the cell; otherwise
    /// another placement landed in between and the speculative entry is
    /// tombstoned instead. Returns the retracted log index.
    pub fn reconcile(&mut self, log: &mut PlacementLog, echo_index: usize) -> Option<usize> {
        let realtime = &log.get(echo_index)?.placement;
        let slot = self.pending.iter().position(|p| {
            matches!(p.state, SubmissionState::InFlight | SubmissionState::Acked)
                && !p.echoed
                && p.log_index.is_some()
                && p.placement.same_assignment(realtime)
        })?;

        let pending = &mut self.pending[slot];
        let speculative = pending.log_index?;
        let overtaken = log
            .latest_at(pending.placement.cell, echo_index, None)
            .is_some_and(|(latest, _)| latest != speculative);
        let retracted = if overtaken {
            pending.log_index = None;
            speculative
        } else {
            echo_index
        };
        pending.echoed = true;
        if pending.state == SubmissionState::Acked {
            self.pending.remove(slot);
        }
        log.retract(retracted).map(|_| retracted)
    }

    /// Outstanding submissions for other assignments at this cell stop retrying.
    fn supersede(&mut self, newer: &Placement) {
        self.pending.retain_mut(|p| {
            if p.placement.cell != newer.cell || !p.is_outstanding() {
                return true;
            }
            p.superseded = true;
            // Nothing left to wait for on a queued retry.
            p.state != SubmissionState::Queued
        });
    }
}

fn is_unchanged(log: &PlacementLog, placement: &Placement) -> bool {
    log.latest_at(placement.cell, log.len(), None)
        .is_some_and(|(_, current)| current.same_assignment(placement))
}

fn retract_speculative(log: &mut PlacementLog, pending: &mut PendingSubmission) -> Option<usize> {
    let index = pending.log_index.take()?;
    log.retract(index).map(|_| index)
}
