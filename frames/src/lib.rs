//! Shared wire model for the pixel canvas transport.
//!
//! This crate owns the representation used by both the engine (`canvas`) and
//! the native host (`cli`): placement records as they arrive from bulk load and
//! the realtime channel, the tagged realtime envelope, and the submission
//! request/response pair. Payloads are JSON; records keep the server's short
//! field names (`c`, `p`, `t`).
//!
//! Nothing here validates board bounds or colors. Records are decoded as-is and
//! validated by the engine at the boundary.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Retry delay assumed when a 429 response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Error returned by the decode helpers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload was not valid JSON for the expected shape.
    #[error("failed to decode payload: {0}")]
    Json(#[from] serde_json::Error),
    /// A millisecond timestamp was outside the representable range.
    #[error("timestamp out of range: {0}")]
    TimestampRange(i64),
    /// A timestamp could not be formatted.
    #[error("failed to format timestamp: {0}")]
    TimestampFormat(#[from] time::error::Format),
}

/// One placement as delivered by the server.
///
/// Coordinates are signed so out-of-range values survive decoding and can be
/// rejected by the engine instead of failing the whole batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRecord {
    pub x: i64,
    pub y: i64,
    /// Six hex digits, no leading `#`. May be missing or malformed.
    #[serde(rename = "c", default)]
    pub color: Option<String>,
    /// Display name of the author. Empty or missing means anonymous.
    #[serde(rename = "p", default)]
    pub author: Option<String>,
    /// ISO-8601 timestamp assigned by the server.
    #[serde(rename = "t", default)]
    pub timestamp: Option<String>,
}

impl PixelRecord {
    #[must_use]
    pub fn new(x: i64, y: i64, color: &str, author: &str) -> Self {
        Self {
            x,
            y,
            color: Some(color.to_owned()),
            author: Some(author.to_owned()),
            timestamp: None,
        }
    }

    /// Parsed timestamp in milliseconds since the Unix epoch, if present and valid.
    #[must_use]
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// A message on the realtime channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Envelope {
    /// A pixel was placed somewhere on the board.
    Placement(PixelRecord),
    /// Admin notice addressed to one username.
    Broadcast { username: String, info: String },
    /// Chat line. Carried for completeness; the engine does not consume it.
    Chat { id: String, username: String, message: String },
    /// Number of connected users.
    UserCount(u32),
}

/// Outbound placement request for the submission channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub x: u32,
    pub y: u32,
    pub c: String,
    pub p: String,
    pub t: String,
}

/// Outcome of a submission as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    Ok,
    RateLimited { retry_after_secs: u64 },
    Error { message: String },
}

impl SubmitResponse {
    /// Map an HTTP response onto a submission outcome.
    ///
    /// 2xx is success, 429 is a rate limit (with `Retry-After` in whole
    /// seconds), anything else is an error carrying the body text or the
    /// status code when the body is blank.
    #[must_use]
    pub fn from_http(status: u16, retry_after: Option<&str>, body: &str) -> Self {
        if (200..300).contains(&status) {
            return Self::Ok;
        }
        if status == 429 {
            let retry_after_secs = retry_after
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Self::RateLimited { retry_after_secs };
        }
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            format!("HTTP {status}")
        } else {
            trimmed.to_owned()
        };
        Self::Error { message }
    }
}

/// Decode one realtime message.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON or an unknown `type` tag.
pub fn decode_envelope(text: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode one realtime message.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, CodecError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Decode a bulk-load body (a JSON array of records, in server order).
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the body is not an array of records.
pub fn decode_board(bytes: &[u8]) -> Result<Vec<PixelRecord>, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Parse a server timestamp into milliseconds since the Unix epoch.
///
/// Accepts RFC 3339 and ISO-8601 with or without an offset; values without an
/// offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let parsed = OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(raw, &Iso8601::DEFAULT))
        .or_else(|_| PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc));
    let dt = parsed.ok()?;
    i64::try_from(dt.unix_timestamp_nanos() / 1_000_000).ok()
}

/// Format milliseconds since the Unix epoch as RFC 3339.
///
/// # Errors
///
/// Returns [`CodecError::TimestampRange`] for values the calendar cannot hold.
pub fn format_timestamp(ms: i64) -> Result<String, CodecError> {
    let nanos = i128::from(ms) * 1_000_000;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| CodecError::TimestampRange(ms))?;
    Ok(dt.format(&Rfc3339)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
