//! Shared constants for the canvas crate.

// ── Placement ───────────────────────────────────────────────────

/// Display name substituted for an empty or missing author.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Maximum username length in characters.
pub const MAX_USERNAME_CHARS: usize = 16;

/// Substring no username may contain (case-insensitive).
pub const RESERVED_USERNAME_MARKER: &str = "[deleted]";

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom, in screen pixels per board cell.
pub const DEFAULT_MIN_SCALE: f64 = 1.0;

/// Largest zoom, in screen pixels per board cell.
pub const DEFAULT_MAX_SCALE: f64 = 64.0;

/// Logarithmic step for one `+` / `-` zoom.
pub const ZOOM_STEP: f64 = 0.7;

/// Wheel notches are a third of a keyboard zoom step.
pub const WHEEL_STEP_DIVISOR: f64 = 3.0;

// ── Snapshots ───────────────────────────────────────────────────

/// Log entries between cached snapshot checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50_000;

// ── Submissions ─────────────────────────────────────────────────

/// How long an acknowledged submission waits for its realtime echo.
pub const ECHO_TIMEOUT_MS: i64 = 30_000;

// ── Leaderboard ─────────────────────────────────────────────────

/// Rows shown in the leaderboard.
pub const LEADERBOARD_ROWS: usize = 10;

// ── Palette ─────────────────────────────────────────────────────

/// Built-in palette. Slot 0 is overwritten by the user's custom color.
pub const DEFAULT_PALETTE: [&str; 35] = [
    "000000", "FFFFFF", "B9C3CF", "777F8C", "424651", "1F1E26", "000000", "382215", "7C3F20", "C06F37", "FEAD6C",
    "FFD2B1", "FFA4D0", "F14FB4", "E973FF", "A630D2", "531D8C", "242367", "0334BF", "149CFF", "8DF5FF", "01BFA5",
    "16777E", "054523", "18862F", "61E021", "B1FF37", "FFFFA5", "FDE111", "FF9F17", "F66E08", "550022", "99011A",
    "F30F0C", "FF7872",
];
