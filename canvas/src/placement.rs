//! Placement model: cells, colors, authors, and boundary validation.
//!
//! Everything entering the log passes through [`validate_placement`] (or its
//! wire-facing wrapper [`from_record`]) first. Out-of-bounds coordinates are
//! rejected outright, malformed colors are coerced to the board's default, and
//! empty authors are normalized to the anonymous display name.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use std::fmt;
use std::str::FromStr;

use frames::PixelRecord;

use crate::config::BoardConfig;
use crate::consts::{ANONYMOUS_AUTHOR, MAX_USERNAME_CHARS, RESERVED_USERNAME_MARKER};

/// A board cell. Only constructed for in-bounds coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A 24-bit RGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

/// Error returned when parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color `{0}`: expected six hex digits")]
pub struct ColorError(pub String);

impl Color {
    pub const WHITE: Self = Self(0x00FF_FFFF);
    pub const BLACK: Self = Self(0);

    /// Parse exactly six hex digits (either case, no `#`).
    #[must_use]
    pub fn parse(hex: &str) -> Option<Self> {
        if hex.len() != 6 {
            return None;
        }
        hex.chars()
            .try_fold(0_u32, |acc, c| c.to_digit(16).map(|d| (acc << 4) | d))
            .map(Self)
    }

    #[must_use]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        let [_, r, g, b] = self.0.to_be_bytes();
        (r, g, b)
    }

    /// Upper-case hex without a leading `#`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:06X}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:06X})", self.0)
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim_start_matches('#')).ok_or_else(|| ColorError(s.to_owned()))
    }
}

/// Display name of whoever placed a pixel.
///
/// Empty names become [`ANONYMOUS_AUTHOR`]; the normalized value is what
/// filters and leaderboards compare, so all anonymous placements group together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Author(String);

/// Reasons a username is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("username cannot be longer than {MAX_USERNAME_CHARS} characters")]
    TooLong,
    #[error("'{RESERVED_USERNAME_MARKER}' is not an allowed username")]
    Reserved,
}

impl Author {
    #[must_use]
    pub fn new(raw: Option<&str>) -> Self {
        match raw {
            Some(name) if !name.is_empty() => Self(name.to_owned()),
            _ => Self(ANONYMOUS_AUTHOR.to_owned()),
        }
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::new(Some(name))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_AUTHOR
    }

    /// Case-insensitive comparison, used for addressing admin broadcasts.
    #[must_use]
    pub fn matches_username(&self, username: &str) -> bool {
        self.0.to_lowercase() == username.to_lowercase()
    }

    /// Check a name the local user wants to place under.
    ///
    /// # Errors
    ///
    /// Returns [`UsernameError`] when the name is too long or reserved.
    pub fn validate_username(name: &str) -> Result<(), UsernameError> {
        if name.chars().count() > MAX_USERNAME_CHARS {
            return Err(UsernameError::TooLong);
        }
        if name.to_lowercase().contains(RESERVED_USERNAME_MARKER) {
            return Err(UsernameError::Reserved);
        }
        Ok(())
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded pixel-color assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub cell: Cell,
    pub color: Color,
    pub author: Author,
    /// Milliseconds since the Unix epoch, when known.
    pub ts: Option<i64>,
}

impl Placement {
    #[must_use]
    pub fn new(cell: Cell, color: Color, author: Author, ts: Option<i64>) -> Self {
        Self { cell, color, author, ts }
    }

    /// Whether this placement assigns the same color, by the same author, to the same cell.
    #[must_use]
    pub fn same_assignment(&self, other: &Self) -> bool {
        self.cell == other.cell && self.color == other.color && self.author == other.author
    }
}

/// Validate raw placement input against the board.
///
/// Returns `None` when the coordinates fall outside the board. A missing or
/// malformed color is replaced with the board's default color.
#[must_use]
pub fn validate_placement(
    config: &BoardConfig,
    x: i64,
    y: i64,
    color: Option<&str>,
    author: Option<&str>,
    ts: Option<i64>,
) -> Option<Placement> {
    let cell = config.cell_at(x, y)?;
    let color = color.and_then(Color::parse).unwrap_or(config.default_color);
    Some(Placement::new(cell, color, Author::new(author), ts))
}

/// Validate a wire record.
#[must_use]
pub fn from_record(config: &BoardConfig, record: &PixelRecord) -> Option<Placement> {
    validate_placement(
        config,
        record.x,
        record.y,
        record.color.as_deref(),
        record.author.as_deref(),
        record.timestamp_ms(),
    )
}
