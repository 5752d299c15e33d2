//! Fixed board configuration.
//!
//! Board dimensions are not negotiated at runtime; the host builds one
//! [`BoardConfig`] at startup and hands it to the engine.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};
use crate::placement::{Cell, Color};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("board dimensions must be non-zero (got {width}x{height})")]
    EmptyBoard { width: u32, height: u32 },
    #[error("board of {width}x{height} cells does not fit in memory on this target")]
    TooLarge { width: u32, height: u32 },
    #[error("invalid scale range {min}..={max}")]
    InvalidScaleRange { min: f64, max: f64 },
    #[error("checkpoint interval must be non-zero")]
    ZeroCheckpointInterval,
}

/// Board dimensions and engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Substitute for missing or malformed placement colors.
    pub default_color: Color,
    /// Smallest zoom in screen pixels per cell.
    pub min_scale: f64,
    /// Largest zoom in screen pixels per cell.
    pub max_scale: f64,
    /// Log entries between cached snapshot checkpoints.
    pub checkpoint_interval: usize,
}

impl BoardConfig {
    /// Create a configuration for a `width` × `height` board with default tuning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBoard`] for a zero dimension and
    /// [`ConfigError::TooLarge`] when the cell count overflows `usize`.
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyBoard { width, height });
        }
        if usize::try_from(u64::from(width) * u64::from(height)).is_err() {
            return Err(ConfigError::TooLarge { width, height });
        }
        Ok(Self {
            width,
            height,
            default_color: Color::WHITE,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        })
    }

    /// Override the zoom limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScaleRange`] unless `0 < min <= max` and both are finite.
    pub fn with_scale_range(mut self, min: f64, max: f64) -> Result<Self, ConfigError> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::InvalidScaleRange { min, max });
        }
        self.min_scale = min;
        self.max_scale = max;
        Ok(self)
    }

    /// Override the snapshot checkpoint interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCheckpointInterval`] for zero.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Result<Self, ConfigError> {
        if interval == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        self.checkpoint_interval = interval;
        Ok(self)
    }

    #[must_use]
    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    /// Number of cells on the board.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The cell at `(x, y)`, or `None` when it lies outside the board.
    #[must_use]
    pub fn cell_at(&self, x: i64, y: i64) -> Option<Cell> {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return None;
        };
        (x < self.width && y < self.height).then_some(Cell { x, y })
    }
}
