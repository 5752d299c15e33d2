//! Viewport transform: screen pixels to board cells under pan and zoom.
//!
//! `pan_x` / `pan_y` are the screen position (CSS pixels) of the board's
//! top-left corner. `scale` is screen pixels per board cell. The transform
//! itself never clamps cell coordinates; callers validate them against the
//! board. Pan and scale limits are applied by the mutating operations through
//! [`Bounds`].

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::BoardConfig;
use crate::consts::{WHEEL_STEP_DIVISOR, ZOOM_STEP};

/// A point in either screen or board space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Limits the viewport must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Board width in cells.
    pub board_width: f64,
    /// Board height in cells.
    pub board_height: f64,
    /// Visible container width in CSS pixels. Zero until the host lays out.
    pub container_width: f64,
    /// Visible container height in CSS pixels.
    pub container_height: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Bounds {
    #[must_use]
    pub fn for_board(config: &BoardConfig, container_width: f64, container_height: f64) -> Self {
        Self {
            board_width: f64::from(config.width),
            board_height: f64::from(config.height),
            container_width,
            container_height,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
        }
    }

    fn has_container(&self) -> bool {
        self.container_width > 0.0 && self.container_height > 0.0
    }

    fn center(&self) -> Point {
        Point::new(self.container_width * 0.5, self.container_height * 0.5)
    }
}

/// Persisted viewport: `{x, y, scale}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),
    #[error("query parameter `{key}` is not a number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("view values must be finite with a positive scale")]
    OutOfRange,
    #[error("invalid stored view: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewSettings {
    /// Render as URL query parameters (`x=…&y=…&scale=…`).
    ///
    /// Numbers use the shortest representation that parses back to the same
    /// `f64`, so a round trip through the URL is exact.
    #[must_use]
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("x", &self.x.to_string())
            .append_pair("y", &self.y.to_string())
            .append_pair("scale", &self.scale.to_string())
            .finish()
    }

    /// Parse from a query string. A leading `?` and unrelated keys are ignored;
    /// values are percent-decoded, and the first occurrence of a key wins.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] when a key is missing, not a number, or out of range.
    pub fn from_query(query: &str) -> Result<Self, ViewError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let lookup = |key: &'static str| -> Result<f64, ViewError> {
            let raw = form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
                .ok_or(ViewError::MissingParam(key))?;
            raw.trim().parse::<f64>().map_err(|_| ViewError::InvalidNumber {
                key,
                value: raw.into_owned(),
            })
        };
        Self {
            x: lookup("x")?,
            y: lookup("y")?,
            scale: lookup("scale")?,
        }
        .validated()
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ViewError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from storage.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] for malformed JSON or out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ViewError> {
        serde_json::from_str::<Self>(raw)?.validated()
    }

    fn validated(self) -> Result<Self, ViewError> {
        if self.x.is_finite() && self.y.is_finite() && self.scale.is_finite() && self.scale > 0.0 {
            Ok(self)
        } else {
            Err(ViewError::OutOfRange)
        }
    }
}

/// Pan/zoom state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    // --- Pure transforms ---

    /// Convert a screen point to continuous board coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.scale,
            y: (screen.y - self.pan_y) / self.scale,
        }
    }

    /// Convert continuous board coordinates to a screen point.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.pan_x,
            y: world.y * self.scale + self.pan_y,
        }
    }

    /// The cell under a screen point. May lie outside the board.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn screen_to_board(&self, screen: Point) -> (i64, i64) {
        let world = self.screen_to_world(screen);
        (world.x.floor() as i64, world.y.floor() as i64)
    }

    /// Screen position of the center of cell `(x, y)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn board_to_screen(&self, x: i64, y: i64) -> Point {
        self.world_to_screen(Point::new(x as f64 + 0.5, y as f64 + 0.5))
    }

    /// Board coordinates shown at the screen origin.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(-self.pan_x / self.scale, -self.pan_y / self.scale)
    }

    // --- Mutations ---

    /// Zoom to `scale` keeping the board point under `focal` fixed.
    ///
    /// In board units: `origin' = origin + focal × (1/scale − 1/scale')`.
    pub fn zoom_at(&mut self, focal: Point, scale: f64, bounds: &Bounds) {
        let scale = scale.clamp(bounds.min_scale, bounds.max_scale);
        let origin = self.origin();
        let shift = 1.0 / self.scale - 1.0 / scale;
        let new_origin = Point::new(origin.x + focal.x * shift, origin.y + focal.y * shift);
        self.scale = scale;
        self.pan_x = -new_origin.x * scale;
        self.pan_y = -new_origin.y * scale;
        self.clamp_pan(bounds);
    }

    /// One keyboard zoom step in, around the container center.
    pub fn zoom_in(&mut self, bounds: &Bounds) {
        self.zoom_at(bounds.center(), self.scale * ZOOM_STEP.exp(), bounds);
    }

    /// One keyboard zoom step out, around the container center.
    pub fn zoom_out(&mut self, bounds: &Bounds) {
        self.zoom_at(bounds.center(), self.scale * (-ZOOM_STEP).exp(), bounds);
    }

    /// One wheel notch at `focal`. Negative `delta_y` (wheel up) zooms in;
    /// a zero delta (horizontal-only scroll) leaves the view alone.
    pub fn zoom_with_wheel(&mut self, focal: Point, delta_y: f64, bounds: &Bounds) {
        if delta_y == 0.0 {
            return;
        }
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };
        let factor = (direction * ZOOM_STEP / WHEEL_STEP_DIVISOR).exp();
        self.zoom_at(focal, self.scale * factor, bounds);
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64, bounds: &Bounds) {
        self.pan_x += dx;
        self.pan_y += dy;
        self.clamp_pan(bounds);
    }

    /// Keyboard nudge: move the board by half the container per unit direction.
    pub fn nudge(&mut self, dir_x: f64, dir_y: f64, bounds: &Bounds) {
        self.pan_by(
            dir_x * bounds.container_width * 0.5,
            dir_y * bounds.container_height * 0.5,
            bounds,
        );
    }

    /// Keep the visible area within one container size of the board.
    ///
    /// Per axis, `pan ∈ [−extent, container]` where `extent` is the scaled
    /// board size. Skipped until the container has been measured.
    pub fn clamp_pan(&mut self, bounds: &Bounds) {
        if !bounds.has_container() {
            return;
        }
        let extent_x = bounds.board_width * self.scale;
        let extent_y = bounds.board_height * self.scale;
        self.pan_x = self.pan_x.clamp(-extent_x, bounds.container_width);
        self.pan_y = self.pan_y.clamp(-extent_y, bounds.container_height);
    }

    // --- Persistence ---

    #[must_use]
    pub fn settings(&self) -> ViewSettings {
        ViewSettings {
            x: self.pan_x,
            y: self.pan_y,
            scale: self.scale,
        }
    }

    /// Apply stored settings: scale first, then pan, both clamped.
    ///
    /// Restoring the same settings twice yields the same viewport.
    pub fn restore(&mut self, settings: ViewSettings, bounds: &Bounds) {
        self.scale = settings.scale.clamp(bounds.min_scale, bounds.max_scale);
        self.pan_x = settings.x;
        self.pan_y = settings.y;
        self.clamp_pan(bounds);
    }
}
