//! Input model: modifier keys, mouse buttons, key commands, and the pointer gesture state.
//!
//! The host forwards raw DOM events as these types. `Key::command` maps a
//! browser key name onto the board's keyboard shortcuts, and `InputState`
//! tracks a drag-to-pan gesture between pointer-down and pointer-up so a
//! secondary click without movement can act as the color picker.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::placement::Cell;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Any modifier that turns the wheel into palette scrolling.
    #[must_use]
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap). Places pixels.
    Primary,
    /// Middle mouse button. Pans; a click without movement picks a color.
    Middle,
    /// Right mouse button. Same as middle.
    Secondary,
}

impl Button {
    /// Buttons that drag the board around.
    #[must_use]
    pub fn pans(self) -> bool {
        matches!(self, Self::Middle | Self::Secondary)
    }
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`, `"q"`, `"ArrowUp"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// What a key press asks the board to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    /// Clear the author filter and return to Live.
    ResetView,
    /// Select the previous palette slot.
    PreviousColor,
    /// Select the next palette slot.
    NextColor,
    /// Select the custom palette slot.
    CustomColor,
    /// Pan by half the container per unit direction.
    Nudge { dx: f64, dy: f64 },
    ZoomIn,
    ZoomOut,
    /// Toggle the author filter to a leaderboard row (1-based).
    FilterRank(usize),
}

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Map this key onto a board command.
    #[must_use]
    pub fn command(&self) -> Option<KeyCommand> {
        let name = self.0.as_str();
        let command = match name.to_ascii_lowercase().as_str() {
            "escape" => KeyCommand::ResetView,
            "q" => KeyCommand::PreviousColor,
            "e" => KeyCommand::NextColor,
            " " => KeyCommand::CustomColor,
            "w" | "arrowup" => KeyCommand::Nudge { dx: 0.0, dy: 1.0 },
            "a" | "arrowleft" => KeyCommand::Nudge { dx: 1.0, dy: 0.0 },
            "s" | "arrowdown" => KeyCommand::Nudge { dx: 0.0, dy: -1.0 },
            "d" | "arrowright" => KeyCommand::Nudge { dx: -1.0, dy: 0.0 },
            "+" | "=" => KeyCommand::ZoomIn,
            "-" => KeyCommand::ZoomOut,
            "0" => KeyCommand::FilterRank(10),
            digit if digit.len() == 1 => match digit.parse::<usize>() {
                Ok(rank @ 1..=9) => KeyCommand::FilterRank(rank),
                _ => return None,
            },
            _ => return None,
        };
        Some(command)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Cell currently showing the palette preview.
    pub hover: Option<Cell>,
    /// Set while the board is waiting out a rate limit.
    pub wait_until_ms: Option<i64>,
}

/// Internal state for the pointer gesture.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging the board with a panning button.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
        /// Whether the pointer moved since pointer-down.
        moved: bool,
    },
}
