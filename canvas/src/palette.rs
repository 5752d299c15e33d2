//! Color palette with a user-custom slot.
//!
//! Slot 0 holds the user's custom color; the remaining slots are the built-in
//! swatches. Picking a color selects the last slot that already holds it, or
//! stores it in the custom slot.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use crate::consts::DEFAULT_PALETTE;
use crate::placement::Color;

/// Index of the custom slot.
pub const CUSTOM_SLOT: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
    selected: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().filter_map(|hex| Color::parse(hex)).collect(),
            selected: CUSTOM_SLOT,
        }
    }
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously stored custom color.
    #[must_use]
    pub fn with_custom(mut self, color: Color) -> Self {
        self.set_custom(color);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The color new placements use.
    #[must_use]
    pub fn selected_color(&self) -> Color {
        self.colors.get(self.selected).copied().unwrap_or(Color::BLACK)
    }

    #[must_use]
    pub fn custom(&self) -> Color {
        self.colors.get(CUSTOM_SLOT).copied().unwrap_or(Color::BLACK)
    }

    pub fn set_custom(&mut self, color: Color) {
        if let Some(slot) = self.colors.get_mut(CUSTOM_SLOT) {
            *slot = color;
        }
    }

    /// Select a slot. Out-of-range indices are ignored. Returns whether the
    /// selection changed.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.colors.len() || index == self.selected {
            return false;
        }
        self.selected = index;
        true
    }

    /// Move the selection by `delta` slots, stopping at either end.
    pub fn step(&mut self, delta: isize) -> bool {
        let last = self.colors.len().saturating_sub(1);
        let target = self.selected.saturating_add_signed(delta).min(last);
        self.select(target)
    }

    /// Select the custom slot.
    pub fn reset(&mut self) -> bool {
        self.select(CUSTOM_SLOT)
    }

    /// Select `color`, storing it in the custom slot if no swatch has it.
    ///
    /// Returns the selected index.
    pub fn pick(&mut self, color: Color) -> usize {
        let index = self
            .colors
            .iter()
            .rposition(|c| *c == color)
            .filter(|&i| i != CUSTOM_SLOT)
            .unwrap_or(CUSTOM_SLOT);
        if index == CUSTOM_SLOT {
            self.set_custom(color);
        }
        self.selected = index;
        index
    }
}
