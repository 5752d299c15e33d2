//! Rendering: paints board snapshots into a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! The canvas backing store has one pixel per board cell; zoom and pan are
//! applied by the host as a CSS transform, so nothing here knows about the
//! viewport. Unpainted cells stay transparent.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, ImageData};

use crate::placement::{Cell, Color};
use crate::snapshot::Snapshot;

/// Bytes per pixel in `ImageData`.
const RGBA: usize = 4;

/// Row-major RGBA bytes for a snapshot. Unpainted cells are fully transparent.
#[must_use]
pub fn snapshot_rgba(snapshot: &Snapshot) -> Vec<u8> {
    let width = snapshot.width() as usize;
    let mut data = vec![0_u8; width * snapshot.height() as usize * RGBA];
    for (cell, color) in snapshot.painted() {
        let offset = (cell.y as usize * width + cell.x as usize) * RGBA;
        let (r, g, b) = color.rgb();
        data[offset..offset + RGBA].copy_from_slice(&[r, g, b, 0xFF]);
    }
    data
}

/// CSS color string for a cell color.
#[must_use]
pub fn css_color(color: Color) -> String {
    format!("#{color}")
}

/// Replace the whole canvas with `snapshot`.
///
/// # Errors
///
/// Returns `Err` if the image data cannot be created or drawn.
pub fn draw_snapshot(ctx: &CanvasRenderingContext2d, snapshot: &Snapshot) -> Result<(), JsValue> {
    let data = snapshot_rgba(snapshot);
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&data), snapshot.width(), snapshot.height())?;
    ctx.put_image_data(&image, 0.0, 0.0)
}

/// Draw or clear one cell.
pub fn draw_cell(ctx: &CanvasRenderingContext2d, cell: Cell, color: Option<Color>) {
    let (x, y) = (f64::from(cell.x), f64::from(cell.y));
    match color {
        Some(color) => {
            ctx.set_fill_style_str(&css_color(color));
            ctx.fill_rect(x, y, 1.0, 1.0);
        }
        None => ctx.clear_rect(x, y, 1.0, 1.0),
    }
}
