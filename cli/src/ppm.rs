//! Binary PPM (P6) export of a board snapshot.

#[cfg(test)]
#[path = "ppm_test.rs"]
mod ppm_test;

use canvas::placement::{Cell, Color};
use canvas::snapshot::Snapshot;

/// Encode `snapshot` with unpainted cells filled with `background`.
pub fn encode(snapshot: &Snapshot, background: Color) -> Vec<u8> {
    let (width, height) = (snapshot.width(), snapshot.height());
    let header = format!("P6\n{width} {height}\n255\n");
    let mut out = Vec::with_capacity(header.len() + width as usize * height as usize * 3);
    out.extend_from_slice(header.as_bytes());
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = snapshot.get(Cell::new(x, y)).unwrap_or(background).rgb();
            out.extend_from_slice(&[r, g, b]);
        }
    }
    out
}
