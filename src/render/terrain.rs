//! Terrain layer rendering
//!
//! Every cell gets its material's base color scaled by a brightness
//! derived from the cell's elevation relative to the snapshot's global
//! range, so valleys read darker than peaks regardless of the world's
//! absolute depth.

use super::RenderError;
use crate::palette::Palette;
use crate::raster::RasterLayer;
use crate::world::TerrainSnapshot;

/// Brightness floor for the lowest cell; the highest cell approaches 1.
const BRIGHTNESS_FLOOR: f32 = 0.55;
const BRIGHTNESS_SPAN: f32 = 0.45;
/// Keeps the normalization finite on a perfectly flat map.
const FLAT_EPSILON: f32 = 1e-9;

/// Render a terrain snapshot into an opaque layer of exactly the
/// snapshot's dimensions. Display magnification happens at present
/// time, never here.
pub fn render_terrain(snapshot: &TerrainSnapshot, palette: &Palette) -> Result<RasterLayer, RenderError> {
    let cells = snapshot.width as usize * snapshot.height as usize;
    if cells == 0 || !snapshot.shape_matches() {
        return Err(RenderError::MalformedSnapshot {
            expected: cells,
            materials: snapshot.materials.len(),
            heights: snapshot.heights.len(),
        });
    }

    // Global elevation range; a flat map degenerates to the floor value
    let h_min = *snapshot.heights.iter().min().unwrap() as f32;
    let h_max = *snapshot.heights.iter().max().unwrap() as f32;
    let span = h_max - h_min + FLAT_EPSILON;

    let mut layer = RasterLayer::new(snapshot.width as usize, snapshot.height as usize);
    for y in 0..snapshot.height {
        for x in 0..snapshot.width {
            let idx = y as usize * snapshot.width as usize + x as usize;
            let id = snapshot.materials[idx];
            let base = palette
                .get(id)
                .ok_or(RenderError::UnknownMaterial { id, x, y })?;

            let h = snapshot.heights[idx] as f32;
            let brightness = BRIGHTNESS_FLOOR + BRIGHTNESS_SPAN * (h - h_min) / span;
            layer.put(x as i32, y as i32, base.scaled(brightness));
        }
    }
    Ok(layer)
}
