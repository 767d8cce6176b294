//! Entity layer rendering
//!
//! The layer starts as a sheet of the transparent key color and gets
//! one filled circle per entity, in snapshot order, so later entries
//! paint over earlier ones. Out-of-bounds entities clip against the
//! raster edge instead of erroring - a wanderer past the border is
//! normal, not a bug.

use crate::raster::{RasterLayer, Rgb};
use crate::world::EntitySnapshot;

/// Key color the compositor treats as see-through.
pub const ENTITY_KEY_COLOR: Rgb = Rgb::new(0, 0, 0);
/// Living entities.
pub const ENTITY_ALIVE_COLOR: Rgb = Rgb::new(255, 255, 0);
/// Dead entities stay visible, just muted.
pub const ENTITY_DEAD_COLOR: Rgb = Rgb::new(128, 128, 128);

/// Render an entity snapshot into a keyed layer of the given
/// dimensions. The snapshot is consumed as a value; nothing is
/// retained across frames.
pub fn render_entities(entities: &EntitySnapshot, width: u16, height: u16) -> RasterLayer {
    let mut layer = RasterLayer::with_key(width as usize, height as usize, ENTITY_KEY_COLOR);
    for point in entities {
        let color = if point.alive {
            ENTITY_ALIVE_COLOR
        } else {
            ENTITY_DEAD_COLOR
        };
        layer.fill_circle(point.x as i32, point.y as i32, point.radius as i32, color);
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EntityPoint;

    fn entity(id: u32, x: f32, y: f32, alive: bool, radius: u32) -> EntityPoint {
        EntityPoint { id, x, y, alive, radius }
    }

    #[test]
    fn test_later_entry_paints_over_earlier() {
        let snapshot = vec![
            entity(1, 5.0, 5.0, true, 3),
            entity(2, 5.0, 5.0, false, 3),
        ];
        let layer = render_entities(&snapshot, 16, 16);
        assert_eq!(layer.get(5, 5), ENTITY_DEAD_COLOR);
        // The alive color is nowhere: the dead circle covers it fully
        for y in 0..16 {
            for x in 0..16 {
                assert_ne!(layer.get(x, y), ENTITY_ALIVE_COLOR);
            }
        }
    }

    #[test]
    fn test_empty_snapshot_is_all_key() {
        let layer = render_entities(&Vec::new(), 8, 8);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(layer.get(x, y), ENTITY_KEY_COLOR);
            }
        }
    }

    #[test]
    fn test_out_of_bounds_entity_clips() {
        let snapshot = vec![entity(1, -2.0, 4.0, true, 3), entity(2, 100.0, 100.0, true, 5)];
        let layer = render_entities(&snapshot, 8, 8);
        // The part of the first circle that overlaps the layer lands
        assert_eq!(layer.get(0, 4), ENTITY_ALIVE_COLOR);
        // The second circle is entirely off-raster
        assert_eq!(layer.get(7, 7), ENTITY_KEY_COLOR);
    }

    #[test]
    fn test_dead_entities_use_dead_color() {
        let snapshot = vec![entity(1, 4.0, 4.0, false, 2)];
        let layer = render_entities(&snapshot, 8, 8);
        assert_eq!(layer.get(4, 4), ENTITY_DEAD_COLOR);
    }
}
