//! Frame composition
//!
//! Stacks the entity layer over the terrain layer. A pure function of
//! its two inputs: key-colored entity pixels let the terrain show
//! through, everything else wins. Caching the result is the main
//! loop's job, not this module's.

use crate::raster::RasterLayer;

/// Compose the final frame from the two cached layers. Both layers
/// must share the world's dimensions; a mismatch means a broken layer
/// lifecycle upstream.
pub fn compose(terrain: &RasterLayer, entities: &RasterLayer) -> RasterLayer {
    assert_eq!(
        (terrain.width(), terrain.height()),
        (entities.width(), entities.height()),
        "layer dimensions diverged"
    );

    let mut frame = terrain.clone();
    match entities.key() {
        Some(key) => {
            for y in 0..entities.height() {
                for x in 0..entities.width() {
                    let pixel = entities.get(x, y);
                    if pixel != key {
                        frame.put(x as i32, y as i32, pixel);
                    }
                }
            }
        }
        // No key color: the upper layer is fully opaque
        None => frame = entities.clone(),
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rgb;

    const KEY: Rgb = Rgb::new(0, 0, 0);

    #[test]
    fn test_key_pixels_pass_terrain_through() {
        let mut terrain = RasterLayer::new(4, 4);
        terrain.fill(Rgb::new(10, 20, 30));
        let entities = RasterLayer::with_key(4, 4, KEY);

        let frame = compose(&terrain, &entities);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(frame.get(x, y), Rgb::new(10, 20, 30));
            }
        }
    }

    #[test]
    fn test_non_key_pixels_win() {
        let mut terrain = RasterLayer::new(4, 4);
        terrain.fill(Rgb::new(10, 20, 30));
        let mut entities = RasterLayer::with_key(4, 4, KEY);
        entities.put(2, 1, Rgb::new(255, 255, 0));

        let frame = compose(&terrain, &entities);
        assert_eq!(frame.get(2, 1), Rgb::new(255, 255, 0));
        assert_eq!(frame.get(0, 0), Rgb::new(10, 20, 30));
    }

    #[test]
    fn test_compose_does_not_mutate_inputs() {
        let mut terrain = RasterLayer::new(2, 2);
        terrain.fill(Rgb::new(1, 2, 3));
        let mut entities = RasterLayer::with_key(2, 2, KEY);
        entities.put(0, 0, Rgb::WHITE);

        let terrain_before = terrain.clone();
        let entities_before = entities.clone();
        let _ = compose(&terrain, &entities);
        assert_eq!(terrain, terrain_before);
        assert_eq!(entities, entities_before);
    }

    #[test]
    #[should_panic(expected = "layer dimensions diverged")]
    fn test_dimension_mismatch_panics() {
        let terrain = RasterLayer::new(4, 4);
        let entities = RasterLayer::with_key(3, 4, KEY);
        let _ = compose(&terrain, &entities);
    }
}
