//! Material palette
//!
//! Static mapping from terrain material id to base color, built once at
//! startup from configuration and immutable afterwards. The terrain
//! renderer treats an id missing from the palette as a fatal
//! configuration error, never as a silent default color.

use crate::config::PaletteEntry;
use crate::raster::Rgb;
use std::collections::HashMap;

/// Fixed material-id -> base color mapping.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: HashMap<u8, Rgb>,
}

impl Palette {
    pub fn from_entries(entries: &[PaletteEntry]) -> Self {
        let colors = entries
            .iter()
            .map(|e| (e.id, Rgb::new(e.color.0, e.color.1, e.color.2)))
            .collect();
        Self { colors }
    }

    /// Base color for a material id, if the palette defines it.
    pub fn get(&self, id: u8) -> Option<Rgb> {
        self.colors.get(&id).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_entries(&PaletteEntry::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_covers_world_materials() {
        let palette = Palette::default();
        assert_eq!(palette.get(0), Some(Rgb::new(255, 0, 0)));
        assert_eq!(palette.get(1), Some(Rgb::new(0, 255, 0)));
        assert_eq!(palette.get(2), Some(Rgb::new(0, 0, 255)));
        assert_eq!(palette.get(3), None);
    }
}
