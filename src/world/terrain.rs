//! Terrain generation
//!
//! Elevation comes from a single Perlin field scaled to the configured
//! depth. Materials come from a second, much lower-frequency Perlin
//! field layered over three octaves so biomes form large organic
//! patches instead of single-cell speckle.

use crate::world::snapshot::TerrainSnapshot;
use noise::{NoiseFn, Perlin};

pub const MATERIAL_MUD: u8 = 0;
pub const MATERIAL_GRASS: u8 = 1;
pub const MATERIAL_ICE: u8 = 2;

const BASE_NOISE_SCALE: f64 = 6.0;
// Much larger scale = bigger, smoother biomes
const BASE_BIOME_SCALE: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
struct Cell {
    height: u8,
    material: u8,
}

/// The live terrain grid owned by the engine.
#[derive(Debug, Clone)]
pub struct Terrain {
    width: u16,
    height: u16,
    depth: u8,
    cells: Vec<Cell>,
}

impl Terrain {
    /// Generate a width x height terrain from one seed. The biome field
    /// gets a derived seed so material patches do not track elevation.
    pub fn generate(width: u16, height: u16, depth: u8, seed: u32) -> Terrain {
        let elevation_noise = Perlin::new(seed);
        let biome_noise = Perlin::new(seed.wrapping_mul(0x9E37_79B9).wrapping_add(1));

        let scale = BASE_NOISE_SCALE / (width as f64 * 0.5);
        let biome_scale = BASE_BIOME_SCALE / (width as f64 * 0.5);

        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let elevation = elevation_noise.get([x as f64 * scale, y as f64 * scale]);

                // Layer three octaves for natural-looking biome borders
                let bx = x as f64 * biome_scale;
                let by = y as f64 * biome_scale;
                let combined = (biome_noise.get([bx, by])
                    + biome_noise.get([bx * 2.5, by * 2.5]) * 0.5
                    + biome_noise.get([bx * 5.0, by * 5.0]) * 0.25)
                    / 1.75;

                cells.push(Cell {
                    height: noise_to_height(elevation, depth as f64),
                    material: biome_material(combined),
                });
            }
        }

        Terrain { width, height, depth, cells }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Material id at a cell. Coordinates must be in range.
    pub fn material_at(&self, x: u16, y: u16) -> u8 {
        self.cells[y as usize * self.width as usize + x as usize].material
    }

    /// Copy the grids out as an immutable snapshot.
    pub fn snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot {
            width: self.width,
            height: self.height,
            materials: self.cells.iter().map(|c| c.material).collect(),
            heights: self.cells.iter().map(|c| c.height).collect(),
        }
    }
}

/// Map noise in [-1, 1] to an elevation in [0, depth].
fn noise_to_height(noise: f64, depth: f64) -> u8 {
    let normalised = (noise + 1.0) / 2.0;
    (normalised * depth) as u8
}

/// Map biome noise in [-1, 1] to a material id. Grass occupies the
/// middle quarter of the range, mud and ice split the rest.
fn biome_material(noise: f64) -> u8 {
    let normalised = (noise + 1.0) / 2.0;
    if normalised < 0.375 {
        MATERIAL_MUD
    } else if normalised < 0.625 {
        MATERIAL_GRASS
    } else {
        MATERIAL_ICE
    }
}
