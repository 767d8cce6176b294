//! Software raster layers
//!
//! Plain CPU-side pixel buffers, one per visual aspect of the frame:
//! - RGBA bytes, 4 per pixel, row-major (uploadable via `Texture2D::from_rgba8`)
//! - Optional transparent key color so one layer can show through another
//! - Drawing primitives clip against the buffer edge instead of erroring

use std::fmt;

/// An 8-bit RGB color. Alpha is not stored; layers are fully opaque and
/// transparency is expressed through the key color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale each channel by `factor`, clamped to the valid byte range
    /// and rounded to the nearest integer pixel value.
    pub fn scaled(self, factor: f32) -> Rgb {
        let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A cached raster layer: width*height RGBA pixels plus an optional
/// transparent key color.
///
/// The compositor treats key-colored pixels as see-through. Only the
/// entity layer carries a key; the terrain layer is fully opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    key: Option<Rgb>,
}

impl RasterLayer {
    /// Create an opaque layer filled with black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec_filled(width, height, Rgb::BLACK),
            key: None,
        }
    }

    /// Create a layer pre-filled with its transparent key color.
    pub fn with_key(width: usize, height: usize, key: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec_filled(width, height, key),
            key: Some(key),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn key(&self) -> Option<Rgb> {
        self.key
    }

    /// Raw RGBA bytes, row-major, for texture upload.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        let idx = (y * self.width + x) * 4;
        Rgb::new(self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    /// Set a pixel. Out-of-bounds coordinates are silently clipped.
    pub fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        self.pixels[idx] = color.r;
        self.pixels[idx + 1] = color.g;
        self.pixels[idx + 2] = color.b;
        self.pixels[idx + 3] = 255;
    }

    /// Fill the whole layer with one color.
    pub fn fill(&mut self, color: Rgb) {
        for i in 0..(self.width * self.height) {
            self.pixels[i * 4] = color.r;
            self.pixels[i * 4 + 1] = color.g;
            self.pixels[i * 4 + 2] = color.b;
            self.pixels[i * 4 + 3] = 255;
        }
    }

    /// Draw a filled circle centered at (cx, cy). Pixels outside the
    /// layer clip against the edge.
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Rgb) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }
}

fn vec_filled(width: usize, height: usize, color: Rgb) -> Vec<u8> {
    let mut pixels = vec![255u8; width * height * 4];
    for i in 0..(width * height) {
        pixels[i * 4] = color.r;
        pixels[i * 4 + 1] = color.g;
        pixels[i * 4 + 2] = color.b;
    }
    pixels
}
