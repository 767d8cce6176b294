//! Startup configuration
//!
//! Uses RON (Rusty Object Notation) for a human-readable config file.
//! A missing file is not an error: the app falls back to defaults that
//! reproduce the original mud/grass/ice world, and writes a starter
//! file so the values are easy to tweak.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_PATH: &str = "terraview.ron";

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One palette entry: material id -> base RGB color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub id: u8,
    pub name: String,
    pub color: (u8, u8, u8),
}

impl PaletteEntry {
    /// The original material set: mud, grass, ice.
    pub fn defaults() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry { id: 0, name: "mud".to_string(), color: (255, 0, 0) },
            PaletteEntry { id: 1, name: "grass".to_string(), color: (0, 255, 0) },
            PaletteEntry { id: 2, name: "ice".to_string(), color: (0, 0, 255) },
        ]
    }
}

/// World generation parameters consumed by the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Terrain width in cells (one cell = one pixel of the terrain layer)
    pub width: u16,
    /// Terrain height in cells
    pub height: u16,
    /// Maximum elevation; heights run 0..depth
    pub depth: u8,
    /// Number of entities spawned per generation
    pub entity_count: u32,
    /// Entities spawn uniformly inside this rectangle (x1, y1, x2, y2)
    pub spawn_zone: (u16, u16, u16, u16),
    /// Mean of the Weibull-sampled death age, in ticks
    pub expected_death_age: u32,
    /// Fixed seed for reproducible worlds; None draws a fresh seed
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            depth: 10,
            entity_count: 15,
            spawn_zone: (200, 200, 400, 400),
            expected_death_age: 400,
            seed: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub palette: Vec<PaletteEntry>,
    /// Deadline for a background regeneration before the coordinator
    /// gives up and returns to idle, in seconds
    pub regen_timeout_secs: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            palette: PaletteEntry::defaults(),
            regen_timeout_secs: 30.0,
        }
    }
}

impl AppConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = ron::from_str(&contents)?;
        Ok(config)
    }

    /// Save this config as pretty-printed RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        let ron_string = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Load the config file, falling back to defaults when it is missing
    /// or malformed. A missing file is written back so the user has a
    /// starter file to edit; a malformed one is left alone.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> AppConfig {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                match config.save(path) {
                    Ok(()) => println!("Wrote default config to {}", path.display()),
                    Err(e) => eprintln!("Could not write default config: {}", e),
                }
                config
            }
            Err(e) => {
                eprintln!("Config error in {}: {}, using defaults", path.display(), e);
                AppConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraview.ron");

        let mut config = AppConfig::default();
        config.world.width = 64;
        config.world.seed = Some(7);
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.world.width, 64);
        assert_eq!(loaded.world.seed, Some(7));
        assert_eq!(loaded.palette.len(), 3);
    }

    #[test]
    fn test_load_or_default_writes_starter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ron");

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.world.width, 800);
        assert!(path.exists());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(world: nonsense").unwrap();

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.world.depth, 10);
    }
}
