//! Configuration sections, their defaults, and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const FILE_NAME: &str = "clod.ron";

/// Platform config directory for the demo, e.g. `~/.config/clod-terrain`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clod-terrain")
}

/// Top-level demo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub terrain: TerrainConfig,
    pub heightfield: HeightfieldConfig,
    pub camera: CameraConfig,
    pub debug: DebugConfig,
}

/// Terrain construction and LOD tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World edge length; a power of two of at least 4.
    pub scale: f32,
    /// Higher values refine rough areas more eagerly.
    pub detail_level: f32,
    /// Split threshold; must exceed 1.
    pub min_resolution: f32,
    /// Vertical exaggeration of the normalized heightfield.
    pub height_scale: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            scale: 256.0,
            detail_level: 5.0,
            min_resolution: 2.0,
            height_scale: 50.0,
        }
    }
}

/// Where terrain heights come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeightfieldConfig {
    pub source: HeightSource,
}

/// Heightfield provider selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HeightSource {
    /// Constant height in `[0, 1]`.
    Flat { level: f32 },
    /// Grayscale image, luminance used as height.
    Image { path: PathBuf },
    /// Procedural plains and ridged mountains.
    Noise(NoiseConfig),
}

impl Default for HeightSource {
    fn default() -> Self {
        Self::Noise(NoiseConfig::default())
    }
}

/// Procedural noise settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: u32,
    pub octaves: usize,
    pub lacunarity: f64,
    pub gain: f64,
    /// Share of ridged mountains in the blend, `0` for plains only.
    pub warp: f64,
    /// Base frequency across the whole terrain.
    pub frequency: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            octaves: 6,
            lacunarity: 2.7,
            gain: 0.5,
            warp: 0.25,
            frequency: 4.0,
        }
    }
}

/// Orbiting fly-over camera of the headless demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Horizontal distance from the terrain center.
    pub orbit_radius: f32,
    /// Height above the terrain's zero level.
    pub altitude: f32,
    /// Frames to simulate before exiting.
    pub frames: u32,
    /// Orbit advance per frame.
    pub degrees_per_frame: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
            orbit_radius: 160.0,
            altitude: 80.0,
            frames: 360,
            degrees_per_frame: 1.0,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter used when `RUST_LOG` is unset (e.g. "debug", "clod_terrain=trace").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Path of the config file inside `config_dir`.
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(FILE_NAME)
    }

    /// Load the config from `config_dir`, writing a default file first if none exists.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::file_path(config_dir);
        if path.exists() {
            let config = Self::read(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config to `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = Self::file_path(config_dir);
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, serialized).map_err(write_err)?;
        Ok(())
    }

    /// Re-read the file; `Some` only when its contents differ from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&Self::file_path(config_dir))?;
        if &fresh != self {
            log::info!("Config reloaded with changes");
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let ron_str =
            ron::ser::to_string_pretty(&Config::default(), ron::ser::PrettyConfig::new()).unwrap();
        assert!(ron_str.contains("scale: 256.0"));
        assert!(ron_str.contains("seed: 1337"));
        assert!(ron_str.contains("log_level: \"info\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.heightfield.source = HeightSource::Image {
            path: PathBuf::from("maps/island.png"),
        };
        let ron_str = ron::to_string(&config).unwrap();
        let parsed: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = ron::from_str("(terrain: (scale: 64.0))").unwrap();
        assert_eq!(config.terrain.scale, 64.0);
        assert_eq!(config.terrain.detail_level, 5.0);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.heightfield.source, HeightSource::default());
    }

    #[test]
    fn test_flat_source_parses() {
        let config: Config =
            ron::from_str("(heightfield: (source: Flat(level: 0.25)))").unwrap();
        assert_eq!(config.heightfield.source, HeightSource::Flat { level: 0.25 });
    }

    #[test]
    fn test_unknown_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.scale = 512.0;
        config.camera.frames = 10;
        config.save(dir.path()).unwrap();

        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::file_path(&nested).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut modified = config.clone();
        modified.terrain.detail_level = 9.0;
        modified.save(dir.path()).unwrap();
        let reloaded = config.reload(dir.path()).unwrap();
        assert_eq!(reloaded.map(|c| c.terrain.detail_level), Some(9.0));
    }

    #[test]
    fn test_invalid_ron_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::file_path(dir.path()), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("clod.ron"));
    }
}
