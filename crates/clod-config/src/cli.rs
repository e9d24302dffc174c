//! Command-line arguments for the terrain demo.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, HeightSource};

/// Headless CLOD terrain fly-over.
///
/// CLI values override settings loaded from `clod.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "clod-demo", about = "Headless CLOD terrain fly-over")]
pub struct CliArgs {
    /// Terrain edge length (power of two, at least 4).
    #[arg(long)]
    pub scale: Option<f32>,

    /// Detail multiplier for rough areas.
    #[arg(long)]
    pub detail_level: Option<f32>,

    /// Split threshold (greater than 1).
    #[arg(long)]
    pub min_resolution: Option<f32>,

    /// Grayscale heightmap image; replaces the configured heightfield source.
    #[arg(long)]
    pub heightmap: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(scale) = args.scale {
            self.terrain.scale = scale;
        }
        if let Some(detail_level) = args.detail_level {
            self.terrain.detail_level = detail_level;
        }
        if let Some(min_resolution) = args.min_resolution {
            self.terrain.min_resolution = min_resolution;
        }
        if let Some(ref path) = args.heightmap {
            self.heightfield.source = HeightSource::Image { path: path.clone() };
        }
        if let Some(frames) = args.frames {
            self.camera.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
