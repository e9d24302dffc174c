//! Headless CLOD terrain fly-over.
//!
//! Loads `clod.ron` (created with defaults on first run), applies CLI
//! overrides, then orbits a camera over the terrain for the configured number
//! of frames and logs LOD statistics.
//!
//! Run with `cargo run -p clod-demo -- --frames 120 --detail-level 8`.
//! Set `RUST_LOG=clod_terrain=debug` to see structural changes per frame.

mod flyover;

use std::process::ExitCode;

use clap::Parser;
use clod_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    if let Some(log_file) =
        clod_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config))
    {
        info!(path = %log_file.display(), "writing JSON log");
    }

    info!(
        scale = config.terrain.scale,
        detail_level = config.terrain.detail_level,
        min_resolution = config.terrain.min_resolution,
        frames = config.camera.frames,
        "starting fly-over"
    );

    match flyover::run(&config, Some(&config_dir)) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                peak_active = summary.peak_active,
                peak_patches = summary.peak_patches,
                finest_scale = summary.finest_scale,
                uploads = summary.uploads,
                destroyed = summary.destroyed,
                "fly-over finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fly-over failed");
            ExitCode::FAILURE
        }
    }
}
