//! Configuration for the terrain demo.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and are checked for changes on reload. Every section falls
//! back to its defaults when missing, so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, HeightSource, HeightfieldConfig, NoiseConfig, TerrainConfig,
    default_config_dir,
};
pub use error::ConfigError;
