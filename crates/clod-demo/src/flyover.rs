//! Headless fly-over: orbit a camera around a terrain and collect LOD statistics.

use std::path::Path;

use clod_config::{CameraConfig, Config, HeightSource, HeightfieldConfig, TerrainConfig};
use clod_heightfield::{
    FlatHeightField, HeightField, HeightFieldError, ImageHeightField, NoiseHeightField, NoiseParams,
};
use clod_terrain::{FrameView, RecordingSink, Terrain, TerrainError, TerrainParams};
use glam::Vec3;
use tracing::{debug, info, warn};

/// Frames between config hot-reload checks and progress lines.
const REPORT_INTERVAL: u32 = 60;

/// Anything that stops a fly-over.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("heightfield: {0}")]
    HeightField(#[from] HeightFieldError),
    #[error("terrain: {0}")]
    Terrain(#[from] TerrainError),
}

/// Heightfield shared with the terrain for the whole run.
pub type DynHeightField = Box<dyn HeightField + Send + Sync>;

pub fn terrain_params(config: &TerrainConfig) -> TerrainParams {
    TerrainParams {
        scale: config.scale,
        detail_level: config.detail_level,
        min_resolution: config.min_resolution,
        height_scale: config.height_scale,
    }
}

/// Build the configured heightfield provider.
pub fn build_heightfield(config: &HeightfieldConfig) -> Result<DynHeightField, HeightFieldError> {
    let field: DynHeightField = match &config.source {
        HeightSource::Flat { level } => Box::new(FlatHeightField(level.clamp(0.0, 1.0))),
        HeightSource::Image { path } => Box::new(ImageHeightField::open(path)?),
        HeightSource::Noise(noise) => Box::new(NoiseHeightField::new(NoiseParams {
            seed: noise.seed,
            octaves: noise.octaves,
            lacunarity: noise.lacunarity,
            gain: noise.gain,
            warp: noise.warp,
            frequency: noise.frequency,
        })),
    };
    Ok(field)
}

/// Camera circling the terrain center at a fixed altitude.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    config: CameraConfig,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Eye position at `frame`.
    pub fn eye(&self, frame: u32) -> Vec3 {
        let angle = (frame as f32 * self.config.degrees_per_frame).to_radians();
        Vec3::new(
            angle.cos() * self.config.orbit_radius,
            self.config.altitude,
            angle.sin() * self.config.orbit_radius,
        )
    }

    /// View looking at the terrain center from [`Self::eye`].
    pub fn view(&self, frame: u32) -> FrameView {
        FrameView::looking_at(
            self.eye(frame),
            Vec3::ZERO,
            Vec3::Y,
            self.config.fov_degrees.to_radians(),
            self.config.aspect,
            self.config.near,
            self.config.far,
        )
    }
}

/// Aggregate statistics of a fly-over.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlyoverSummary {
    pub frames: u64,
    pub peak_active: usize,
    pub peak_patches: usize,
    pub finest_scale: f32,
    pub uploads: usize,
    pub destroyed: usize,
}

/// Fly the configured camera over the configured terrain.
///
/// With a `config_dir`, the config file is re-read every
/// [`REPORT_INTERVAL`] frames and changed LOD tuning is applied live.
pub fn run(config: &Config, config_dir: Option<&Path>) -> Result<FlyoverSummary, DemoError> {
    let field = build_heightfield(&config.heightfield)?;
    let mut sink = RecordingSink::new();
    let mut terrain = Terrain::new(terrain_params(&config.terrain), field, &mut sink)?;
    let camera = OrbitCamera::new(config.camera.clone());
    let mut current = config.clone();
    let mut summary = FlyoverSummary {
        finest_scale: f32::INFINITY,
        ..Default::default()
    };

    for frame in 0..config.camera.frames {
        if let Some(report) = terrain.update(Some(&camera.view(frame)), &mut sink)? {
            summary.frames = report.frame;
            summary.peak_active = summary.peak_active.max(report.active);
            summary.peak_patches = summary.peak_patches.max(report.patches);
            if report.active > 0 {
                summary.finest_scale = summary.finest_scale.min(report.finest_scale);
            }
            debug!(
                frame = report.frame,
                active = report.active,
                generated = report.generated,
                reused = report.reused,
                patches = report.patches,
                max_depth = report.max_depth,
                "frame"
            );
        }

        if (frame + 1) % REPORT_INTERVAL == 0 {
            info!(frame = frame + 1, active = terrain.active().len(), "fly-over progress");
            if let Some(dir) = config_dir {
                apply_reload(&mut terrain, &mut current, dir);
            }
        }
    }

    let stats = sink.stats();
    summary.uploads = stats.uploads;
    terrain.release(&mut sink);
    summary.destroyed = sink.stats().destroyed;
    if summary.finest_scale.is_infinite() {
        summary.finest_scale = 0.0;
    }
    Ok(summary)
}

/// Pick up changed LOD tuning from disk. Other changes need a restart.
fn apply_reload<H: HeightField>(terrain: &mut Terrain<H>, current: &mut Config, dir: &Path) {
    let fresh = match current.reload(dir) {
        Ok(Some(fresh)) => fresh,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "config reload failed");
            return;
        }
    };
    if let Err(e) = terrain.set_detail_level(fresh.terrain.detail_level) {
        warn!(error = %e, "ignoring reloaded detail_level");
    }
    if let Err(e) = terrain.set_min_resolution(fresh.terrain.min_resolution) {
        warn!(error = %e, "ignoring reloaded min_resolution");
    }
    info!(
        detail_level = terrain.lod().detail_level(),
        min_resolution = terrain.lod().min_resolution(),
        "applied reloaded LOD tuning"
    );
    *current = fresh;
}
