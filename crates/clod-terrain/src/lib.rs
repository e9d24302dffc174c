//! Continuous level-of-detail terrain after Röttger's geomipmapping scheme.
//!
//! A square heightfield is covered by a quadtree of patches. An [`ErrorGrid`]
//! computed once at startup holds a roughness value per patch center; each
//! frame the [`LodController`] compares those values against the camera
//! distance to decide which patches split or merge, culls patches outside the
//! view frustum, and the [`PatchMesher`] triangulates the resulting leaves as
//! fans whose edges stitch cleanly against coarser neighbours.
//!
//! The engine is renderer-agnostic: finished meshes and visibility changes are
//! reported to a [`RenderSink`].
//!
//! ```no_run
//! use clod_heightfield::FlatHeightField;
//! use clod_terrain::{FrameView, RecordingSink, Terrain, TerrainParams};
//! use glam::Vec3;
//!
//! let mut sink = RecordingSink::new();
//! let mut terrain = Terrain::new(TerrainParams::default(), FlatHeightField(0.5), &mut sink)?;
//! let view = FrameView::looking_at(
//!     Vec3::new(0.0, 120.0, -200.0),
//!     Vec3::ZERO,
//!     Vec3::Y,
//!     60f32.to_radians(),
//!     16.0 / 9.0,
//!     0.1,
//!     2000.0,
//! );
//! let report = terrain.update(Some(&view), &mut sink)?;
//! # Ok::<(), clod_terrain::TerrainError>(())
//! ```

pub mod error;
pub mod error_grid;
pub mod frustum;
pub mod lod;
pub mod mesher;
pub mod params;
pub mod patch;
pub mod sink;
pub mod surface;
pub mod terrain;

pub use error::TerrainError;
pub use error_grid::{ErrorGrid, SPLIT, UNSPLIT, is_resolution_boundary};
pub use frustum::{Aabb, FrameView, Frustum};
pub use lod::{LodController, RefineContext};
pub use mesher::{
    GenerateOutcome, NeighborMask, PatchMesh, PatchMesher, PatchVertex, build_fan, neighbor_mask,
};
pub use params::{TerrainParams, error_floor_factor};
pub use patch::{MIN_SPLIT_SCALE, Patch, PatchArena, PatchId};
pub use sink::{NullSink, PatchMaterial, RecordedPatch, RecordingSink, RenderSink, SinkStats};
pub use surface::Surface;
pub use terrain::{FrameReport, Terrain};
