//! The terrain root: owns the grid, the quadtree and the per-frame driver.

use clod_heightfield::HeightField;
use glam::Vec3;
use tracing::{debug, info, trace};

use crate::lod::RefineContext;
use crate::params::grid_scale;
use crate::{
    ErrorGrid, FrameView, GenerateOutcome, LodController, PatchArena, PatchId, PatchMesher,
    RenderSink, Surface, TerrainError, TerrainParams,
};

/// Summary of one [`Terrain::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// 1-based index of the frame that produced this report.
    pub frame: u64,
    /// Patches drawn this frame.
    pub active: usize,
    /// Active patches whose mesh was rebuilt.
    pub generated: usize,
    /// Active patches whose mesh was kept.
    pub reused: usize,
    /// Meshes uploaded to the sink.
    pub finalized: usize,
    /// Live quadtree nodes, inner nodes included.
    pub patches: usize,
    /// Deepest node in the tree.
    pub max_depth: u32,
    /// Smallest scale among active patches, or 0 when nothing is active.
    pub finest_scale: f32,
}

/// A continuous-level-of-detail terrain over one heightfield.
pub struct Terrain<H> {
    params: TerrainParams,
    surface: Surface<H>,
    grid: ErrorGrid,
    arena: PatchArena,
    root: PatchId,
    lod: LodController,
    mesher: PatchMesher,
    active: Vec<PatchId>,
    frame: u64,
}

impl<H: HeightField> Terrain<H> {
    /// Validate `params`, precompute the error grid and create the root patch.
    pub fn new(
        params: TerrainParams,
        field: H,
        sink: &mut dyn RenderSink,
    ) -> Result<Self, TerrainError> {
        params.validate()?;
        let scale = grid_scale(params.scale)?;
        let lod = LodController::new(params.detail_level, params.min_resolution)?;

        let surface = Surface::new(field, params.scale, params.height_scale);
        let grid = ErrorGrid::build(|x, z| surface.height_at(x, z), scale, params.min_resolution);
        debug!(side = grid.side(), "built error grid");

        let mut arena = PatchArena::new();
        let root = arena.create(None, Vec3::ZERO, Vec3::X, Vec3::Z, params.scale, &surface, sink);
        info!(
            scale = params.scale,
            detail_level = params.detail_level,
            min_resolution = params.min_resolution,
            "terrain initialized"
        );

        Ok(Self {
            params,
            surface,
            grid,
            arena,
            root,
            lod,
            mesher: PatchMesher::default(),
            active: Vec::new(),
            frame: 0,
        })
    }

    /// Refine the quadtree for `view` and bring every active patch's mesh up
    /// to date.
    ///
    /// Without a view nothing changes and `None` is returned.
    pub fn update(
        &mut self,
        view: Option<&FrameView>,
        sink: &mut dyn RenderSink,
    ) -> Result<Option<FrameReport>, TerrainError> {
        let Some(view) = view else {
            trace!("no camera, skipping terrain update");
            return Ok(None);
        };
        self.frame += 1;
        self.active = self.refine(view, sink)?;

        let mut report = FrameReport {
            frame: self.frame,
            active: self.active.len(),
            ..Default::default()
        };
        for &id in &self.active {
            match self.mesher.generate(&mut self.arena, &self.grid, id, sink)? {
                GenerateOutcome::Generated => report.generated += 1,
                GenerateOutcome::Reused => report.reused += 1,
            }
            if self.mesher.finalize(&mut self.arena, &self.surface, id, sink)? {
                report.finalized += 1;
            }
        }

        report.patches = self.arena.len();
        report.max_depth = self.arena.iter().map(|(_, p)| p.depth()).max().unwrap_or(0);
        report.finest_scale = self
            .active
            .iter()
            .filter_map(|&id| self.arena.patch(id))
            .map(|p| p.scale())
            .reduce(f32::min)
            .unwrap_or(0.0);
        debug!(
            frame = report.frame,
            active = report.active,
            generated = report.generated,
            reused = report.reused,
            patches = report.patches,
            "terrain frame"
        );
        Ok(Some(report))
    }

    /// Run only the traversal and return the active set, without meshing.
    pub fn refine(
        &mut self,
        view: &FrameView,
        sink: &mut dyn RenderSink,
    ) -> Result<Vec<PatchId>, TerrainError> {
        let mut ctx = RefineContext {
            arena: &mut self.arena,
            grid: &mut self.grid,
            surface: &self.surface,
            view,
            sink,
        };
        self.lod.refine(&mut ctx, self.root)
    }

    /// Build or reuse the mesh of one patch.
    pub fn generate(
        &mut self,
        id: PatchId,
        sink: &mut dyn RenderSink,
    ) -> Result<GenerateOutcome, TerrainError> {
        self.mesher.generate(&mut self.arena, &self.grid, id, sink)
    }

    /// Displace and upload one generated patch.
    pub fn finalize(&mut self, id: PatchId, sink: &mut dyn RenderSink) -> Result<bool, TerrainError> {
        self.mesher.finalize(&mut self.arena, &self.surface, id, sink)
    }

    /// Split one leaf outside of a traversal.
    pub fn subdivide(
        &mut self,
        id: PatchId,
        sink: &mut dyn RenderSink,
    ) -> Result<[PatchId; 4], TerrainError> {
        self.arena.subdivide(id, &self.surface, sink)
    }

    /// Collapse one inner node outside of a traversal.
    pub fn merge(&mut self, id: PatchId, sink: &mut dyn RenderSink) -> Result<(), TerrainError> {
        self.arena.merge(id, &mut self.grid, sink)
    }

    /// Change the detail multiplier used from the next frame on.
    pub fn set_detail_level(&mut self, detail_level: f32) -> Result<(), TerrainError> {
        self.lod.set_detail_level(detail_level)?;
        self.params.detail_level = detail_level;
        Ok(())
    }

    /// Change the split threshold used from the next frame on.
    ///
    /// The error grid keeps the floor computed with the construction-time value.
    pub fn set_min_resolution(&mut self, min_resolution: f32) -> Result<(), TerrainError> {
        self.lod.set_min_resolution(min_resolution)?;
        self.params.min_resolution = min_resolution;
        Ok(())
    }

    /// Destroy every render resource this terrain created.
    pub fn release(mut self, sink: &mut dyn RenderSink) {
        self.arena.release(self.root, sink);
        debug!(frames = self.frame, "terrain released");
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn surface(&self) -> &Surface<H> {
        &self.surface
    }

    pub fn grid(&self) -> &ErrorGrid {
        &self.grid
    }

    pub fn arena(&self) -> &PatchArena {
        &self.arena
    }

    pub fn root(&self) -> PatchId {
        self.root
    }

    /// Active set of the latest update.
    pub fn active(&self) -> &[PatchId] {
        &self.active
    }

    pub fn lod(&self) -> &LodController {
        &self.lod
    }

    /// Number of updates that ran with a camera.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
