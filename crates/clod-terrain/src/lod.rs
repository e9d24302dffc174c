//! View-dependent refinement of the patch quadtree.

use clod_heightfield::HeightField;
use tracing::trace;

use crate::error_grid::{SPLIT, UNSPLIT};
use crate::params::{check_detail_level, check_min_resolution};
use crate::patch::MIN_SPLIT_SCALE;
use crate::{ErrorGrid, FrameView, PatchArena, PatchId, RenderSink, Surface, TerrainError};

/// Everything one traversal reads or mutates.
pub struct RefineContext<'a, H> {
    pub arena: &'a mut PatchArena,
    pub grid: &'a mut ErrorGrid,
    pub surface: &'a Surface<H>,
    pub view: &'a FrameView,
    pub sink: &'a mut dyn RenderSink,
}

/// Decides, per frame, which patches split, merge, or are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodController {
    detail_level: f32,
    min_resolution: f32,
}

impl LodController {
    /// Create a controller after validating both tuning values.
    pub fn new(detail_level: f32, min_resolution: f32) -> Result<Self, TerrainError> {
        check_detail_level(detail_level)?;
        check_min_resolution(min_resolution)?;
        Ok(Self {
            detail_level,
            min_resolution,
        })
    }

    pub fn detail_level(&self) -> f32 {
        self.detail_level
    }

    pub fn min_resolution(&self) -> f32 {
        self.min_resolution
    }

    /// Change the detail multiplier; takes effect on the next traversal.
    pub fn set_detail_level(&mut self, detail_level: f32) -> Result<(), TerrainError> {
        check_detail_level(detail_level)?;
        self.detail_level = detail_level;
        Ok(())
    }

    /// Change the split threshold; takes effect on the next traversal.
    pub fn set_min_resolution(&mut self, min_resolution: f32) -> Result<(), TerrainError> {
        check_min_resolution(min_resolution)?;
        self.min_resolution = min_resolution;
        Ok(())
    }

    /// Röttger's decision variable. Values below 1 ask for a split.
    ///
    /// `view_distance` is the L1 distance to the camera and `roughness` the
    /// patch's error value from the grid.
    pub fn split_metric(&self, view_distance: f32, scale: f32, roughness: i32) -> f32 {
        let error_term = (self.detail_level * roughness as f32 / 4.0).max(1.0);
        view_distance / (scale * self.min_resolution * error_term)
    }

    /// Visit the tree below `root` and return the active leaves in
    /// depth-first child order.
    pub fn refine<H: HeightField>(
        &self,
        ctx: &mut RefineContext<'_, H>,
        root: PatchId,
    ) -> Result<Vec<PatchId>, TerrainError> {
        let mut active = Vec::new();
        self.refine_node(ctx, root, &mut active)?;
        Ok(active)
    }

    fn refine_node<H: HeightField>(
        &self,
        ctx: &mut RefineContext<'_, H>,
        id: PatchId,
        active: &mut Vec<PatchId>,
    ) -> Result<(), TerrainError> {
        let patch = ctx.arena.get(id)?;
        let (x, z) = patch.grid_cell(ctx.grid.half());

        if !ctx.view.frustum.is_visible(patch.bounds()) {
            ctx.grid.set(x, z, UNSPLIT);
            ctx.arena.disable_recursive(id, ctx.sink);
            trace!(?id, "culled patch");
            return Ok(());
        }

        let center = patch.center();
        let scale = patch.scale();
        let is_leaf = patch.is_leaf();
        let camera = ctx.view.position;
        // The cell right of the center caches the patch's height proxy.
        let height = ctx.grid.value(x + 1, z) as f32;
        let roughness = ctx.grid.value(x - 1, z);
        let view_distance = (camera.x - center.x).abs()
            + (camera.y - height).abs()
            + (camera.z - center.z).abs();
        let metric = self.split_metric(view_distance, scale, roughness);
        let blend = if metric >= 1.0 { UNSPLIT } else { SPLIT };
        ctx.grid.set(x, z, blend);
        trace!(?id, scale, metric, "refine decision");

        if blend == UNSPLIT {
            if !is_leaf {
                ctx.arena.merge(id, ctx.grid, ctx.sink)?;
            }
        } else if is_leaf && scale >= MIN_SPLIT_SCALE {
            ctx.arena.subdivide(id, ctx.surface, ctx.sink)?;
        }

        match ctx.arena.get(id)?.children() {
            Some(children) => {
                for child in children {
                    self.refine_node(ctx, child, active)?;
                }
            }
            None => active.push(id),
        }
        Ok(())
    }
}
