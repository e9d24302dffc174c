//! Quadtree nodes and the arena that owns them.
//!
//! Every patch lives in a [`PatchArena`] slot addressed by a [`PatchId`].
//! Parents hold their four children by id and children point back at their
//! parent; neither link owns memory, the arena does. Ids of cleared patches
//! are recycled.

use clod_heightfield::HeightField;
use glam::Vec3;
use tracing::{debug, warn};

use crate::{Aabb, ErrorGrid, NeighborMask, PatchMesh, RenderSink, Surface, TerrainError};

/// Smallest patch scale that may still be split. Children of a scale-4 patch
/// have scale 2, the finest level the error grid describes.
pub const MIN_SPLIT_SCALE: f32 = 4.0;

/// Offsets of the four children along `(left, forward)`, in child order.
const CHILD_OFFSETS: [(f32, f32); 4] = [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

/// Handle to a patch slot in a [`PatchArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(u32);

impl PatchId {
    /// Slot index inside the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One square node of the terrain quadtree.
#[derive(Clone, Debug)]
pub struct Patch {
    pub(crate) parent: Option<PatchId>,
    pub(crate) children: Option<[PatchId; 4]>,
    pub(crate) center: Vec3,
    pub(crate) axis_left: Vec3,
    pub(crate) axis_forward: Vec3,
    pub(crate) scale: f32,
    pub(crate) depth: u32,
    pub(crate) bounds: Aabb,
    pub(crate) neighbors: NeighborMask,
    pub(crate) mesh: Option<PatchMesh>,
    pub(crate) visible: bool,
    pub(crate) generated: bool,
    pub(crate) finalized: bool,
    pub(crate) textured: bool,
}

impl Patch {
    pub fn parent(&self) -> Option<PatchId> {
        self.parent
    }

    pub fn children(&self) -> Option<[PatchId; 4]> {
        self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Center in world space; `y` is the displaced elevation at the center.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn axis_left(&self) -> Vec3 {
        self.axis_left
    }

    pub fn axis_forward(&self) -> Vec3 {
        self.axis_forward
    }

    /// World edge length.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Culling volume.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Neighbour mask the current mesh was built with.
    pub fn neighbors(&self) -> NeighborMask {
        self.neighbors
    }

    pub fn mesh(&self) -> Option<&PatchMesh> {
        self.mesh.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Error-grid cell holding this patch's status.
    pub fn grid_cell(&self, half: i32) -> (i32, i32) {
        (self.center.x as i32 + half, self.center.z as i32 + half)
    }

    /// World-space planar position of a lattice point, `lx` and `lz` in `0..=2`.
    pub fn lattice_point(&self, lx: u32, lz: u32) -> Vec3 {
        let half = self.scale / 2.0;
        let planar = Vec3::new(self.center.x, 0.0, self.center.z);
        planar
            + self.axis_left * (lx as f32 - 1.0) * half
            + self.axis_forward * (lz as f32 - 1.0) * half
    }
}

/// Slot storage for every live patch of one terrain.
#[derive(Debug, Default)]
pub struct PatchArena {
    slots: Vec<Option<Patch>>,
    free: Vec<PatchId>,
    live: usize,
}

impl PatchArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live patches.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn patch(&self, id: PatchId) -> Option<&Patch> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn patch_mut(&mut self, id: PatchId) -> Option<&mut Patch> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`Self::patch`], but a dead id is an error.
    pub fn get(&self, id: PatchId) -> Result<&Patch, TerrainError> {
        self.patch(id).ok_or(TerrainError::UnknownPatch(id))
    }

    pub(crate) fn get_mut(&mut self, id: PatchId) -> Result<&mut Patch, TerrainError> {
        self.patch_mut(id).ok_or(TerrainError::UnknownPatch(id))
    }

    /// Live patches in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PatchId, &Patch)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|patch| (PatchId(i as u32), patch)))
    }

    /// Leaves below `root` in depth-first child order.
    pub fn leaves(&self, root: PatchId) -> Vec<PatchId> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(patch) = self.patch(id) else {
                continue;
            };
            match patch.children {
                Some(children) => stack.extend(children.iter().rev()),
                None => leaves.push(id),
            }
        }
        leaves
    }

    /// Create a leaf patch centered on the planar `position`.
    ///
    /// The center's height is sampled from `surface`; `position.y` is ignored.
    /// The sink receives a hidden render resource parented under `parent`'s.
    #[allow(clippy::too_many_arguments)]
    pub fn create<H: HeightField>(
        &mut self,
        parent: Option<PatchId>,
        position: Vec3,
        axis_left: Vec3,
        axis_forward: Vec3,
        scale: f32,
        surface: &Surface<H>,
        sink: &mut dyn RenderSink,
    ) -> PatchId {
        let center = Vec3::new(position.x, surface.elevation(position.x, position.z), position.z);
        let depth = parent
            .and_then(|p| self.patch(p))
            .map_or(0, |p| p.depth + 1);
        let patch = Patch {
            parent,
            children: None,
            center,
            axis_left,
            axis_forward,
            scale,
            depth,
            bounds: Aabb::from_center_half_extents(center, Vec3::splat(scale)),
            neighbors: NeighborMask::empty(),
            mesh: None,
            visible: false,
            generated: false,
            finalized: false,
            textured: false,
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(patch);
                id
            }
            None => {
                self.slots.push(Some(patch));
                PatchId((self.slots.len() - 1) as u32)
            }
        };
        self.live += 1;
        sink.create(id, parent);
        id
    }

    /// Split a leaf into four half-scale children, then dispose it.
    pub fn subdivide<H: HeightField>(
        &mut self,
        id: PatchId,
        surface: &Surface<H>,
        sink: &mut dyn RenderSink,
    ) -> Result<[PatchId; 4], TerrainError> {
        let patch = self.get(id)?;
        if patch.children.is_some() {
            return Err(TerrainError::AlreadySubdivided(id));
        }
        if patch.scale < MIN_SPLIT_SCALE {
            return Err(TerrainError::CannotSubdivide { scale: patch.scale });
        }

        let (center, left, forward, scale) =
            (patch.center, patch.axis_left, patch.axis_forward, patch.scale);
        let quarter = scale / 4.0;
        let children = CHILD_OFFSETS.map(|(l, f)| {
            let position = center + left * (l * quarter) + forward * (f * quarter);
            self.create(Some(id), position, left, forward, scale / 2.0, surface, sink)
        });

        self.get_mut(id)?.children = Some(children);
        self.dispose(id, sink)?;
        debug!(?id, scale, "subdivided patch");
        Ok(children)
    }

    /// Collapse `id` back into a leaf.
    ///
    /// Restores each child's status cell and then the patch's own cell from
    /// the duplicate one column to the left, then clears every descendant.
    /// Merging a leaf does nothing.
    pub fn merge(
        &mut self,
        id: PatchId,
        grid: &mut ErrorGrid,
        sink: &mut dyn RenderSink,
    ) -> Result<(), TerrainError> {
        let half = grid.half();
        let patch = self.get(id)?;
        let Some(children) = patch.children else {
            return Ok(());
        };
        let own_cell = patch.grid_cell(half);

        for child in children {
            let (x, z) = self.get(child)?.grid_cell(half);
            if !grid.restore_from_left(x, z) {
                warn!(?child, x, z, "no duplicate cell to restore from");
            }
        }
        if !grid.restore_from_left(own_cell.0, own_cell.1) {
            warn!(?id, x = own_cell.0, z = own_cell.1, "no duplicate cell to restore from");
        }

        self.collapse(id, sink);
        debug!(?id, "merged patch");
        Ok(())
    }

    fn collapse(&mut self, id: PatchId, sink: &mut dyn RenderSink) {
        let children = self.patch_mut(id).and_then(|patch| patch.children.take());
        for child in children.into_iter().flatten() {
            self.collapse(child, sink);
            self.clear(child, sink);
        }
    }

    /// Hide the patch and mark its mesh as stale.
    pub fn dispose(&mut self, id: PatchId, sink: &mut dyn RenderSink) -> Result<(), TerrainError> {
        self.set_visible(id, false, sink)?;
        self.get_mut(id)?.generated = false;
        Ok(())
    }

    /// Dispose the patch, destroy its render resource and free its slot.
    ///
    /// Children are not touched; callers clear bottom-up.
    pub fn clear(&mut self, id: PatchId, sink: &mut dyn RenderSink) {
        if self.dispose(id, sink).is_err() {
            return;
        }
        sink.destroy(id);
        self.slots[id.index()] = None;
        self.free.push(id);
        self.live -= 1;
    }

    /// Hide a patch and every descendant, keeping their meshes and flags.
    pub fn disable_recursive(&mut self, id: PatchId, sink: &mut dyn RenderSink) {
        let Some(patch) = self.patch(id) else {
            return;
        };
        let children = patch.children;
        // Ignoring the result: the id was just checked.
        let _ = self.set_visible(id, false, sink);
        for child in children.into_iter().flatten() {
            self.disable_recursive(child, sink);
        }
    }

    /// Show or hide a patch, telling the sink only when the state changes.
    pub fn set_visible(
        &mut self,
        id: PatchId,
        visible: bool,
        sink: &mut dyn RenderSink,
    ) -> Result<(), TerrainError> {
        let patch = self.get_mut(id)?;
        if patch.visible != visible {
            patch.visible = visible;
            sink.set_visible(id, visible);
        }
        Ok(())
    }

    /// Clear every patch below and including `root`.
    pub fn release(&mut self, root: PatchId, sink: &mut dyn RenderSink) {
        self.collapse(root, sink);
        self.clear(root, sink);
    }
}
