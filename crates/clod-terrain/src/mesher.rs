//! Triangle-fan meshing of active patches with crack stitching.
//!
//! Every leaf is drawn as a fan around its center over a 3x3 lattice. When a
//! neighbour on one side is rendered at a coarser resolution, the midpoint on
//! that edge is dropped so the shared edge collapses to the neighbour's single
//! segment and no T-junction remains.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use clod_heightfield::HeightField;
use glam::Vec3;
use tracing::{trace, warn};

use crate::error_grid::is_resolution_boundary;
use crate::{Aabb, ErrorGrid, Patch, PatchArena, PatchId, PatchMaterial, RenderSink, Surface, TerrainError};

bitflags! {
    /// Sides of a patch whose neighbour is rendered at a different resolution.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NeighborMask: u8 {
        /// +z
        const FORWARD = 1;
        /// -z
        const BACK = 2;
        /// +x, the patch's left axis
        const LEFT = 4;
        /// -x
        const RIGHT = 8;
    }
}

/// Perimeter of the fan in lattice coordinates, each midpoint paired with the
/// side whose flag removes it.
const PERIMETER: [((u32, u32), Option<NeighborMask>); 8] = [
    ((0, 0), None),
    ((1, 0), Some(NeighborMask::BACK)),
    ((2, 0), None),
    ((2, 1), Some(NeighborMask::LEFT)),
    ((2, 2), None),
    ((1, 2), Some(NeighborMask::FORWARD)),
    ((0, 2), None),
    ((0, 1), Some(NeighborMask::RIGHT)),
];

/// Read the four cardinal cells one patch-scale away from `cell`.
///
/// Cells outside the grid are skipped, so edges of the terrain never stitch.
pub fn neighbor_mask(grid: &ErrorGrid, cell: (i32, i32), step: i32) -> NeighborMask {
    let (x, z) = cell;
    [
        (NeighborMask::FORWARD, x, z + step),
        (NeighborMask::BACK, x, z - step),
        (NeighborMask::LEFT, x + step, z),
        (NeighborMask::RIGHT, x - step, z),
    ]
    .into_iter()
    .filter(|&(_, nx, nz)| grid.get(nx, nz).is_some_and(is_resolution_boundary))
    .fold(NeighborMask::empty(), |mask, (side, _, _)| mask | side)
}

/// A single mesh vertex, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PatchVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Unit normal, or zero for degenerate geometry.
    pub normal: [f32; 3],
    /// Texture coordinates in `[0, 1]`.
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(PatchVertex, [u8; 32]);

/// Geometry of one patch.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchMesh {
    pub vertices: Vec<PatchVertex>,
    /// Triangle list, 3 indices per triangle.
    pub indices: Vec<u32>,
    /// Bounds of the displaced vertices.
    pub bounds: Aabb,
}

impl PatchMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions as vectors.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| Vec3::from(v.position))
    }

    /// Recompute vertex normals as the area-weighted sum of adjacent face normals.
    pub fn recalculate_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[a].position);
            let p1 = Vec3::from(self.vertices[b].position);
            let p2 = Vec3::from(self.vertices[c].position);
            let face = (p1 - p0).cross(p2 - p0);
            sums[a] += face;
            sums[b] += face;
            sums[c] += face;
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = sum.normalize_or_zero().to_array();
        }
    }

    /// Recompute `bounds` from the current vertex positions.
    pub fn recalculate_bounds(&mut self) {
        if let Some(bounds) = Aabb::from_points(self.positions()) {
            self.bounds = bounds;
        }
    }
}

/// Build the undisplaced fan for `patch`, dropping midpoints on `mask` sides.
pub fn build_fan(patch: &Patch, mask: NeighborMask) -> PatchMesh {
    let lattice = std::iter::once((1, 1)).chain(
        PERIMETER
            .iter()
            .filter(|(_, side)| side.is_none_or(|side| !mask.contains(side)))
            .map(|(point, _)| *point),
    );
    let vertices: Vec<PatchVertex> = lattice
        .map(|(lx, lz)| PatchVertex {
            position: patch.lattice_point(lx, lz).to_array(),
            normal: [0.0; 3],
            uv: [lx as f32 / 2.0, lz as f32 / 2.0],
        })
        .collect();

    let last = vertices.len() as u32 - 1;
    let mut indices = Vec::with_capacity(3 * last as usize);
    for i in 1..last {
        indices.extend_from_slice(&[0, i + 1, i]);
    }
    indices.extend_from_slice(&[0, 1, last]);

    let mut mesh = PatchMesh {
        vertices,
        indices,
        bounds: *patch.bounds(),
    };
    mesh.recalculate_bounds();
    mesh
}

/// Result of [`PatchMesher::generate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A new mesh was built.
    Generated,
    /// The existing mesh already matches the neighbour mask.
    Reused,
}

/// Builds, displaces and uploads patch meshes.
#[derive(Clone, Debug, Default)]
pub struct PatchMesher {
    material: PatchMaterial,
}

impl PatchMesher {
    pub fn new(material: PatchMaterial) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &PatchMaterial {
        &self.material
    }

    /// Show an active patch and make sure its fan matches its neighbours.
    ///
    /// A rebuilt mesh must be [`finalized`](Self::finalize) before upload.
    /// The parent's now-superseded mesh is disposed.
    pub fn generate(
        &self,
        arena: &mut PatchArena,
        grid: &ErrorGrid,
        id: PatchId,
        sink: &mut dyn RenderSink,
    ) -> Result<GenerateOutcome, TerrainError> {
        let patch = arena.get(id)?;
        let mask = neighbor_mask(grid, patch.grid_cell(grid.half()), patch.scale as i32);
        let parent = patch.parent;

        arena.set_visible(id, true, sink)?;
        let patch = arena.get_mut(id)?;
        if patch.generated && patch.neighbors == mask && patch.mesh.is_some() {
            return Ok(GenerateOutcome::Reused);
        }

        patch.mesh = Some(build_fan(patch, mask));
        patch.neighbors = mask;
        patch.finalized = false;
        if let Some(parent) = parent {
            arena.dispose(parent, sink)?;
        }
        arena.get_mut(id)?.generated = true;
        trace!(?id, ?mask, "generated patch mesh");
        Ok(GenerateOutcome::Generated)
    }

    /// Displace, shade and upload a generated mesh.
    ///
    /// Returns `false` when there was nothing to do: the mesh is already
    /// finalized or was never generated.
    pub fn finalize<H: HeightField>(
        &self,
        arena: &mut PatchArena,
        surface: &Surface<H>,
        id: PatchId,
        sink: &mut dyn RenderSink,
    ) -> Result<bool, TerrainError> {
        let patch = arena.get_mut(id)?;
        if patch.finalized {
            return Ok(false);
        }
        let apply_material = !patch.textured;
        let Some(mesh) = patch.mesh.as_mut() else {
            warn!(?id, "finalize called before generate");
            return Ok(false);
        };

        for vertex in &mut mesh.vertices {
            let [x, _, z] = vertex.position;
            vertex.position[1] = surface.elevation(x, z);
        }
        mesh.recalculate_normals();
        mesh.recalculate_bounds();

        if apply_material {
            sink.apply_material(id, &self.material);
        }
        sink.upload(id, mesh);
        patch.textured = true;
        patch.finalized = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSink;
    use clod_heightfield::FlatHeightField;

    fn arena_with_root(scale: f32) -> (PatchArena, Surface<FlatHeightField>, PatchId) {
        let surface = Surface::new(FlatHeightField(0.5), scale, 50.0);
        let mut arena = PatchArena::new();
        let root = arena.create(None, Vec3::ZERO, Vec3::X, Vec3::Z, scale, &surface, &mut RecordingSink::new());
        (arena, surface, root)
    }

    fn lattice_of(mesh: &PatchMesh) -> Vec<[f32; 2]> {
        mesh.vertices.iter().map(|v| v.uv).collect()
    }

    #[test]
    fn test_full_fan_has_nine_vertices_and_eight_triangles() {
        let (arena, _, root) = arena_with_root(16.0);
        let mesh = build_fan(arena.get(root).unwrap(), NeighborMask::empty());
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[1].position, [-8.0, 0.0, -8.0]);
        assert_eq!(&mesh.indices[..6], &[0, 2, 1, 0, 3, 2]);
        assert_eq!(&mesh.indices[21..], &[0, 1, 8]);
    }

    #[test]
    fn test_flagged_sides_drop_midpoints() {
        let (arena, _, root) = arena_with_root(16.0);
        let patch = arena.get(root).unwrap();

        let mesh = build_fan(patch, NeighborMask::BACK | NeighborMask::RIGHT);
        assert_eq!(
            lattice_of(&mesh),
            vec![[0.5, 0.5], [0.0, 0.0], [1.0, 0.0], [1.0, 0.5], [1.0, 1.0], [0.5, 1.0], [0.0, 1.0]]
        );
        assert_eq!(mesh.triangle_count(), 6);

        let mesh = build_fan(patch, NeighborMask::all());
        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_fan_faces_up() {
        let (arena, _, root) = arena_with_root(8.0);
        let mut mesh = build_fan(arena.get(root).unwrap(), NeighborMask::LEFT);
        mesh.recalculate_normals();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_neighbor_mask_reads_boundary_cells() {
        let mut grid = ErrorGrid::new(17);
        for (x, z, v) in [(8, 12, 0), (8, 4, 17), (12, 8, 255), (4, 8, 1)] {
            grid.set(x, z, v);
        }
        let mask = neighbor_mask(&grid, (8, 8), 4);
        assert_eq!(mask, NeighborMask::BACK | NeighborMask::RIGHT);
        // Out-of-grid neighbours never flag a side.
        let mask = neighbor_mask(&grid, (8, 8), 16);
        assert_eq!(mask, NeighborMask::empty());
    }

    #[test]
    fn test_generate_then_finalize_uploads_once() {
        let (mut arena, surface, root) = arena_with_root(16.0);
        let grid = ErrorGrid::new(17);
        let mesher = PatchMesher::default();
        let mut sink = RecordingSink::new();
        sink.create(root, None);

        let outcome = mesher.generate(&mut arena, &grid, root, &mut sink).unwrap();
        assert_eq!(outcome, GenerateOutcome::Generated);
        assert!(mesher.finalize(&mut arena, &surface, root, &mut sink).unwrap());
        assert!(!mesher.finalize(&mut arena, &surface, root, &mut sink).unwrap());

        let recorded = sink.get(root).unwrap();
        assert!(recorded.visible);
        assert_eq!(recorded.material, Some(PatchMaterial::default()));
        let mesh = recorded.mesh.as_ref().unwrap();
        assert!(mesh.positions().all(|p| p.y == 25.0));
        assert_eq!(mesh.bounds.min.y, 25.0);
        assert_eq!(sink.stats().uploads, 1);

        let outcome = mesher.generate(&mut arena, &grid, root, &mut sink).unwrap();
        assert_eq!(outcome, GenerateOutcome::Reused);
        assert_eq!(sink.stats().uploads, 1);
    }

    #[test]
    fn test_material_is_applied_once_per_patch() {
        let (mut arena, surface, root) = arena_with_root(16.0);
        let grid = ErrorGrid::new(17);
        let mesher = PatchMesher::default();
        let mut sink = RecordingSink::new();

        mesher.generate(&mut arena, &grid, root, &mut sink).unwrap();
        mesher.finalize(&mut arena, &surface, root, &mut sink).unwrap();

        // Disposal forces a rebuild and re-upload, but no new material.
        arena.dispose(root, &mut sink).unwrap();
        assert_eq!(
            mesher.generate(&mut arena, &grid, root, &mut sink).unwrap(),
            GenerateOutcome::Generated
        );
        mesher.finalize(&mut arena, &surface, root, &mut sink).unwrap();
        assert_eq!(sink.stats().uploads, 2);
        assert_eq!(sink.stats().materials, 1);
    }

    #[test]
    fn test_finalize_without_mesh_does_nothing() {
        let (mut arena, surface, root) = arena_with_root(16.0);
        let mut sink = RecordingSink::new();
        assert!(!PatchMesher::default().finalize(&mut arena, &surface, root, &mut sink).unwrap());
        assert_eq!(sink.stats().uploads, 0);
    }
}
