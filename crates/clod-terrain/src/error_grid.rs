//! Per-cell roughness grid shared by every level of the quadtree.
//!
//! The grid has one cell per integer grid coordinate of the terrain. During
//! construction each patch center receives an 8-bit roughness estimate for its
//! detail level. During traversal the same cells double as per-patch status
//! markers: [`SPLIT`] for patches that want finer detail and [`UNSPLIT`] for
//! leaves that are fine enough or culled. Any other value means "no patch of
//! this size is active here", which is what crack stitching looks for.

use tracing::debug;

use crate::params::error_floor_factor;

/// Status written by traversal for a patch that wants finer detail.
pub const SPLIT: i32 = 255;

/// Status written by traversal for a leaf that needs no further detail, or
/// for a culled patch.
pub const UNSPLIT: i32 = 0;

/// Value every cell holds before roughness propagation.
const INITIAL: i32 = 1;

/// Whether a cell value marks a neighbour at a different resolution.
pub fn is_resolution_boundary(value: i32) -> bool {
    value != SPLIT && value != UNSPLIT
}

/// Square grid of roughness / status values, `scale + 1` cells per side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorGrid {
    side: usize,
    cells: Vec<i32>,
}

impl ErrorGrid {
    /// Create a grid with every cell set to the initial value of 1.
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: vec![INITIAL; side * side],
        }
    }

    /// Precompute roughness for every power-of-two detail level.
    ///
    /// `height_at(x, z)` samples the normalized heightfield at grid
    /// coordinates. `scale` must be a power of two of at least 4; callers go
    /// through [`crate::TerrainParams::validate`] first.
    pub fn build(height_at: impl Fn(f32, f32) -> f32, scale: u32, min_resolution: f32) -> Self {
        let mut grid = Self::new(scale as usize + 1);
        let upper_bound = error_floor_factor(min_resolution);
        let scale = scale as i32;

        let mut edge_len = 4;
        while edge_len <= scale {
            let offset = edge_len / 2;
            for z in (offset..scale).step_by(edge_len as usize) {
                for x in (offset..scale).step_by(edge_len as usize) {
                    grid.propagate_cell(&height_at, x, z, edge_len, upper_bound);
                }
            }
            debug!(edge_len, "propagated roughness level");
            edge_len *= 2;
        }
        grid
    }

    /// Estimate and record the roughness of the square centered on `(x, z)`.
    fn propagate_cell(
        &mut self,
        height_at: &impl Fn(f32, f32) -> f32,
        x: i32,
        z: i32,
        edge_len: i32,
        upper_bound: f32,
    ) {
        let offset = edge_len / 2;
        let child = edge_len / 4;
        let h = |dx: i32, dz: i32| height_at((x + dx) as f32, (z + dz) as f32);
        let deviation = |a: f32, b: f32, mid: f32| ((a + b) / 2.0 - mid).abs();

        // Edge midpoints, then both diagonals through the center.
        let mut d2 = deviation(h(-offset, offset), h(offset, offset), h(0, offset));
        d2 = d2.max(deviation(h(offset, offset), h(offset, -offset), h(offset, 0)));
        d2 = d2.max(deviation(h(-offset, -offset), h(offset, -offset), h(0, -offset)));
        d2 = d2.max(deviation(h(-offset, offset), h(-offset, -offset), h(-offset, 0)));
        d2 = d2.max(deviation(h(-offset, -offset), h(offset, offset), h(0, 0)));
        d2 = d2.max(deviation(h(offset, -offset), h(-offset, offset), h(0, 0)));

        // Never 0, or a leaf-level value would read as the unsplit marker.
        let mut error = ((d2 * 255.0 * 4.0 / edge_len as f32).ceil() as i32).max(1);

        let max_height = if edge_len == 4 {
            let mut max_height = f32::MIN;
            for dz in [-offset, 0, offset] {
                for dx in [-offset, 0, offset] {
                    max_height = max_height.max(h(dx, dz));
                }
            }
            max_height
        } else {
            for (nx, nz) in [
                (x, z),
                (x - offset, z),
                (x + offset, z),
                (x, z - offset),
                (x, z + offset),
            ] {
                error = error.max((upper_bound * self.value(nx, nz) as f32) as i32);
            }
            h(child, child)
                .max(h(child, -child))
                .max(h(-child, -child))
                .max(h(-child, child))
        };

        self.set(x + 1, z, (max_height * 255.0).ceil() as i32);
        self.set(x, z, error);
        // Duplicate read back when a merged patch restores its cell.
        self.set(x - 1, z, error);

        for (cx, cz) in [
            (x - offset, z - offset),
            (x - offset, z + offset),
            (x + offset, z + offset),
            (x + offset, z - offset),
        ] {
            self.raise(cx, cz, error);
        }
    }

    /// Cells per side.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Offset from a world coordinate to its grid coordinate.
    pub fn half(&self) -> i32 {
        (self.side / 2) as i32
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let side = self.side as i32;
        if (0..side).contains(&x) && (0..side).contains(&z) {
            Some(z as usize * self.side + x as usize)
        } else {
            None
        }
    }

    /// Value at `(x, z)`, or `None` outside the grid.
    pub fn get(&self, x: i32, z: i32) -> Option<i32> {
        self.index(x, z).map(|i| self.cells[i])
    }

    /// Value at `(x, z)`, reading cells outside the grid as [`UNSPLIT`].
    pub fn value(&self, x: i32, z: i32) -> i32 {
        self.get(x, z).unwrap_or(UNSPLIT)
    }

    /// Overwrite `(x, z)`. Returns `false` and leaves the grid untouched when
    /// the cell is outside the grid.
    pub fn set(&mut self, x: i32, z: i32, value: i32) -> bool {
        match self.index(x, z) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    fn raise(&mut self, x: i32, z: i32, value: i32) {
        if let Some(i) = self.index(x, z) {
            self.cells[i] = self.cells[i].max(value);
        }
    }

    /// Restore `(x, z)` from the duplicate stored one cell to its left.
    ///
    /// Returns `false` without writing when `x` is the leftmost column, since
    /// there is no duplicate to read. Patch cells never sit in that column.
    pub fn restore_from_left(&mut self, x: i32, z: i32) -> bool {
        match self.get(x - 1, z) {
            Some(value) => self.set(x, z, value),
            None => false,
        }
    }
}
