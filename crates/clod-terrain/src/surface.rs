//! World-space access to the terrain's heightfield.

use clod_heightfield::HeightField;

/// Maps world and grid coordinates onto a normalized heightfield.
///
/// Grid coordinates run from 0 to `scale`; world coordinates are the same
/// values shifted by `-scale / 2`, so the terrain is centered on the origin.
pub struct Surface<H> {
    field: H,
    scale: f32,
    height_scale: f32,
}

impl<H: HeightField> Surface<H> {
    /// Wrap `field` for a terrain of edge length `scale`.
    pub fn new(field: H, scale: f32, height_scale: f32) -> Self {
        Self {
            field,
            scale,
            height_scale,
        }
    }

    /// Normalized height at grid coordinates, clamped to the heightfield domain.
    pub fn height_at(&self, grid_x: f32, grid_z: f32) -> f32 {
        let u = (grid_x / self.scale).clamp(0.0, 1.0);
        let v = (grid_z / self.scale).clamp(0.0, 1.0);
        self.field.sample(u, v)
    }

    /// Displaced world elevation at world coordinates `(x, z)`.
    pub fn elevation(&self, x: f32, z: f32) -> f32 {
        let half = self.scale / 2.0;
        self.height_at(x + half, z + half) * self.height_scale
    }

    /// The wrapped heightfield.
    pub fn field(&self) -> &H {
        &self.field
    }

    /// Terrain edge length.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Vertical exaggeration.
    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }
}
