//! Heightfield providers for the terrain engine.
//!
//! Every provider answers [`HeightField::sample`] for a normalized `(u, v)`
//! coordinate in `[0, 1] x [0, 1]` and returns an elevation in `[0, 1]`.
//! Inputs outside the unit square are clamped to the nearest edge.

mod error;
mod grid;
mod image_field;
mod noise_field;

use std::sync::Arc;

pub use error::HeightFieldError;
pub use grid::GridHeightField;
pub use image_field::ImageHeightField;
pub use noise_field::{NoiseHeightField, NoiseParams};

/// Read-only elevation source queried by normalized coordinate.
pub trait HeightField {
    /// Bilinear-filtered elevation at `(u, v)`.
    fn sample(&self, u: f32, v: f32) -> f32;
}

impl<T: HeightField + ?Sized> HeightField for &T {
    fn sample(&self, u: f32, v: f32) -> f32 {
        (**self).sample(u, v)
    }
}

impl<T: HeightField + ?Sized> HeightField for Box<T> {
    fn sample(&self, u: f32, v: f32) -> f32 {
        (**self).sample(u, v)
    }
}

impl<T: HeightField + ?Sized> HeightField for Arc<T> {
    fn sample(&self, u: f32, v: f32) -> f32 {
        (**self).sample(u, v)
    }
}

/// A perfectly level heightfield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatHeightField(pub f32);

impl HeightField for FlatHeightField {
    fn sample(&self, _u: f32, _v: f32) -> f32 {
        self.0
    }
}

/// Bilinear interpolation over a row-major sample buffer.
///
/// `fx` and `fy` are continuous sample-space coordinates and must already be
/// clamped to `[0, width - 1]` and `[0, height - 1]`.
pub(crate) fn bilinear(samples: &[f32], width: usize, height: usize, fx: f32, fy: f32) -> f32 {
    let x0 = (fx.floor() as usize).min(width - 1);
    let y0 = (fy.floor() as usize).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let at = |x: usize, y: usize| samples[y * width + x];
    let top = at(x0, y0) + (at(x1, y0) - at(x0, y0)) * tx;
    let bottom = at(x0, y1) + (at(x1, y1) - at(x0, y1)) * tx;
    top + (bottom - top) * ty
}
