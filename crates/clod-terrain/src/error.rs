//! Terrain engine error types.

use crate::PatchId;

/// Errors raised by terrain construction and quadtree operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// The terrain scale cannot be halved down to the minimum patch size.
    #[error("terrain scale must be a power of two of at least 4, got {0}")]
    InvalidScale(f32),

    /// `min_resolution <= 1` makes the error floor and split metric singular.
    #[error("min_resolution must be finite and greater than 1, got {0}")]
    InvalidMinResolution(f32),

    /// The detail multiplier must be usable in the split metric.
    #[error("detail_level must be finite and non-negative, got {0}")]
    InvalidDetailLevel(f32),

    /// Vertical exaggeration must be a finite number.
    #[error("height_scale must be finite, got {0}")]
    InvalidHeightScale(f32),

    /// The patch is already at the minimum scale.
    #[error("patch of scale {scale} is below the minimum splittable scale")]
    CannotSubdivide { scale: f32 },

    /// Subdivision was requested on a patch that already has children.
    #[error("patch {0:?} is already subdivided")]
    AlreadySubdivided(PatchId),

    /// The id does not refer to a live patch.
    #[error("no live patch with id {0:?}")]
    UnknownPatch(PatchId),
}
