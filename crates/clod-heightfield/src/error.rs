//! Heightfield construction errors.

/// Errors that can occur when building a heightfield provider.
#[derive(Debug, thiserror::Error)]
pub enum HeightFieldError {
    /// The heightmap image could not be opened or decoded.
    #[error("failed to load heightmap image: {0}")]
    Image(#[from] image::ImageError),

    /// Bilinear filtering needs at least a 2x2 lattice.
    #[error("heightfield needs at least 2x2 samples, got {width}x{height}")]
    TooSmall { width: usize, height: usize },

    /// The sample buffer does not match the declared dimensions.
    #[error("expected {expected} samples for a {width}x{height} grid, got {actual}")]
    SampleCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}
