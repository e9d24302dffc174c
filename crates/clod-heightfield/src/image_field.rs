//! Grayscale image heightmaps.

use std::path::Path;

use tracing::debug;

use crate::{HeightField, HeightFieldError, bilinear};

/// Heightfield sampled from the luminance of an image.
///
/// Sampling follows texture conventions: texel centers sit at
/// `(i + 0.5) / width`, and coordinates outside the image clamp to the edge.
#[derive(Clone, Debug)]
pub struct ImageHeightField {
    width: usize,
    height: usize,
    luma: Vec<f32>,
}

impl ImageHeightField {
    /// Decode a heightmap from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HeightFieldError> {
        let path = path.as_ref();
        let image = image::open(path)?;
        let field = Self::from_image(&image)?;
        debug!(
            path = %path.display(),
            width = field.width,
            height = field.height,
            "loaded heightmap"
        );
        Ok(field)
    }

    /// Convert a decoded image into a heightfield.
    pub fn from_image(image: &image::DynamicImage) -> Result<Self, HeightFieldError> {
        let gray = image.to_luma32f();
        let (width, height) = (gray.width() as usize, gray.height() as usize);
        if width == 0 || height == 0 {
            return Err(HeightFieldError::TooSmall { width, height });
        }
        Ok(Self {
            width,
            height,
            luma: gray.into_raw(),
        })
    }

    /// Image width in texels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in texels.
    pub fn height(&self) -> usize {
        self.height
    }
}

impl HeightField for ImageHeightField {
    fn sample(&self, u: f32, v: f32) -> f32 {
        let fx = (u.clamp(0.0, 1.0) * self.width as f32 - 0.5).clamp(0.0, (self.width - 1) as f32);
        let fy =
            (v.clamp(0.0, 1.0) * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        bilinear(&self.luma, self.width, self.height, fx, fy)
    }
}
