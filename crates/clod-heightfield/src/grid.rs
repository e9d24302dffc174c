//! Lattice-aligned heightfield backed by an in-memory sample buffer.

use crate::{HeightField, HeightFieldError, bilinear};

/// A row-major grid of elevation samples.
///
/// The corner samples sit exactly on the unit-square corners, so `u = i / (width - 1)`
/// returns sample column `i` without filtering. This makes it the natural
/// provider for terrains whose grid resolution matches the sample lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct GridHeightField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl GridHeightField {
    /// Wrap an existing sample buffer.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, HeightFieldError> {
        if width < 2 || height < 2 {
            return Err(HeightFieldError::TooSmall { width, height });
        }
        let expected = width * height;
        if samples.len() != expected {
            return Err(HeightFieldError::SampleCount {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a grid by evaluating `f(column, row)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> f32,
    ) -> Result<Self, HeightFieldError> {
        let mut samples = Vec::with_capacity(width * height);
        for row in 0..height {
            for column in 0..width {
                samples.push(f(column, row));
            }
        }
        Self::new(width, height, samples)
    }

    /// Number of sample columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of sample rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw sample at `(column, row)`, or `None` if out of range.
    pub fn get(&self, column: usize, row: usize) -> Option<f32> {
        if column < self.width && row < self.height {
            Some(self.samples[row * self.width + column])
        } else {
            None
        }
    }
}

impl HeightField for GridHeightField {
    fn sample(&self, u: f32, v: f32) -> f32 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        bilinear(&self.samples, self.width, self.height, fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_dimensions() {
        let err = GridHeightField::new(1, 4, vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, HeightFieldError::TooSmall { width: 1, height: 4 }));
    }

    #[test]
    fn test_rejects_wrong_sample_count() {
        let err = GridHeightField::new(3, 3, vec![0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            HeightFieldError::SampleCount {
                expected: 9,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_lattice_points_sample_exactly() {
        let field = GridHeightField::from_fn(17, 17, |x, z| (x * 17 + z) as f32 / 289.0).unwrap();
        for (x, z) in [(0, 0), (6, 6), (16, 3), (9, 16)] {
            let expected = field.get(x, z).unwrap();
            let got = field.sample(x as f32 / 16.0, z as f32 / 16.0);
            assert_eq!(got, expected, "sample mismatch at ({x}, {z})");
        }
    }

    #[test]
    fn test_out_of_range_coordinates_clamp_to_edges() {
        let field = GridHeightField::from_fn(3, 3, |x, _| x as f32 * 0.5).unwrap();
        assert_eq!(field.sample(-2.0, 0.5), 0.0);
        assert_eq!(field.sample(7.0, 0.5), 1.0);
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let field = GridHeightField::from_fn(2, 2, |_, _| 0.0).unwrap();
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.get(0, 2), None);
    }
}
