//! Construction parameters and their validation.

use crate::TerrainError;

/// Parameters that shape a terrain instance.
///
/// `detail_level` and `min_resolution` can be changed between frames through
/// [`crate::Terrain::set_detail_level`] and [`crate::Terrain::set_min_resolution`];
/// the error grid is not rebuilt when they change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    /// World edge length of the root patch. Must be a power of two, at least 4.
    pub scale: f32,
    /// Multiplier applied to patch error in the split metric.
    pub detail_level: f32,
    /// Split threshold denominator and error-floor control. Must exceed 1.
    pub min_resolution: f32,
    /// Vertical exaggeration applied to normalized heights.
    pub height_scale: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 256.0,
            detail_level: 5.0,
            min_resolution: 2.0,
            height_scale: 50.0,
        }
    }
}

impl TerrainParams {
    /// Check every parameter, returning the first problem found.
    pub fn validate(&self) -> Result<(), TerrainError> {
        grid_scale(self.scale)?;
        check_detail_level(self.detail_level)?;
        check_min_resolution(self.min_resolution)?;
        if !self.height_scale.is_finite() {
            return Err(TerrainError::InvalidHeightScale(self.height_scale));
        }
        Ok(())
    }
}

/// Integer grid scale for a validated float scale.
pub(crate) fn grid_scale(scale: f32) -> Result<u32, TerrainError> {
    if !scale.is_finite() || scale < 4.0 || scale.fract() != 0.0 || scale > u16::MAX as f32 {
        return Err(TerrainError::InvalidScale(scale));
    }
    let grid = scale as u32;
    if !grid.is_power_of_two() {
        return Err(TerrainError::InvalidScale(scale));
    }
    Ok(grid)
}

pub(crate) fn check_detail_level(detail_level: f32) -> Result<(), TerrainError> {
    if detail_level.is_finite() && detail_level >= 0.0 {
        Ok(())
    } else {
        Err(TerrainError::InvalidDetailLevel(detail_level))
    }
}

pub(crate) fn check_min_resolution(min_resolution: f32) -> Result<(), TerrainError> {
    if min_resolution.is_finite() && min_resolution > 1.0 {
        Ok(())
    } else {
        Err(TerrainError::InvalidMinResolution(min_resolution))
    }
}

/// Factor by which a coarser level's error is floored against its neighbours.
///
/// Equals `min_resolution / (2 * (min_resolution - 1))`, which is 1 for the
/// default `min_resolution` of 2.
pub fn error_floor_factor(min_resolution: f32) -> f32 {
    1.0 * min_resolution / (2.0 * (min_resolution - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert_eq!(TerrainParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_scale_must_be_power_of_two() {
        for bad in [0.0, 2.0, 3.0, 12.0, 100.0, 16.5, f32::NAN, f32::INFINITY, -16.0] {
            let params = TerrainParams {
                scale: bad,
                ..Default::default()
            };
            assert!(
                matches!(params.validate(), Err(TerrainError::InvalidScale(_))),
                "scale {bad} should be rejected"
            );
        }
        for good in [4.0, 8.0, 16.0, 256.0, 4096.0] {
            assert_eq!(grid_scale(good), Ok(good as u32));
        }
    }

    #[test]
    fn test_min_resolution_must_exceed_one() {
        for bad in [1.0, 0.5, -2.0, f32::NAN] {
            assert!(check_min_resolution(bad).is_err(), "{bad} should be rejected");
        }
        assert!(check_min_resolution(1.01).is_ok());
    }

    #[test]
    fn test_detail_level_must_be_non_negative() {
        assert!(check_detail_level(-0.1).is_err());
        assert!(check_detail_level(f32::INFINITY).is_err());
        assert!(check_detail_level(0.0).is_ok());
    }

    #[test]
    fn test_height_scale_must_be_finite() {
        let params = TerrainParams {
            height_scale: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(TerrainError::InvalidHeightScale(_))
        ));
    }

    #[test]
    fn test_error_floor_factor() {
        assert_eq!(error_floor_factor(2.0), 1.0);
        assert_eq!(error_floor_factor(1.5), 1.5);
        assert!((error_floor_factor(5.0) - 0.625).abs() < 1e-6);
    }
}
