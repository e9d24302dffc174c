//! Procedural heightfield: rolling fBm plains modulated by ridged mountains.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti};

use crate::HeightField;

/// Parameters for [`NoiseHeightField`].
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Seed shared by both noise layers.
    pub seed: u32,
    /// Octaves of the plains layer.
    pub octaves: usize,
    /// Frequency multiplier between plains octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between plains octaves.
    pub gain: f64,
    /// Share of the final elevation contributed by the ridged mountain layer.
    pub warp: f64,
    /// Feature frequency across the unit square.
    pub frequency: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            octaves: 6,
            lacunarity: 2.7,
            gain: 0.5,
            warp: 0.25,
            frequency: 4.0,
        }
    }
}

/// Deterministic procedural heightfield normalized to `[0, 1]`.
pub struct NoiseHeightField {
    plains: Fbm<Perlin>,
    mountains: RidgedMulti<Perlin>,
    params: NoiseParams,
}

impl NoiseHeightField {
    /// Create a procedural heightfield from `params`.
    pub fn new(params: NoiseParams) -> Self {
        let plains = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves.max(1))
            .set_frequency(params.frequency)
            .set_lacunarity(params.lacunarity)
            .set_persistence(params.gain);
        let mountains = RidgedMulti::<Perlin>::new(params.seed.wrapping_add(1))
            .set_octaves(2)
            .set_frequency(params.frequency * 0.5)
            .set_lacunarity(6.5);
        Self {
            plains,
            mountains,
            params,
        }
    }

    /// Parameters this field was built from.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}

impl HeightField for NoiseHeightField {
    fn sample(&self, u: f32, v: f32) -> f32 {
        let point = [u.clamp(0.0, 1.0) as f64, v.clamp(0.0, 1.0) as f64];
        let plains = self.plains.get(point) * 0.5 + 0.5;
        let ridges = self.mountains.get(point) * 0.5 + 0.5;
        let warp = self.params.warp.clamp(0.0, 1.0);
        (plains * (1.0 - warp) + ridges * warp).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = NoiseHeightField::new(NoiseParams::default());
        let b = NoiseHeightField::new(NoiseParams::default());
        for i in 0..50 {
            let u = i as f32 / 50.0;
            assert_eq!(a.sample(u, 1.0 - u), b.sample(u, 1.0 - u));
        }
    }

    #[test]
    fn test_output_stays_in_unit_range() {
        let field = NoiseHeightField::new(NoiseParams {
            seed: 7,
            ..Default::default()
        });
        for i in 0..=40 {
            for j in 0..=40 {
                let h = field.sample(i as f32 / 40.0, j as f32 / 40.0);
                assert!((0.0..=1.0).contains(&h), "height {h} out of range");
            }
        }
    }

    #[test]
    fn test_terrain_is_not_flat() {
        let field = NoiseHeightField::new(NoiseParams::default());
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..=32 {
            for j in 0..=32 {
                let h = field.sample(i as f32 / 32.0, j as f32 / 32.0);
                min = min.min(h);
                max = max.max(h);
            }
        }
        assert!(max - min > 0.05, "expected relief, got range {min}..{max}");
    }
}
