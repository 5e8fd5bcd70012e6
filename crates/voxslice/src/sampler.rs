//! Sampling a voxel volume at fractional coordinates.

use serde::{Deserialize, Serialize};
use voxslice_math::{Point3, Transform};

use crate::volume::{Sample, VoxelVolume, TRANSPARENT};

/// How samples between voxel centers are reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Value of the closest voxel.
    #[default]
    Nearest,
    /// Blend of the four closest voxels within one stack image.
    Bilinear,
}

/// What to return for coordinates outside the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Clamp to the nearest voxel on the border.
    #[default]
    Clamp,
    /// Return a fixed sample.
    Background(Sample),
}

/// Samples a volume with a fixed interpolation and boundary policy.
#[derive(Debug, Clone)]
pub struct VoxelSampler<'a> {
    volume: &'a VoxelVolume,
    to_voxel: Transform,
    interpolation: Interpolation,
    boundary: Boundary,
}

impl<'a> VoxelSampler<'a> {
    /// Create a sampler over `volume`.
    pub fn new(volume: &'a VoxelVolume, interpolation: Interpolation, boundary: Boundary) -> Self {
        Self {
            volume,
            to_voxel: volume.world_to_voxel_transform(),
            interpolation,
            boundary,
        }
    }

    /// Sample at a world-space position.
    pub fn sample_world(&self, p: &Point3) -> Sample {
        self.sample(&self.to_voxel.apply_point(p))
    }

    /// Sample at fractional voxel coordinates (voxel centers are integers).
    ///
    /// Never fails: out-of-range coordinates are clamped or replaced by the
    /// background sample. An empty volume yields the background (or
    /// transparent in clamp mode).
    pub fn sample(&self, v: &Point3) -> Sample {
        if self.volume.is_empty() {
            return self.background();
        }
        if let Boundary::Background(background) = self.boundary {
            if self.is_outside(v) {
                return background;
            }
        }
        match self.interpolation {
            Interpolation::Nearest => self.nearest(v),
            Interpolation::Bilinear => self.bilinear(v),
        }
    }

    fn background(&self) -> Sample {
        match self.boundary {
            Boundary::Background(background) => background,
            Boundary::Clamp => TRANSPARENT,
        }
    }

    fn is_outside(&self, v: &Point3) -> bool {
        let counts = self.volume.counts();
        let out = |c: f64, n: usize| !(-0.5..=n as f64 - 0.5).contains(&c);
        out(v.x, counts.x) || out(v.y, counts.y) || out(v.z, counts.z)
    }

    fn at(&self, x: usize, y: usize, z: usize) -> Sample {
        self.volume.get(x, y, z).unwrap_or_else(|| self.background())
    }

    fn nearest(&self, v: &Point3) -> Sample {
        let counts = self.volume.counts();
        self.at(
            nearest_index(v.x, counts.x),
            nearest_index(v.y, counts.y),
            nearest_index(v.z, counts.z),
        )
    }

    /// Bilinear blend on the (column, row) plane of the nearest stack image.
    fn bilinear(&self, v: &Point3) -> Sample {
        let counts = self.volume.counts();
        let layer = nearest_index(v.x, counts.x);

        let col = v.z.clamp(0.0, (counts.z - 1) as f64);
        let row = v.y.clamp(0.0, (counts.y - 1) as f64);
        let (z0, y0) = (col.floor() as usize, row.floor() as usize);

        if z0 + 1 >= counts.z || y0 + 1 >= counts.y {
            return self.at(layer, y0, z0);
        }

        let (dx, dy) = (col - z0 as f64, row - y0 as f64);
        let a = self.at(layer, y0, z0);
        let b = self.at(layer, y0, z0 + 1);
        let c = self.at(layer, y0 + 1, z0);
        let d = self.at(layer, y0 + 1, z0 + 1);

        std::array::from_fn(|i| {
            let (a, b, c, d) = (a[i] as f64, b[i] as f64, c[i] as f64, d[i] as f64);
            let x1 = a + (b - a) * dx;
            let x2 = c + (d - c) * dx;
            (x1 + (x2 - x1) * dy + 0.5) as u8
        })
    }
}

/// Round to the closest index and clamp into `[0, n - 1]`.
fn nearest_index(c: f64, n: usize) -> usize {
    let max = n.saturating_sub(1) as f64;
    (c + 0.5).floor().clamp(0.0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VoxelCounts;
    use voxslice_math::{Pose, Vec3};

    /// 2 layers of 3 rows by 4 columns, one world unit per voxel.
    fn gradient() -> VoxelVolume {
        VoxelVolume::from_fn(
            VoxelCounts::new(2, 3, 4),
            Vec3::new(4.0, 3.0, 2.0),
            Pose::from_euler_degrees(Point3::new(1.0, 2.0, 3.0), [10.0, 20.0, 30.0]),
            |x, y, z| [(x * 10) as u8, (y * 10) as u8, (z * 10) as u8, 255],
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_at_voxel_centers() {
        let volume = gradient();
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        for x in 0..2 {
            for y in 0..3 {
                for z in 0..4 {
                    let center = volume.voxel_center(x, y, z);
                    assert_eq!(Some(sampler.sample_world(&center)), volume.get(x, y, z));
                }
            }
        }
    }

    #[test]
    fn test_bilinear_at_voxel_centers_matches_nearest() {
        let volume = gradient();
        let nearest = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        let bilinear = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        for x in 0..2 {
            for y in 0..3 {
                for z in 0..4 {
                    let center = volume.voxel_center(x, y, z);
                    assert_eq!(bilinear.sample_world(&center), nearest.sample_world(&center));
                }
            }
        }
    }

    #[test]
    fn test_bilinear_blend_rounds() {
        let volume = gradient();
        let sampler = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        // row 0.25 between 0 and 10, column 0.75 between 0 and 10
        assert_eq!(sampler.sample(&Point3::new(0.0, 0.25, 0.75)), [0, 3, 8, 255]);
        // stays within layer 1
        assert_eq!(sampler.sample(&Point3::new(1.2, 1.5, 2.5)), [10, 15, 25, 255]);
    }

    #[test]
    fn test_bilinear_high_border_returns_origin() {
        let volume = gradient();
        let sampler = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        assert_eq!(sampler.sample(&Point3::new(0.0, 0.5, 3.0)), [0, 0, 30, 255]);
        assert_eq!(sampler.sample(&Point3::new(0.0, 2.0, 1.5)), [0, 20, 10, 255]);
    }

    #[test]
    fn test_clamp_mode_clamps() {
        let volume = gradient();
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        assert_eq!(sampler.sample(&Point3::new(-5.0, 10.0, 100.0)), [0, 20, 30, 255]);
        let bilinear = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        assert_eq!(bilinear.sample(&Point3::new(-5.0, -3.0, -1.0)), [0, 0, 0, 255]);
    }

    #[test]
    fn test_background_mode() {
        let volume = gradient();
        let red = [255, 0, 0, 255];
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Background(red));
        assert_eq!(sampler.sample(&Point3::new(0.0, -0.6, 0.0)), red);
        assert_eq!(sampler.sample(&Point3::new(0.0, 0.0, 3.6)), red);
        // inside the half-voxel margin of the border voxel
        assert_eq!(sampler.sample(&Point3::new(0.0, -0.4, 0.0)), [0, 0, 0, 255]);
        assert_eq!(sampler.sample(&Point3::new(1.4, 2.4, 3.4)), [10, 20, 30, 255]);
    }

    #[test]
    fn test_empty_volume_returns_background() {
        let volume = VoxelVolume::empty(Vec3::repeat(1.0), Pose::identity());
        let sampler = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        assert_eq!(sampler.sample(&Point3::origin()), TRANSPARENT);
    }

    #[test]
    fn test_policies_deserialize() {
        let i: Interpolation = serde_json::from_str("\"bilinear\"").unwrap();
        assert_eq!(i, Interpolation::Bilinear);
        let b: Boundary = serde_json::from_str("{\"background\":[1,2,3,4]}").unwrap();
        assert_eq!(b, Boundary::Background([1, 2, 3, 4]));
    }
}
