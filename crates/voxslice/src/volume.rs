//! Voxel volume: a stack of equally sized 2D images placed in world space.

use nalgebra::Matrix4;
use voxslice_math::{Point3, Pose, Transform, Vec3};

use crate::error::{Result, SliceError};
use crate::geometry::OrientedBox;

/// One RGBA voxel sample.
pub type Sample = [u8; 4];

/// Transparent black, the default background sample.
pub const TRANSPARENT: Sample = [0, 0, 0, 0];

/// Voxel counts along the three volume axes.
///
/// `x` is the number of stacked images, `y` the image height and `z` the
/// image width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoxelCounts {
    /// Number of images in the stack.
    pub x: usize,
    /// Rows per image.
    pub y: usize,
    /// Columns per image.
    pub z: usize,
}

impl VoxelCounts {
    /// Create voxel counts.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// True if any axis has no voxels.
    pub const fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// Total number of voxels.
    pub const fn len(&self) -> usize {
        self.x * self.y * self.z
    }

    /// World units per voxel along local X, Y and Z for a volume of
    /// physical `size`.
    ///
    /// Axes without voxels report a step of zero.
    pub fn step_size(&self, size: Vec3) -> Vec3 {
        let step = |extent: f64, count: usize| {
            if count == 0 {
                0.0
            } else {
                extent / count as f64
            }
        };
        Vec3::new(step(size.x, self.z), step(size.y, self.y), step(size.z, self.x))
    }

    /// Counts as floats, in volume axis order.
    pub fn as_vec(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

/// A rectangular voxel grid with its physical geometry.
///
/// `size` is measured in the volume's local frame: local X is the image
/// width (volume Z), local Y the image height (volume Y) and local Z the
/// stack depth (volume X). The volume is centered on `pose.position`.
#[derive(Debug, Clone)]
pub struct VoxelVolume {
    counts: VoxelCounts,
    size: Vec3,
    pose: Pose,
    data: Vec<Sample>,
}

impl VoxelVolume {
    /// Create a volume from flat sample data indexed
    /// `(x * counts.y + y) * counts.z + z`.
    pub fn new(counts: VoxelCounts, size: Vec3, pose: Pose, data: Vec<Sample>) -> Result<Self> {
        if data.len() != counts.len() {
            return Err(SliceError::InvalidVolume(format!(
                "expected {} samples for {}x{}x{} voxels, got {}",
                counts.len(),
                counts.x,
                counts.y,
                counts.z,
                data.len()
            )));
        }
        if !counts.is_empty() && !size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(SliceError::InvalidVolume(format!(
                "size must be positive, got ({}, {}, {})",
                size.x, size.y, size.z
            )));
        }
        Ok(Self {
            counts,
            size,
            pose,
            data,
        })
    }

    /// A volume without voxels, as produced from an empty image directory.
    pub fn empty(size: Vec3, pose: Pose) -> Self {
        Self {
            counts: VoxelCounts::default(),
            size,
            pose,
            data: Vec::new(),
        }
    }

    /// Build a volume by evaluating `f(x, y, z)` for every voxel.
    pub fn from_fn<F>(counts: VoxelCounts, size: Vec3, pose: Pose, f: F) -> Result<Self>
    where
        F: Fn(usize, usize, usize) -> Sample,
    {
        let mut data = Vec::with_capacity(counts.len());
        for x in 0..counts.x {
            for y in 0..counts.y {
                for z in 0..counts.z {
                    data.push(f(x, y, z));
                }
            }
        }
        Self::new(counts, size, pose, data)
    }

    /// Voxel counts.
    pub fn counts(&self) -> VoxelCounts {
        self.counts
    }

    /// Physical size in the local frame.
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// World placement of the volume center.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// True if the volume has no voxels.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fail with [`SliceError::EmptyVolume`] if there is nothing to slice.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SliceError::EmptyVolume);
        }
        Ok(())
    }

    /// World units per voxel along local X, Y and Z.
    pub fn step_size(&self) -> Vec3 {
        self.counts.step_size(self.size)
    }

    /// Sample at integer voxel indices, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<Sample> {
        if x >= self.counts.x || y >= self.counts.y || z >= self.counts.z {
            return None;
        }
        Some(self.data[(x * self.counts.y + y) * self.counts.z + z])
    }

    /// All samples of stack image `x`, row-major (`y` rows of `z` columns).
    pub fn layer(&self, x: usize) -> Option<&[Sample]> {
        if x >= self.counts.x {
            return None;
        }
        let len = self.counts.y * self.counts.z;
        Some(&self.data[x * len..(x + 1) * len])
    }

    /// Raw sample data.
    pub fn data(&self) -> &[Sample] {
        &self.data
    }

    /// The volume's bounding box in world space.
    pub fn oriented_box(&self) -> OrientedBox {
        OrientedBox::from_pose(&self.pose, self.size * 0.5)
    }

    /// Transform mapping world points to fractional voxel coordinates.
    ///
    /// Voxel centers map to integer coordinates; the box faces sit at
    /// `-0.5` and `count - 0.5`.
    pub fn world_to_voxel_transform(&self) -> Transform {
        let step = self.step_size();
        let inv = |s: f64| if s > 0.0 { 1.0 / s } else { 0.0 };
        let half = self.size * 0.5;
        #[rustfmt::skip]
        let remap = Transform {
            matrix: Matrix4::new(
                0.0, 0.0, 1.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        };
        Transform::translation(Vec3::repeat(-0.5))
            .then(&remap)
            .then(&Transform::scale(step.map(inv)))
            .then(&Transform::translation(half))
            .then(&Transform::from_pose(&self.pose.inverse()))
    }

    /// Fractional voxel coordinates of a world point.
    pub fn world_to_voxel(&self, p: &Point3) -> Point3 {
        self.world_to_voxel_transform().apply_point(p)
    }

    /// World position of the center of voxel `(x, y, z)`.
    pub fn voxel_center(&self, x: usize, y: usize, z: usize) -> Point3 {
        let step = self.step_size();
        let local = Point3::new(
            (z as f64 + 0.5) * step.x,
            (y as f64 + 0.5) * step.y,
            (x as f64 + 0.5) * step.z,
        ) - self.size * 0.5;
        self.pose.transform_point(&local)
    }

    /// Rounded grid position of a world point, in voxel-boundary units
    /// (`0..=count` per axis).
    ///
    /// Coordinates that overshoot a boundary by less than `crop_threshold`
    /// are snapped onto it before rounding.
    pub fn grid_position(&self, p: &Point3, crop_threshold: f64) -> Point3 {
        let v = self.world_to_voxel(p) + Vec3::repeat(0.5);
        let counts = self.counts.as_vec();
        let crop = |value: f64, count: f64| {
            if value < 0.0 && value > -crop_threshold {
                0.0
            } else if value > count && value < count + crop_threshold {
                count
            } else {
                value
            }
        };
        Point3::new(
            crop(v.x, counts.x).round(),
            crop(v.y, counts.y).round(),
            crop(v.z, counts.z).round(),
        )
    }

    /// Whether a grid position lies on the first or last voxel, per axis.
    pub fn is_edge_position(&self, p: &Point3) -> [bool; 3] {
        let counts = self.counts.as_vec();
        [
            p.x <= 0.0 || p.x + 1.0 >= counts.x,
            p.y <= 0.0 || p.y + 1.0 >= counts.y,
            p.z <= 0.0 || p.z + 1.0 >= counts.z,
        ]
    }
}
