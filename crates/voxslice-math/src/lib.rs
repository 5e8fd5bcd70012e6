#![warn(missing_docs)]

//! Math types for voxslice.
//!
//! Thin wrappers around nalgebra providing the types the slicing pipeline
//! passes around: points, vectors, directions, rigid poses, affine
//! transforms and tolerance constants.

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a 2D plane basis.
pub type Point2 = nalgebra::Point2<f64>;

/// A 3D rotation.
pub type Rot3 = UnitQuaternion<f64>;

/// A rigid placement in world space: position plus orientation.
///
/// Local axes follow the usual right-handed convention: `+X` right,
/// `+Y` up and `-Z` forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World position of the local origin.
    pub position: Point3,
    /// Orientation of the local frame.
    pub rotation: Rot3,
}

impl Pose {
    /// Pose at the world origin with no rotation.
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: Rot3::identity(),
        }
    }

    /// Create a pose from a position and rotation.
    pub fn new(position: Point3, rotation: Rot3) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with no rotation.
    pub fn from_position(position: Point3) -> Self {
        Self {
            position,
            rotation: Rot3::identity(),
        }
    }

    /// Pose from a position and Euler angles in degrees (roll about X,
    /// pitch about Y, yaw about Z, applied in that order).
    pub fn from_euler_degrees(position: Point3, euler: [f64; 3]) -> Self {
        let rotation = Rot3::from_euler_angles(
            euler[0].to_radians(),
            euler[1].to_radians(),
            euler[2].to_radians(),
        );
        Self { position, rotation }
    }

    /// Local `+X` in world space.
    pub fn right(&self) -> Dir3 {
        Dir3::new_unchecked(self.rotation * Vec3::x())
    }

    /// Local `+Y` in world space.
    pub fn up(&self) -> Dir3 {
        Dir3::new_unchecked(self.rotation * Vec3::y())
    }

    /// Local `-Z` in world space.
    pub fn forward(&self) -> Dir3 {
        Dir3::new_unchecked(self.rotation * -Vec3::z())
    }

    /// Map a local point to world space.
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        self.position + self.rotation * p.coords
    }

    /// Map a world point into the local frame.
    pub fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.rotation.inverse() * (p - self.position))
    }

    /// The pose mapping world space back into this pose's local frame.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(rotation * self.position.coords)),
            rotation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Homogeneous 4x4 affine transform acting on column vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Homogeneous matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// The transform that changes nothing.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Pure translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// Per-axis scaling.
    pub fn scale(factors: Vec3) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&factors),
        }
    }

    /// Local-to-world matrix of a pose.
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            matrix: Matrix4::new_translation(&pose.position.coords) * pose.rotation.to_homogeneous(),
        }
    }

    /// Chain two transforms. The result applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Map a point (translation applies).
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// Map a displacement (translation ignored).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.matrix.transform_vector(v)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Distance below which two points are treated as the same point.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear tolerance in world units.
    pub linear: f64,
}

impl Tolerance {
    /// 1e-9 world units.
    pub const DEFAULT: Self = Self { linear: 1e-9 };

    /// True if `a` and `b` are closer than the linear tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
