//! Oriented bounding box and cutting plane.

use voxslice_math::{Dir3, Point3, Pose, Vec3};

/// One edge of an [`OrientedBox`]: a start corner, a unit direction and a
/// length.
#[derive(Debug, Clone, Copy)]
pub struct BoxEdge {
    /// Start corner.
    pub start: Point3,
    /// Unit direction from the start corner.
    pub direction: Dir3,
    /// Edge length.
    pub length: f64,
}

impl BoxEdge {
    /// End corner of the edge.
    pub fn end(&self) -> Point3 {
        self.start + self.direction.as_ref() * self.length
    }
}

/// A box in world space with orthonormal local axes.
#[derive(Debug, Clone, Copy)]
pub struct OrientedBox {
    /// Center of the box.
    pub center: Point3,
    /// Half of the box size along `right`, `up` and `back`.
    pub half_extents: Vec3,
    /// Local `+X`.
    pub right: Dir3,
    /// Local `+Y`.
    pub up: Dir3,
    /// Local `+Z` (the box's forward is `-back`).
    pub back: Dir3,
}

impl OrientedBox {
    /// Box centered on a pose with the given half extents.
    pub fn from_pose(pose: &Pose, half_extents: Vec3) -> Self {
        Self {
            center: pose.position,
            half_extents,
            right: pose.right(),
            up: pose.up(),
            back: Dir3::new_unchecked(-pose.forward().into_inner()),
        }
    }

    /// Corner at the given sign combination (`false` = negative side).
    pub fn corner(&self, x: bool, y: bool, z: bool) -> Point3 {
        let sign = |positive: bool| if positive { 1.0 } else { -1.0 };
        self.center
            + self.right.as_ref() * (sign(x) * self.half_extents.x)
            + self.up.as_ref() * (sign(y) * self.half_extents.y)
            + self.back.as_ref() * (sign(z) * self.half_extents.z)
    }

    /// The 8 corners, indexed by bit pattern `x | y << 1 | z << 2`.
    pub fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| self.corner(i & 1 != 0, i & 2 != 0, i & 4 != 0))
    }

    /// The 12 edges: four along each local axis, each starting at the
    /// corner on the negative side of that axis.
    pub fn edges(&self) -> [BoxEdge; 12] {
        let size = self.half_extents * 2.0;
        let mut edges = [BoxEdge {
            start: self.center,
            direction: self.right,
            length: 0.0,
        }; 12];
        let mut i = 0;
        for a in [false, true] {
            for b in [false, true] {
                edges[i] = BoxEdge {
                    start: self.corner(false, a, b),
                    direction: self.right,
                    length: size.x,
                };
                edges[i + 1] = BoxEdge {
                    start: self.corner(a, false, b),
                    direction: self.up,
                    length: size.y,
                };
                edges[i + 2] = BoxEdge {
                    start: self.corner(a, b, false),
                    direction: self.back,
                    length: size.z,
                };
                i += 3;
            }
        }
        edges
    }

    /// True if `p` lies inside the box, expanded by `tol`.
    pub fn contains(&self, p: &Point3, tol: f64) -> bool {
        let d = p - self.center;
        d.dot(self.right.as_ref()).abs() <= self.half_extents.x + tol
            && d.dot(self.up.as_ref()).abs() <= self.half_extents.y + tol
            && d.dot(self.back.as_ref()).abs() <= self.half_extents.z + tol
    }
}

/// A plane through `point` with unit `normal`.
///
/// `up` is an in-plane reference direction carried over from the pose the
/// plane was built from. It orients the slice when world up is
/// perpendicular to the plane.
#[derive(Debug, Clone, Copy)]
pub struct CuttingPlane {
    /// A point on the plane.
    pub point: Point3,
    /// Unit normal.
    pub normal: Dir3,
    /// In-plane up reference.
    pub up: Dir3,
}

impl CuttingPlane {
    /// Plane through `point` with the given normal. The up hint is derived
    /// from the normal.
    pub fn new(point: Point3, normal: Vec3) -> Self {
        let normal = Dir3::new_normalize(normal);
        let reference = if normal.x.abs() < 0.9 { Vec3::x() } else { Vec3::z() };
        let up = Dir3::new_normalize(normal.cross(&reference));
        Self { point, normal, up }
    }

    /// Plane of a slicer pose: normal along the pose's local `+Z`
    /// (its back side), up along the pose's local `+Y`.
    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            point: pose.position,
            normal: Dir3::new_unchecked(-pose.forward().into_inner()),
            up: pose.up(),
        }
    }

    /// Signed distance from `p` to the plane along the normal.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.point).dot(self.normal.as_ref())
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.normal.as_ref() * self.signed_distance(p)
    }

    /// The same plane with the normal reversed.
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: Dir3::new_unchecked(-self.normal.into_inner()),
            up: self.up,
        }
    }
}
