//! Ray representation and ray-plane intersection.

use voxslice_math::{Dir3, Point3, Vec3};

use crate::geometry::CuttingPlane;

/// Parallelism threshold for `dot(direction, normal)`.
const PARALLEL_EPS: f64 = 1e-12;

/// A ray in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

/// Outcome of intersecting a ray's supporting line with a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaneHit {
    /// The line crosses the plane at signed parameter `t`.
    At(f64),
    /// The line is parallel to the plane and off it.
    Parallel,
    /// The line lies in the plane.
    Coincident,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Create a ray from an already normalized direction.
    pub fn from_dir(origin: Point3, direction: Dir3) -> Self {
        Self { origin, direction }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Intersect the ray's supporting line with a plane.
    ///
    /// `t` may be negative (behind the origin); callers decide which range
    /// they accept. `eps` is the distance below which an origin counts as
    /// lying on the plane.
    pub fn hit_plane(&self, plane: &CuttingPlane, eps: f64) -> PlaneHit {
        let normal = plane.normal.as_ref();
        let denom = self.direction.dot(normal);
        let numer = (plane.point - self.origin).dot(normal);

        if denom.abs() < PARALLEL_EPS {
            return if numer.abs() < eps {
                PlaneHit::Coincident
            } else {
                PlaneHit::Parallel
            };
        }

        PlaneHit::At(numer / denom)
    }

    /// Distance along the ray to the plane, if it is hit at `t >= 0`.
    pub fn raycast(&self, plane: &CuttingPlane) -> Option<f64> {
        match self.hit_plane(plane, 0.0) {
            PlaneHit::At(t) if t >= 0.0 => Some(t),
            _ => None,
        }
    }
}
