//! Plane / oriented box edge intersection.

use tracing::debug;
use voxslice_math::{Point3, Tolerance};

use crate::error::{Result, SliceError};
use crate::geometry::{CuttingPlane, OrientedBox};
use crate::ray::{PlaneHit, Ray};

/// Raw result of crossing a plane with the 12 box edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeCrossings {
    /// Distinct crossing points, in edge enumeration order.
    pub points: Vec<Point3>,
    /// Number of edges lying entirely in the plane.
    pub coincident_edges: usize,
}

impl EdgeCrossings {
    /// True if the plane lies on one of the box faces.
    ///
    /// Three coplanar box edges can only belong to the same face.
    pub fn is_face_coincident(&self) -> bool {
        self.coincident_edges >= 3
    }
}

/// Cross every box edge with the plane and collect the distinct points.
///
/// An edge is crossed when the plane parameter along it lies within
/// `[0, length]`, widened by the linear tolerance so that crossings at the
/// corners are not lost to rounding. Edges lying in the plane are counted
/// but contribute no point of their own.
pub fn edge_crossings(obb: &OrientedBox, plane: &CuttingPlane, tol: &Tolerance) -> EdgeCrossings {
    let mut crossings = EdgeCrossings::default();

    for edge in obb.edges() {
        let ray = Ray::from_dir(edge.start, edge.direction);
        let t = match ray.hit_plane(plane, tol.linear) {
            PlaneHit::At(t) => t,
            PlaneHit::Coincident => {
                crossings.coincident_edges += 1;
                continue;
            }
            PlaneHit::Parallel => continue,
        };

        let (lo, hi) = if edge.length >= 0.0 {
            (0.0, edge.length)
        } else {
            (edge.length, 0.0)
        };
        if t < lo - tol.linear || t > hi + tol.linear {
            continue;
        }

        let point = ray.at(t.clamp(lo, hi));
        if !crossings
            .points
            .iter()
            .any(|p| tol.points_equal(p, &point))
        {
            crossings.points.push(point);
        }
    }

    crossings
}

/// Intersection points of a plane with an oriented box.
///
/// Fails with [`SliceError::GeometryDegenerate`] when fewer than three
/// distinct points are found (the plane misses or only grazes the box) or
/// when the plane coincides with a box face.
pub fn intersect_box(
    obb: &OrientedBox,
    plane: &CuttingPlane,
    tol: &Tolerance,
) -> Result<Vec<Point3>> {
    let crossings = edge_crossings(obb, plane, tol);
    debug!(
        points = crossings.points.len(),
        coincident_edges = crossings.coincident_edges,
        "plane/box edge crossings"
    );

    if crossings.points.len() < 3 || crossings.is_face_coincident() {
        return Err(SliceError::GeometryDegenerate {
            crossings: crossings.points.len(),
        });
    }

    Ok(crossings.points)
}
