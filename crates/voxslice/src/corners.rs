//! Reduction of plane/box crossings to an ordered quadrilateral.
//!
//! A plane cuts a box in a triangle, quadrilateral, pentagon or hexagon.
//! The slice image is always rectangular in pixel space, so every section
//! is reduced to four corners ordered upper-left, lower-left, lower-right,
//! upper-right in the plane's own basis:
//!
//! - four points are put in cyclic order around their centroid; the pair of
//!   neighbours with the greatest height forms the top edge, and the rest
//!   of the corners follow the cycle;
//! - three, five or six points are replaced by their bounding rectangle in
//!   the plane basis, found by sliding the extreme top and bottom points
//!   sideways onto reference planes through the leftmost and rightmost
//!   points.

use std::cmp::Ordering;
use std::f64::consts::{FRAC_PI_4, TAU};

use nalgebra::Vector2;
use tracing::debug;
use voxslice_math::{Dir3, Point2, Point3, Tolerance, Vec3};

use crate::error::{Result, SliceError};
use crate::geometry::CuttingPlane;
use crate::ray::{PlaneHit, Ray};

/// Below this length a projected up vector is treated as undefined.
const BASIS_EPS: f64 = 1e-6;

/// Projected world up shorter than this is blended with the plane's up hint.
const UP_BLEND: f64 = 1e-3;

/// Four slice corners in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    /// Upper-left corner.
    pub upper_left: Point3,
    /// Lower-left corner.
    pub lower_left: Point3,
    /// Lower-right corner.
    pub lower_right: Point3,
    /// Upper-right corner.
    pub upper_right: Point3,
}

impl Quadrilateral {
    /// Corners in order: upper-left, lower-left, lower-right, upper-right.
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.upper_left,
            self.lower_left,
            self.lower_right,
            self.upper_right,
        ]
    }

    /// Average of the four corners.
    pub fn center(&self) -> Point3 {
        let sum = self.upper_left.coords
            + self.lower_left.coords
            + self.lower_right.coords
            + self.upper_right.coords;
        Point3::from(sum * 0.25)
    }

    /// Point at fractions `(u, v)` of the bilinear patch spanned by the
    /// corners: `u` runs lower-left to lower-right, `v` bottom to top.
    pub fn lerp(&self, u: f64, v: f64) -> Point3 {
        let bottom = self.lower_left + (self.lower_right - self.lower_left) * u;
        let top = self.upper_left + (self.upper_right - self.upper_left) * u;
        bottom + (top - bottom) * v
    }

    /// Fractions `(u, v)` at which [`Quadrilateral::lerp`] reaches `p`,
    /// solved in the plane basis. `None` for a degenerate patch.
    pub fn inverse_lerp(&self, p: &Point3, basis: &PlaneBasis) -> Option<(f64, f64)> {
        let cross = |a: Vector2<f64>, b: Vector2<f64>| a.x * b.y - a.y * b.x;
        let [ul, ll, lr, ur] = self.corners().map(|c| basis.to_2d(&c));
        let e = lr - ll;
        let f = ul - ll;
        let g = (ll - lr) + (ur - ul);
        let h = basis.to_2d(p) - ll;

        // cross(h - e u, f + g u) = 0, quadratic in u.
        let a = cross(e, g);
        let b = cross(e, f) - cross(h, g);
        let c = -cross(h, f);
        let u = if a.abs() <= f64::EPSILON * b.abs() {
            if b.abs() < f64::MIN_POSITIVE {
                return None;
            }
            -c / b
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                return None;
            }
            let q = -0.5 * (b + disc.sqrt().copysign(b));
            let u0 = q / a;
            let u1 = if q.abs() > f64::MIN_POSITIVE { c / q } else { u0 };
            let outside = |x: f64| (x - x.clamp(0.0, 1.0)).abs();
            if outside(u0) <= outside(u1) {
                u0
            } else {
                u1
            }
        };

        let side = f + g * u;
        if side.norm() < f64::MIN_POSITIVE {
            return None;
        }
        let v = if side.x.abs() > side.y.abs() {
            (h.x - e.x * u) / side.x
        } else {
            (h.y - e.y * u) / side.y
        };
        Some((u, v))
    }
}

/// Orthonormal in-plane frame of a cutting plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    /// Reference point on the plane.
    pub origin: Point3,
    /// Canonical normal (never pointing below the volume's horizon).
    pub normal: Dir3,
    /// In-plane up.
    pub up: Dir3,
    /// In-plane left, as seen from the side the normal points to.
    pub left: Dir3,
}

impl PlaneBasis {
    /// Canonical basis of `plane` relative to a volume whose local up and
    /// forward axes are given.
    ///
    /// The normal is flipped when it points downward in the volume frame so
    /// both sides of a plane give the same basis. Up is world `+Y` projected
    /// into the plane. As the plane approaches horizontal, up turns smoothly
    /// towards the plane's up hint, reaching it once the projected world up
    /// is shorter than `UP_BLEND`. The volume's forward axis is the last
    /// resort.
    pub fn new(plane: &CuttingPlane, volume_up: &Dir3, volume_forward: &Dir3) -> Self {
        let mut normal = plane.normal;
        if normal.dot(volume_up.as_ref()) < 0.0 {
            normal = Dir3::new_unchecked(-normal.into_inner());
        }

        let project = |v: &Vec3| v - normal.as_ref() * v.dot(normal.as_ref());
        let unit = |v: Vec3| v.try_normalize(BASIS_EPS).unwrap_or_else(Vec3::zeros);

        let world = project(&Vec3::y());
        let weight = (1.0 - world.norm() / UP_BLEND).clamp(0.0, 1.0);
        let blended = unit(world) * (1.0 - weight) + unit(project(&plane.up.into_inner())) * weight;
        let up = [blended, project(&volume_forward.into_inner())]
            .into_iter()
            .find(|v| v.norm() > BASIS_EPS)
            .map(Dir3::new_normalize)
            .unwrap_or_else(|| Dir3::new_normalize(normal.cross(&Vec3::x()) + normal.cross(&Vec3::z())));
        let left = Dir3::new_normalize(normal.cross(up.as_ref()));

        Self {
            origin: plane.point,
            normal,
            up,
            left,
        }
    }

    /// Signed height of `p` along [`PlaneBasis::up`].
    pub fn height(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.up.as_ref())
    }

    /// Signed offset of `p` along [`PlaneBasis::left`].
    pub fn leftness(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.left.as_ref())
    }

    /// In-plane coordinates `(leftness, height)`.
    pub fn to_2d(&self, p: &Point3) -> Point2 {
        Point2::new(self.leftness(p), self.height(p))
    }

    /// Reference plane through `p` facing `dir`.
    fn reference_plane(&self, p: &Point3, dir: Dir3) -> CuttingPlane {
        CuttingPlane {
            point: *p,
            normal: dir,
            up: self.up,
        }
    }

    fn right(&self) -> Dir3 {
        Dir3::new_unchecked(-self.left.into_inner())
    }
}

/// Reduce raw crossing points to the canonical quadrilateral.
///
/// Accepts three to six points. Fails with [`SliceError::CornerResolution`]
/// for other counts, for collinear points, or when the resulting corners do
/// not form a simple quadrilateral in the expected winding.
pub fn resolve_corners(
    points: &[Point3],
    basis: &PlaneBasis,
    tol: &Tolerance,
) -> Result<Quadrilateral> {
    if !(3..=6).contains(&points.len()) {
        return Err(SliceError::CornerResolution(format!(
            "cannot build a quadrilateral from {} points",
            points.len()
        )));
    }
    if !spans_area(points, basis, tol) {
        return Err(SliceError::CornerResolution(
            "intersection points are collinear".into(),
        ));
    }

    let quad = if points.len() == 4 {
        order_four(points, basis)
    } else {
        bounding_rectangle(points, basis)?
    };

    validate(&quad, basis, tol)?;
    debug!(?quad, input = points.len(), "resolved slice corners");
    Ok(quad)
}

/// Order four points around the section, then read the corners off the
/// cycle starting at the top edge.
///
/// The top edge is the pair of neighbours with the greatest summed height,
/// ties going to the pair further along `left`. When the two highest points
/// are neighbours this is the pair a plain sort by height would give.
fn order_four(points: &[Point3], basis: &PlaneBasis) -> Quadrilateral {
    let ring = order_around_centroid(points, basis);
    let flat: Vec<Point2> = ring.iter().map(|p| basis.to_2d(p)).collect();
    let n = ring.len();
    let edge = |i: usize| {
        let (a, b) = (flat[i], flat[(i + 1) % n]);
        (a.y + b.y, a.x + b.x)
    };
    let top = (0..n)
        .max_by(|&i, &j| {
            let ((hi, li), (hj, lj)) = (edge(i), edge(j));
            hi.total_cmp(&hj).then(li.total_cmp(&lj))
        })
        .unwrap_or(0);

    // Clockwise in (leftness, height), the top edge runs upper-right to
    // upper-left.
    let at = |k: usize| ring[(top + k) % n];
    Quadrilateral {
        upper_right: at(0),
        upper_left: at(1),
        lower_left: at(2),
        lower_right: at(3),
    }
}

/// Sort points by angle around their centroid so that they wind clockwise
/// in `(leftness, height)`, which is counter-clockwise as seen from the
/// normal side. The cycle starts from the upper-left diagonal.
///
/// Plane sections of a box are convex, so the result is the polygon's
/// boundary order.
pub(crate) fn order_around_centroid(points: &[Point3], basis: &PlaneBasis) -> Vec<Point3> {
    let sum = points.iter().fold(Point3::origin().coords, |acc, p| acc + p.coords);
    let centroid = Point3::from(sum / points.len() as f64);
    let c = basis.to_2d(&centroid);

    let key = |p: &Point3| {
        let q = basis.to_2d(p);
        let angle = (q.y - c.y).atan2(c.x - q.x);
        (angle - 3.0 * FRAC_PI_4).rem_euclid(TAU)
    };

    let mut ordered = points.to_vec();
    ordered.sort_by(|a, b| key(a).total_cmp(&key(b)));
    ordered
}

/// Bounding rectangle of the points in the plane basis.
fn bounding_rectangle(points: &[Point3], basis: &PlaneBasis) -> Result<Quadrilateral> {
    let by = |f: &dyn Fn(&Point3) -> f64, want: Ordering| {
        points
            .iter()
            .copied()
            .reduce(|best, p| if f(&p).total_cmp(&f(&best)) == want { p } else { best })
    };
    let height = |p: &Point3| basis.height(p);
    let leftness = |p: &Point3| basis.leftness(p);

    let missing = || SliceError::CornerResolution("no extreme point".into());
    let top = by(&height, Ordering::Greater).ok_or_else(missing)?;
    let bottom = by(&height, Ordering::Less).ok_or_else(missing)?;
    let leftmost = by(&leftness, Ordering::Greater).ok_or_else(missing)?;
    let rightmost = by(&leftness, Ordering::Less).ok_or_else(missing)?;

    let left_plane = basis.reference_plane(&leftmost, basis.left);
    let right_plane = basis.reference_plane(&rightmost, basis.right());

    Ok(Quadrilateral {
        upper_left: slide(&top, basis.left, &left_plane)?,
        lower_left: slide(&bottom, basis.left, &left_plane)?,
        lower_right: slide(&bottom, basis.right(), &right_plane)?,
        upper_right: slide(&top, basis.right(), &right_plane)?,
    })
}

/// Move `p` along `dir` until it reaches `plane`.
fn slide(p: &Point3, dir: Dir3, plane: &CuttingPlane) -> Result<Point3> {
    let ray = Ray::from_dir(*p, dir);
    match ray.hit_plane(plane, 0.0) {
        PlaneHit::At(t) => Ok(ray.at(t)),
        PlaneHit::Coincident => Ok(*p),
        PlaneHit::Parallel => Err(SliceError::CornerResolution(
            "reference plane is parallel to the projection direction".into(),
        )),
    }
}

/// True if some triple of points encloses a non-vanishing area.
fn spans_area(points: &[Point3], basis: &PlaneBasis, tol: &Tolerance) -> bool {
    let flat: Vec<Point2> = points.iter().map(|p| basis.to_2d(p)).collect();
    let n = flat.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if cross(&flat[i], &flat[j], &flat[k]).abs() > tol.linear {
                    return true;
                }
            }
        }
    }
    false
}

/// Check that the corners wind clockwise in `(leftness, height)` with no
/// three of them collinear. Sections of a box are convex, so this rules out
/// self-intersecting corner orders.
fn validate(quad: &Quadrilateral, basis: &PlaneBasis, tol: &Tolerance) -> Result<()> {
    let flat = quad.corners().map(|p| basis.to_2d(&p));
    for i in 0..4 {
        let turn = cross(&flat[i], &flat[(i + 1) % 4], &flat[(i + 2) % 4]);
        if turn >= -tol.linear {
            return Err(SliceError::CornerResolution(format!(
                "corners do not form a simple quadrilateral (turn {turn:.3e} at corner {})",
                (i + 1) % 4
            )));
        }
    }
    Ok(())
}

/// Z component of `(b - a) x (c - b)`.
fn cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let e1 = b - a;
    let e2 = c - b;
    e1.x * e2.y - e1.y * e2.x
}
