//! Triangle mesh of the exact cross-section polygon.
//!
//! The slice image covers the bounding quadrilateral; the mesh covers only
//! the part of the plane that lies inside the volume, with texture
//! coordinates into that image.

use voxslice_math::Point3;

use crate::corners::{order_around_centroid, PlaneBasis, Quadrilateral};
use crate::error::{Result, SliceError};

/// A triangulated cross-section.
///
/// Flat buffers in the same layout as a GPU vertex buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSectionMesh {
    /// Vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f32>,
    /// Triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
    /// Vertex normals, same length as `vertices`.
    pub normals: Vec<f32>,
    /// Texture coordinates `[u0, v0, ...]` into the slice image, with
    /// `(0, 0)` at image pixel `(0, 0)`. The image is mirrored against the
    /// quad, so `u = 0` is the quad's lower-right to upper-right edge.
    pub uvs: Vec<f32>,
}

impl CrossSectionMesh {
    /// Triangulate a section polygon of 3 to 6 points.
    ///
    /// Points are ordered counter-clockwise (seen from the normal side)
    /// around their centroid, starting in the upper-left quadrant, then fan
    /// triangulated from the first point.
    pub fn new(points: &[Point3], basis: &PlaneBasis, quad: &Quadrilateral) -> Result<Self> {
        if !(3..=6).contains(&points.len()) {
            return Err(SliceError::CornerResolution(format!(
                "cannot triangulate a section of {} points",
                points.len()
            )));
        }

        let ordered = order_around_centroid(points, basis);

        let mut mesh = Self::default();
        for p in &ordered {
            mesh.vertices.extend([p.x as f32, p.y as f32, p.z as f32]);
            mesh.normals.extend([
                basis.normal.x as f32,
                basis.normal.y as f32,
                basis.normal.z as f32,
            ]);
            let (u, v) = quad.inverse_lerp(p, basis).ok_or_else(|| {
                SliceError::CornerResolution("section point outside the slice quadrilateral".into())
            })?;
            mesh.uvs.extend([(1.0 - u) as f32, v as f32]);
        }
        for i in 1..(ordered.len() as u32 - 1) {
            mesh.indices.extend([0, i, i + 1]);
        }
        Ok(mesh)
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Total area of the triangles.
    pub fn area(&self) -> f64 {
        let vertex = |i: u32| {
            let i = i as usize * 3;
            Point3::new(
                self.vertices[i] as f64,
                self.vertices[i + 1] as f64,
                self.vertices[i + 2] as f64,
            )
        };
        self.indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (vertex(t[0]), vertex(t[1]), vertex(t[2]));
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }
}
