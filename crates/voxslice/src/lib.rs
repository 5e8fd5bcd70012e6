#![warn(missing_docs)]

//! Planar slicing of voxel volumes.
//!
//! Cuts an oriented voxel volume with an arbitrary plane and renders the
//! cross-section as an RGBA image, together with the world-space corners
//! needed to place that image back in the scene.
//!
//! The pipeline runs in five stages:
//!
//! 1. [`intersect_box`] crosses the plane with the 12 edges of the volume's
//!    bounding box.
//! 2. [`resolve_corners`] reduces the crossings to an ordered
//!    [`Quadrilateral`].
//! 3. [`SliceGrid`] sizes the pixel grid from the voxel step.
//! 4. [`VoxelSampler`] reconstructs values at fractional voxel positions.
//! 5. [`rasterize`] fills the image, one row per task.
//!
//! # Example
//!
//! ```ignore
//! use voxslice::{slice, SliceSettings, VoxelVolume};
//! use voxslice_math::{Point3, Pose};
//!
//! let volume: VoxelVolume = // ... load a stack
//! let pose = Pose::from_euler_degrees(Point3::origin(), [0.0, 30.0, 0.0]);
//! let output = slice(&volume, &pose, &SliceSettings::default())?;
//!
//! println!("{}x{} slice", output.image.width, output.image.height);
//! println!("upper left at {:?}", output.quad.upper_left);
//! ```

pub mod corners;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod intersect;
pub mod raster;
pub mod ray;
pub mod sampler;
pub mod section;
pub mod shared;
pub mod volume;

pub use corners::{resolve_corners, PlaneBasis, Quadrilateral};
pub use error::{Result, SliceError};
pub use geometry::{BoxEdge, CuttingPlane, OrientedBox};
pub use grid::SliceGrid;
pub use intersect::{edge_crossings, intersect_box, EdgeCrossings};
pub use raster::{rasterize, SliceImage};
pub use ray::{PlaneHit, Ray};
pub use sampler::{Boundary, Interpolation, VoxelSampler};
pub use section::CrossSectionMesh;
pub use shared::SharedVolume;
pub use volume::{Sample, VoxelCounts, VoxelVolume, TRANSPARENT};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voxslice_math::{Point3, Pose, Tolerance};

/// Slicing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Sample reconstruction between voxel centers.
    pub interpolation: Interpolation,
    /// Handling of positions outside the volume.
    pub boundary: Boundary,
    /// Overshoot (in voxels) snapped back onto the volume boundary when
    /// reporting voxel-space corners.
    pub crop_threshold: f64,
    /// Render rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Nearest,
            boundary: Boundary::Clamp,
            crop_threshold: 0.1,
            parallel: true,
        }
    }
}

impl SliceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.crop_threshold) {
            return Err(SliceError::InvalidSettings(
                "crop_threshold must be in [0, 0.5) voxels".into(),
            ));
        }
        Ok(())
    }
}

/// Everything produced by one slice.
#[derive(Debug, Clone)]
pub struct SliceOutput {
    /// The rendered slice.
    pub image: SliceImage,
    /// World-space corners of the image.
    pub quad: Quadrilateral,
    /// Pixel grid the image was rendered from.
    pub grid: SliceGrid,
    /// Exact cross-section polygon (3 to 6 points), in crossing order.
    pub polygon: Vec<Point3>,
    /// Triangulated cross-section with texture coordinates into `image`.
    pub mesh: CrossSectionMesh,
    /// `quad` corners as rounded voxel-boundary positions.
    pub voxel_corners: [Point3; 4],
}

/// Slice `volume` with the plane of a cutting pose.
///
/// The plane passes through the pose position; its normal is the pose's
/// local `+Z`. See [`CuttingPlane::from_pose`].
pub fn slice(volume: &VoxelVolume, pose: &Pose, settings: &SliceSettings) -> Result<SliceOutput> {
    slice_with_plane(volume, &CuttingPlane::from_pose(pose), settings)
}

/// Slice `volume` with an explicit plane.
///
/// Fails fast on an empty volume. "No slice here" outcomes are reported as
/// errors for which [`SliceError::is_no_slice`] is true.
pub fn slice_with_plane(
    volume: &VoxelVolume,
    plane: &CuttingPlane,
    settings: &SliceSettings,
) -> Result<SliceOutput> {
    settings.validate()?;
    volume.ensure_not_empty()?;

    let tol = Tolerance::DEFAULT;
    let polygon = intersect_box(&volume.oriented_box(), plane, &tol).inspect_err(|e| {
        debug!(error = %e, "plane does not cut the volume");
    })?;

    let pose = volume.pose();
    let basis = PlaneBasis::new(plane, &pose.up(), &pose.forward());
    let quad = resolve_corners(&polygon, &basis, &tol)?;

    let grid = SliceGrid::new(quad, volume);
    if grid.is_degenerate() {
        warn!(
            width = grid.width,
            height = grid.height,
            "degenerate slice grid, rendering a strip"
        );
    } else {
        debug!(width = grid.width, height = grid.height, "slice grid");
    }

    let sampler = VoxelSampler::new(volume, settings.interpolation, settings.boundary);
    let image = rasterize(&grid, &sampler, settings.parallel);
    let mesh = CrossSectionMesh::new(&polygon, &basis, &quad)?;
    let voxel_corners = quad
        .corners()
        .map(|p| volume.grid_position(&p, settings.crop_threshold));

    Ok(SliceOutput {
        image,
        quad,
        grid,
        polygon,
        mesh,
        voxel_corners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use voxslice_math::Vec3;

    fn labelled(counts: VoxelCounts, size: Vec3, pose: Pose) -> VoxelVolume {
        VoxelVolume::from_fn(counts, size, pose, |x, y, z| {
            [(x * 10) as u8, (y * 10) as u8, (z * 10) as u8, 255]
        })
        .unwrap()
    }

    fn unit_cube() -> VoxelVolume {
        labelled(
            VoxelCounts::new(2, 2, 2),
            Vec3::repeat(1.0),
            Pose::from_position(Point3::new(0.5, 0.5, 0.5)),
        )
    }

    #[test]
    fn test_default_settings_valid() {
        assert!(SliceSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_crop_threshold() {
        let settings = SliceSettings {
            crop_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SliceError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_settings_fill_defaults() {
        let settings: SliceSettings = serde_json::from_str(r#"{"interpolation":"bilinear"}"#).unwrap();
        assert_eq!(settings.interpolation, Interpolation::Bilinear);
        assert_eq!(settings.crop_threshold, 0.1);
        assert!(settings.parallel);
    }

    #[test]
    fn test_unit_cube_midplane() {
        let volume = unit_cube();
        let plane = CuttingPlane::new(Point3::new(0.5, 0.5, 0.5), Vec3::y());
        let out = slice_with_plane(&volume, &plane, &SliceSettings::default()).unwrap();

        assert_eq!(out.polygon.len(), 4);
        for p in &out.polygon {
            assert_relative_eq!(p.y, 0.5, epsilon = 1e-12);
        }
        assert_eq!((out.grid.width, out.grid.height), (2, 2));
        assert_eq!((out.image.width, out.image.height), (2, 2));

        // Pixel (0, 0) is the lower-right grid corner after mirroring.
        let direct = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp)
            .sample_world(&out.quad.lower_right);
        assert_eq!(out.image.get(0, 0), Some(direct));
        assert_eq!(Some(direct), volume.get(1, 1, 1));

        for corner in out.voxel_corners {
            assert_eq!(corner.y, 1.0);
            assert!(corner.x == 0.0 || corner.x == 2.0);
            assert!(corner.z == 0.0 || corner.z == 2.0);
        }
        assert_eq!(out.mesh.num_triangles(), 2);
    }

    #[test]
    fn test_slice_is_idempotent() {
        let volume = labelled(
            VoxelCounts::new(6, 7, 9),
            Vec3::new(3.0, 2.0, 1.5),
            Pose::from_euler_degrees(Point3::new(0.2, -0.1, 0.4), [5.0, 15.0, -10.0]),
        );
        let pose = Pose::from_euler_degrees(Point3::new(0.25, 0.0, 0.3), [20.0, -35.0, 10.0]);
        let settings = SliceSettings {
            interpolation: Interpolation::Bilinear,
            ..Default::default()
        };
        let a = slice(&volume, &pose, &settings).unwrap();
        let b = slice(&volume, &pose, &settings).unwrap();
        assert_eq!(a.image.as_bytes(), b.image.as_bytes());
        assert_eq!(a.quad, b.quad);

        let sequential = slice(
            &volume,
            &pose,
            &SliceSettings {
                parallel: false,
                ..settings
            },
        )
        .unwrap();
        assert_eq!(a.image, sequential.image);
    }

    #[test]
    fn test_pose_aligned_with_rotated_volume() {
        let pose = Pose::from_euler_degrees(Point3::new(1.0, 2.0, -3.0), [0.0, 30.0, 0.0]);
        // 8 columns over 2.0, 6 rows over 3.0, 5 layers over 5.0
        let volume = labelled(VoxelCounts::new(5, 6, 8), Vec3::new(2.0, 3.0, 5.0), pose);
        let out = slice(&volume, &pose, &SliceSettings::default()).unwrap();

        assert_eq!((out.grid.width, out.grid.height), (8, 6));
        // Lower-left of the quad is column 0, row 0 of the middle layer.
        assert_eq!(out.image.get(7, 0), Some([20, 0, 0, 255]));
        assert_eq!(out.image.get(0, 5), Some([20, 50, 70, 255]));
    }

    #[test]
    fn test_mesh_uvs_address_their_own_texel() {
        let volume = labelled(VoxelCounts::new(4, 4, 8), Vec3::new(2.0, 1.0, 1.0), Pose::identity());
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        let planes = [
            CuttingPlane::new(Point3::new(0.0, 0.0, 0.1), Vec3::z()),
            CuttingPlane::new(Point3::new(0.1, 0.05, 0.0), Vec3::new(0.3, 0.2, 1.0)),
        ];
        for plane in &planes {
            let out = slice_with_plane(&volume, plane, &SliceSettings::default()).unwrap();
            let (w, h) = (out.image.width, out.image.height);
            assert!(w > 1 && h > 1);
            assert_eq!(out.mesh.num_vertices(), 4);

            for i in 0..out.mesh.num_vertices() {
                let uv = &out.mesh.uvs[i * 2..i * 2 + 2];
                let px = (f64::from(uv[0]) * (w - 1) as f64).round() as usize;
                let py = (f64::from(uv[1]) * (h - 1) as f64).round() as usize;
                let v = &out.mesh.vertices[i * 3..i * 3 + 3];
                let p = Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]));
                assert_eq!(
                    out.image.get(px, py),
                    Some(sampler.sample_world(&p)),
                    "vertex {p:?} at uv {uv:?}"
                );
            }
        }
    }

    #[test]
    fn test_plane_outside_volume() {
        let plane = CuttingPlane::new(Point3::new(0.0, 3.0, 0.0), Vec3::y());
        let err = slice_with_plane(&unit_cube(), &plane, &SliceSettings::default()).unwrap_err();
        assert_eq!(err, SliceError::GeometryDegenerate { crossings: 0 });
        assert!(err.is_no_slice());
    }

    #[test]
    fn test_plane_on_face() {
        let plane = CuttingPlane::new(Point3::new(0.5, 1.0, 0.5), Vec3::y());
        let err = slice_with_plane(&unit_cube(), &plane, &SliceSettings::default()).unwrap_err();
        assert!(err.is_no_slice());
    }

    #[test]
    fn test_empty_volume_fails_first() {
        let volume = VoxelVolume::empty(Vec3::repeat(1.0), Pose::identity());
        let err = slice(&volume, &Pose::identity(), &SliceSettings::default()).unwrap_err();
        assert_eq!(err, SliceError::EmptyVolume);
    }
}
