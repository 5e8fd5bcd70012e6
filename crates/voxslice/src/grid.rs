//! Pixel grid dimensions for a resolved slice.

use voxslice_math::Vec3;

use crate::corners::Quadrilateral;
use crate::volume::VoxelVolume;

/// Pixel dimensions of a slice plus the corners used to place its pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGrid {
    /// Pixels along the lower edge.
    pub width: usize,
    /// Pixels along the left edge.
    pub height: usize,
    /// Slice corners in world space.
    pub quad: Quadrilateral,
}

impl SliceGrid {
    /// Size the grid so that neither edge undersamples the volume.
    ///
    /// Both quad edges are measured in voxel steps. The height is the
    /// largest step count over all three axes; the width only considers the
    /// two in-image axes (columns and stack depth).
    pub fn new(quad: Quadrilateral, volume: &VoxelVolume) -> Self {
        let to_voxels = volume.world_to_voxel_transform();
        let h = rounded(to_voxels.apply_vec(&(quad.upper_left - quad.lower_left)));
        let w = rounded(to_voxels.apply_vec(&(quad.lower_right - quad.lower_left)));

        Self {
            width: w.x.max(w.z) as usize,
            height: h.x.max(h.y).max(h.z) as usize,
            quad,
        }
    }

    /// True if either dimension is zero (a knife-edge plane).
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions the rasterizer renders at: zero is raised to one.
    pub fn raster_size(&self) -> (usize, usize) {
        (self.width.max(1), self.height.max(1))
    }
}

fn rounded(v: Vec3) -> Vec3 {
    v.map(|c| c.round().abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{VoxelCounts, TRANSPARENT};
    use voxslice_math::{Point3, Pose};

    fn volume(counts: VoxelCounts, size: Vec3) -> VoxelVolume {
        VoxelVolume::new(counts, size, Pose::identity(), vec![TRANSPARENT; counts.len()]).unwrap()
    }

    #[test]
    fn test_unit_cube_midplane_grid() {
        let volume = volume(VoxelCounts::new(2, 2, 2), Vec3::repeat(1.0));
        let quad = Quadrilateral {
            upper_left: Point3::new(-0.5, 0.0, -0.5),
            lower_left: Point3::new(-0.5, 0.0, 0.5),
            lower_right: Point3::new(0.5, 0.0, 0.5),
            upper_right: Point3::new(0.5, 0.0, -0.5),
        };
        let grid = SliceGrid::new(quad, &volume);
        assert_eq!((grid.width, grid.height), (2, 2));
        assert!(!grid.is_degenerate());
    }

    #[test]
    fn test_anisotropic_steps() {
        // 10 columns over 1.0 (local X), 4 rows over 2.0, 3 layers over 3.0
        let volume = volume(VoxelCounts::new(3, 4, 10), Vec3::new(1.0, 2.0, 3.0));
        let quad = Quadrilateral {
            upper_left: Point3::new(-0.5, 1.0, 0.0),
            lower_left: Point3::new(-0.5, -1.0, 0.0),
            lower_right: Point3::new(0.5, -1.0, 0.0),
            upper_right: Point3::new(0.5, 1.0, 0.0),
        };
        let grid = SliceGrid::new(quad, &volume);
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 4);
    }

    #[test]
    fn test_tilted_height_uses_largest_axis() {
        let volume = volume(VoxelCounts::new(8, 8, 8), Vec3::repeat(1.0));
        // Left edge rises 0.25 in Y while running 1.0 along Z.
        let quad = Quadrilateral {
            upper_left: Point3::new(-0.5, 0.125, -0.5),
            lower_left: Point3::new(-0.5, -0.125, 0.5),
            lower_right: Point3::new(0.5, -0.125, 0.5),
            upper_right: Point3::new(0.5, 0.125, -0.5),
        };
        let grid = SliceGrid::new(quad, &volume);
        assert_eq!(grid.height, 8);
        assert_eq!(grid.width, 8);
    }

    #[test]
    fn test_knife_edge_grid_is_degenerate() {
        let volume = volume(VoxelCounts::new(4, 4, 4), Vec3::repeat(1.0));
        let p = Point3::new(0.1, 0.2, 0.3);
        let quad = Quadrilateral {
            upper_left: p,
            lower_left: p,
            lower_right: Point3::new(0.5, 0.2, 0.3),
            upper_right: Point3::new(0.5, 0.2, 0.3),
        };
        let grid = SliceGrid::new(quad, &volume);
        assert_eq!(grid.height, 0);
        assert!(grid.is_degenerate());
        assert_eq!(grid.raster_size(), (2, 1));
    }
}
