//! Rasterization of a slice grid into an image.

use rayon::prelude::*;

use crate::grid::SliceGrid;
use crate::sampler::VoxelSampler;
use crate::volume::Sample;

/// A rendered slice, row-major with row 0 along the quad's lower edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceImage {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// `width * height` samples.
    pub data: Vec<Sample>,
}

impl SliceImage {
    /// Sample at pixel `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Sample> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Pixel data as `width * height * 4` bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.data.iter().flatten().copied().collect()
    }
}

/// Render every pixel of `grid` through `sampler`.
///
/// Pixel `(x, y)` of the grid lands at image column `width - 1 - x`, so the
/// image is mirrored left to right relative to the quad's lower-left to
/// lower-right direction. Zero dimensions render as one pixel.
pub fn rasterize(grid: &SliceGrid, sampler: &VoxelSampler<'_>, parallel: bool) -> SliceImage {
    let (width, height) = grid.raster_size();
    let mut data = vec![[0u8; 4]; width * height];

    let render_row = |(y, row): (usize, &mut [Sample])| {
        let yp = fraction(y, height);
        for x in 0..width {
            let p = grid.quad.lerp(fraction(x, width), yp);
            row[width - 1 - x] = sampler.sample_world(&p);
        }
    };

    if parallel {
        data.par_chunks_mut(width).enumerate().for_each(render_row);
    } else {
        data.chunks_mut(width).enumerate().for_each(render_row);
    }

    SliceImage {
        width,
        height,
        data,
    }
}

fn fraction(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corners::Quadrilateral;
    use crate::sampler::{Boundary, Interpolation};
    use crate::volume::{VoxelCounts, VoxelVolume};
    use voxslice_math::{Point3, Pose, Vec3};

    fn gradient() -> VoxelVolume {
        VoxelVolume::from_fn(
            VoxelCounts::new(4, 4, 4),
            Vec3::repeat(1.0),
            Pose::identity(),
            |x, y, z| [(x * 60) as u8, (y * 60) as u8, (z * 60) as u8, 255],
        )
        .unwrap()
    }

    /// Vertical section at local z = 0.125 (layer 2), image-aligned.
    fn front_quad() -> Quadrilateral {
        Quadrilateral {
            upper_left: Point3::new(-0.5, 0.5, 0.125),
            lower_left: Point3::new(-0.5, -0.5, 0.125),
            lower_right: Point3::new(0.5, -0.5, 0.125),
            upper_right: Point3::new(0.5, 0.5, 0.125),
        }
    }

    #[test]
    fn test_rasterize_mirrors_columns() {
        let volume = gradient();
        let grid = SliceGrid::new(front_quad(), &volume);
        assert_eq!((grid.width, grid.height), (4, 4));
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        let image = rasterize(&grid, &sampler, false);

        assert_eq!(image.data.len(), 16);
        // Grid x = 0 is the left face (column 0), written to the last pixel.
        assert_eq!(image.get(3, 0), Some([120, 0, 0, 255]));
        assert_eq!(image.get(0, 0), Some([120, 0, 180, 255]));
        // Row 0 is the lower edge, the last row the upper edge.
        assert_eq!(image.get(3, 3), Some([120, 180, 0, 255]));
        assert_eq!(image.get(4, 0), None);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let volume = gradient();
        let quad = Quadrilateral {
            upper_left: Point3::new(-0.5, 0.3, 0.4),
            lower_left: Point3::new(-0.5, -0.4, -0.3),
            lower_right: Point3::new(0.5, -0.4, -0.3),
            upper_right: Point3::new(0.5, 0.3, 0.4),
        };
        let grid = SliceGrid::new(quad, &volume);
        let sampler = VoxelSampler::new(&volume, Interpolation::Bilinear, Boundary::Clamp);
        let a = rasterize(&grid, &sampler, true);
        let b = rasterize(&grid, &sampler, false);
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), a.width * a.height * 4);
    }

    #[test]
    fn test_degenerate_grid_renders_strip() {
        let volume = gradient();
        let p = Point3::new(-0.5, 0.0, 0.0);
        let q = Point3::new(0.5, 0.0, 0.0);
        let grid = SliceGrid::new(
            Quadrilateral {
                upper_left: p,
                lower_left: p,
                lower_right: q,
                upper_right: q,
            },
            &volume,
        );
        assert!(grid.is_degenerate());
        let sampler = VoxelSampler::new(&volume, Interpolation::Nearest, Boundary::Clamp);
        let image = rasterize(&grid, &sampler, true);
        assert_eq!((image.width, image.height), (4, 1));
    }

    #[test]
    fn test_fraction_guards_single_pixel() {
        assert_eq!(fraction(0, 1), 0.0);
        assert_eq!(fraction(0, 0), 0.0);
        assert_eq!(fraction(3, 4), 1.0);
    }
}
