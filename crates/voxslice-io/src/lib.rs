#![warn(missing_docs)]

//! Image stack loading and slice export.
//!
//! A volume is stored on disk as a directory of equally sized 2D images,
//! one per stack layer, ordered by file name. Each image becomes one
//! volume-X layer: image columns run along volume Z and image rows along
//! volume Y, with the top image row at the highest Y.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info, warn};
use voxslice::{SliceError, SliceImage, VoxelCounts, VoxelVolume, TRANSPARENT};
use voxslice_math::{Pose, Vec3};

/// File extensions recognised as stack images (compared case-insensitively).
pub const STACK_EXTENSIONS: &[&str] = &["png", "bmp", "jpg", "jpeg", "tif", "tiff"];

/// Errors from reading stacks or writing slices.
#[derive(Error, Debug)]
pub enum IoError {
    /// Filesystem access failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An image could not be decoded or encoded.
    #[error("image error at {}: {source}", .path.display())]
    Image {
        /// Path of the image.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// A stack image differs in size from the first one.
    #[error(
        "{} is {found_width}x{found_height}, expected {width}x{height}",
        .path.display()
    )]
    DimensionMismatch {
        /// Offending image.
        path: PathBuf,
        /// Width of the first image.
        width: u32,
        /// Height of the first image.
        height: u32,
        /// Width found.
        found_width: u32,
        /// Height found.
        found_height: u32,
    },

    /// The decoded stack does not form a valid volume.
    #[error(transparent)]
    Slice(#[from] SliceError),
}

/// Result type for stack I/O.
pub type Result<T> = std::result::Result<T, IoError>;

/// Image files of a stack directory, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn stack_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| IoError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_stack_image(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Width and height of the first image in `files`, read from its header.
pub fn stack_dimensions(files: &[PathBuf]) -> Result<Option<(u32, u32)>> {
    let Some(first) = files.first() else {
        return Ok(None);
    };
    let reader = ImageReader::open(first).map_err(|source| IoError::Io {
        path: first.clone(),
        source,
    })?;
    let dims = reader.into_dimensions().map_err(|source| IoError::Image {
        path: first.clone(),
        source,
    })?;
    Ok(Some(dims))
}

fn is_stack_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STACK_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Load a directory of images as a volume of physical `size`, centered on
/// `pose`.
///
/// An empty or missing directory yields an empty volume, which slicing
/// rejects up front.
pub fn load_stack(dir: &Path, size: Vec3, pose: Pose) -> Result<VoxelVolume> {
    let files = stack_files(dir)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "no stack images found, volume is empty");
        return Ok(VoxelVolume::empty(size, pose));
    }

    let mut data = Vec::new();
    let mut dims = None;
    for path in &files {
        let img = decode(path)?;
        let (width, height) = *dims.get_or_insert(img.dimensions());
        if img.dimensions() != (width, height) {
            return Err(IoError::DimensionMismatch {
                path: path.clone(),
                width,
                height,
                found_width: img.width(),
                found_height: img.height(),
            });
        }
        if data.is_empty() {
            data.reserve(files.len() * (width * height) as usize);
        }
        append_layer(&mut data, &img);
        debug!(path = %path.display(), "decoded stack image");
    }

    let (width, height) = dims.unwrap_or((0, 0));
    let counts = VoxelCounts::new(files.len(), height as usize, width as usize);
    info!(
        dir = %dir.display(),
        images = counts.x,
        width,
        height,
        "loaded image stack"
    );
    Ok(VoxelVolume::new(counts, size, pose, data)?)
}

fn decode(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path).map_err(|source| IoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = reader.decode().map_err(|source| IoError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Append one layer in volume order: rows bottom to top, columns left to
/// right.
fn append_layer(data: &mut Vec<[u8; 4]>, img: &RgbaImage) {
    for row in (0..img.height()).rev() {
        for col in 0..img.width() {
            data.push(img.get_pixel(col, row).0);
        }
    }
}

/// Convert a slice to an image with the slice's lower edge at the bottom.
pub fn slice_to_rgba_image(image: &SliceImage) -> RgbaImage {
    let (w, h) = (image.width as u32, image.height as u32);
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba(
            image
                .get(x as usize, (h - 1 - y) as usize)
                .unwrap_or(TRANSPARENT),
        )
    })
}

/// Write a slice as PNG.
pub fn save_slice_png(image: &SliceImage, path: &Path) -> Result<()> {
    slice_to_rgba_image(image)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| IoError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), width = image.width, height = image.height, "wrote slice");
    Ok(())
}
