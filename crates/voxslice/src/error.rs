//! Error types for the slicing pipeline.

use thiserror::Error;

/// Errors that can occur while slicing a volume.
///
/// [`SliceError::GeometryDegenerate`] and [`SliceError::CornerResolution`]
/// are ordinary outcomes: they happen whenever the cutting plane leaves the
/// volume or only grazes it. Use [`SliceError::is_no_slice`] to tell them
/// apart from real faults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SliceError {
    /// Volume has a zero voxel count along some axis.
    #[error("volume is empty")]
    EmptyVolume,

    /// The plane crosses fewer than three box edges, or lies on a box face.
    #[error("no slice possible: plane crosses {crossings} box edge(s)")]
    GeometryDegenerate {
        /// Number of distinct edge crossings found.
        crossings: usize,
    },

    /// The crossing points could not be reduced to a valid quadrilateral.
    #[error("corner resolution failed: {0}")]
    CornerResolution(String),

    /// Volume construction parameters are inconsistent.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The shared volume lock was poisoned by a panicking writer.
    #[error("volume is unavailable")]
    VolumeUnavailable,
}

impl SliceError {
    /// True for the geometric outcomes meaning "no slice at this pose".
    pub fn is_no_slice(&self) -> bool {
        matches!(
            self,
            SliceError::GeometryDegenerate { .. } | SliceError::CornerResolution(_)
        )
    }
}

/// Result type for slicing operations.
pub type Result<T> = std::result::Result<T, SliceError>;
