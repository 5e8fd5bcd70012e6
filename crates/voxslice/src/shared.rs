//! A volume shared between slicing readers and a replacing writer.

use std::sync::{Arc, RwLock};

use tracing::info;
use voxslice_math::Pose;

use crate::error::{Result, SliceError};
use crate::volume::VoxelVolume;
use crate::{slice, SliceOutput, SliceSettings};

/// Cloneable handle to a volume that may be replaced while slices run.
///
/// Slices hold a read lock for their whole duration; [`SharedVolume::replace`]
/// waits for them to finish, so a slice never observes a half-replaced
/// volume.
#[derive(Debug, Clone)]
pub struct SharedVolume {
    inner: Arc<RwLock<VoxelVolume>>,
}

impl SharedVolume {
    /// Wrap a volume.
    pub fn new(volume: VoxelVolume) -> Self {
        Self {
            inner: Arc::new(RwLock::new(volume)),
        }
    }

    /// Slice the current volume.
    pub fn slice(&self, pose: &Pose, settings: &SliceSettings) -> Result<SliceOutput> {
        let volume = self.inner.read().map_err(|_| SliceError::VolumeUnavailable)?;
        slice(&volume, pose, settings)
    }

    /// Swap in a new volume, returning the previous one.
    pub fn replace(&self, volume: VoxelVolume) -> Result<VoxelVolume> {
        let mut guard = self.inner.write().map_err(|_| SliceError::VolumeUnavailable)?;
        info!(counts = ?volume.counts(), "replacing shared volume");
        Ok(std::mem::replace(&mut *guard, volume))
    }

    /// Run `f` with read access to the current volume.
    pub fn with<R>(&self, f: impl FnOnce(&VoxelVolume) -> R) -> Result<R> {
        let volume = self.inner.read().map_err(|_| SliceError::VolumeUnavailable)?;
        Ok(f(&volume))
    }
}
