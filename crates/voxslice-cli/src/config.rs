//! Scene files: where the stack lives, where the volume sits and where to cut.
//!
//! ```toml
//! stack = "scans/knee"
//!
//! [volume]
//! size = [0.2, 0.2, 0.15]
//! position = [0.0, 1.0, 0.0]
//!
//! [cut]
//! position = [0.0, 1.0, 0.02]
//! euler_degrees = [0.0, 30.0, 0.0]
//!
//! [settings]
//! interpolation = "bilinear"
//! boundary = { background = [0, 0, 0, 255] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use nalgebra::Quaternion;
use serde::Deserialize;
use voxslice::SliceSettings;
use voxslice_math::{Point3, Pose, Rot3, Vec3};

/// A rigid placement as written in a scene file.
///
/// Orientation is given either as Euler angles in degrees (roll about X,
/// pitch about Y, yaw about Z) or as a quaternion `[w, x, y, z]`, not both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseConfig {
    /// World position, defaults to the origin.
    #[serde(default)]
    pub position: [f64; 3],
    /// Roll, pitch and yaw in degrees.
    pub euler_degrees: Option<[f64; 3]>,
    /// Rotation as `[w, x, y, z]`, normalized on use.
    pub quaternion: Option<[f64; 4]>,
}

impl PoseConfig {
    /// Resolve to a pose, rejecting conflicting or zero rotations.
    pub fn to_pose(&self) -> Result<Pose> {
        let position = Point3::from(self.position);
        match (self.euler_degrees, self.quaternion) {
            (Some(_), Some(_)) => bail!("give either euler_degrees or quaternion, not both"),
            (Some(euler), None) => Ok(Pose::from_euler_degrees(position, euler)),
            (None, Some([w, x, y, z])) => {
                let q = Quaternion::new(w, x, y, z);
                if q.norm() < 1e-12 {
                    bail!("quaternion must be non-zero");
                }
                Ok(Pose::new(position, Rot3::from_quaternion(q)))
            }
            (None, None) => Ok(Pose::from_position(position)),
        }
    }
}

/// Volume placement: physical size in its local frame plus pose.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeConfig {
    /// Physical size along local X, Y and Z.
    pub size: [f64; 3],
    /// World position of the volume center.
    #[serde(default)]
    pub position: [f64; 3],
    /// Roll, pitch and yaw in degrees.
    pub euler_degrees: Option<[f64; 3]>,
    /// Rotation as `[w, x, y, z]`.
    pub quaternion: Option<[f64; 4]>,
}

impl VolumeConfig {
    /// Pose of the volume center.
    pub fn to_pose(&self) -> Result<Pose> {
        PoseConfig {
            position: self.position,
            euler_degrees: self.euler_degrees,
            quaternion: self.quaternion,
        }
        .to_pose()
    }
}

/// A complete slicing scene.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Stack directory, relative to the scene file.
    pub stack: PathBuf,
    /// Placement of the volume.
    pub volume: VolumeConfig,
    /// Pose of the cutting plane.
    pub cut: PoseConfig,
    /// Slicing parameters, defaults when missing.
    #[serde(default)]
    pub settings: SliceSettings,
}

impl Scene {
    /// Parse and validate a scene from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(text).context("invalid scene file")?;
        scene.settings.validate()?;
        Ok(scene)
    }

    /// Read a scene file, resolving a relative stack path against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read scene {}", path.display()))?;
        let mut scene = Self::from_toml(&text)
            .with_context(|| format!("in scene {}", path.display()))?;
        if scene.stack.is_relative() {
            if let Some(base) = path.parent() {
                scene.stack = base.join(&scene.stack);
            }
        }
        Ok(scene)
    }

    /// Physical volume size.
    pub fn volume_size(&self) -> Vec3 {
        Vec3::from(self.volume.size)
    }
}
