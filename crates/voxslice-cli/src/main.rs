//! voxslice CLI - slice image stacks from the command line
//!
//! Loads a directory of images as a voxel volume, cuts it with a plane and
//! writes the cross-section as PNG.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxslice::{Boundary, Interpolation, SliceOutput, VoxelCounts};
use voxslice_math::{Point3, Vec3};

mod config;

use config::Scene;

#[derive(Parser)]
#[command(name = "voxslice")]
#[command(about = "Planar slicing of voxel image stacks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about an image stack
    Info {
        /// Directory of stack images
        #[arg(long)]
        stack: PathBuf,
        /// Physical volume size (x y z) used to report the voxel step
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        size: Option<Vec<f64>>,
    },
    /// Slice a volume as described by a scene file
    Slice {
        /// Scene file (.toml)
        #[arg(long)]
        scene: PathBuf,
        /// Output PNG
        #[arg(short, long)]
        out: PathBuf,
        /// Write slice corners as JSON
        #[arg(long)]
        corners: Option<PathBuf>,
        /// Override the scene's interpolation
        #[arg(long, value_enum)]
        interpolation: Option<InterpolationArg>,
        /// Return this RGBA color outside the volume instead of clamping (e.g. 0,0,0,255)
        #[arg(long, value_parser = parse_rgba)]
        background: Option<[u8; 4]>,
        /// Render on a single thread
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InterpolationArg {
    Nearest,
    Bilinear,
}

impl From<InterpolationArg> for Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Nearest => Interpolation::Nearest,
            InterpolationArg::Bilinear => Interpolation::Bilinear,
        }
    }
}

fn parse_rgba(s: &str) -> std::result::Result<[u8; 4], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b, a] = parts.as_slice() else {
        return Err(format!("expected r,g,b,a, got '{s}'"));
    };
    let channel = |c: &str| c.parse::<u8>().map_err(|e| format!("bad channel '{c}': {e}"));
    Ok([channel(*r)?, channel(*g)?, channel(*b)?, channel(*a)?])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { stack, size } => {
            show_info(&stack, size.as_deref())?;
        }
        Commands::Slice {
            scene,
            out,
            corners,
            interpolation,
            background,
            sequential,
        } => {
            let mut scene = Scene::load(&scene)?;
            if let Some(interpolation) = interpolation {
                scene.settings.interpolation = interpolation.into();
            }
            if let Some(color) = background {
                scene.settings.boundary = Boundary::Background(color);
            }
            if sequential {
                scene.settings.parallel = false;
            }
            slice_scene(&scene, &out, corners.as_deref())?;
        }
    }

    Ok(())
}

fn show_info(stack: &Path, size: Option<&[f64]>) -> Result<()> {
    let files = voxslice_io::stack_files(stack)
        .with_context(|| format!("cannot list {}", stack.display()))?;
    let size = match size {
        Some([x, y, z]) => Vec3::new(*x, *y, *z),
        _ => Vec3::repeat(1.0),
    };
    let (width, height) = voxslice_io::stack_dimensions(&files)?.unwrap_or((0, 0));
    let counts = VoxelCounts::new(files.len(), height as usize, width as usize);

    println!("Image stack: {}", stack.display());
    println!("  Images: {}", files.len());
    if let (Some(first), Some(last)) = (files.first(), files.last()) {
        println!("  First: {}", first.display());
        println!("  Last: {}", last.display());
    }
    println!("  Image size: {}x{}", counts.z, counts.y);
    println!("  Voxels: {} x {} x {}", counts.x, counts.y, counts.z);
    let step = counts.step_size(size);
    println!("  Step: ({:.6}, {:.6}, {:.6})", step.x, step.y, step.z);

    Ok(())
}

fn slice_scene(scene: &Scene, out: &Path, corners: Option<&Path>) -> Result<()> {
    let volume_pose = scene.volume.to_pose().context("invalid volume pose")?;
    let cut = scene.cut.to_pose().context("invalid cut pose")?;
    let volume = voxslice_io::load_stack(&scene.stack, scene.volume_size(), volume_pose)
        .with_context(|| format!("cannot load stack {}", scene.stack.display()))?;

    let output = match voxslice::slice(&volume, &cut, &scene.settings) {
        Ok(output) => output,
        Err(e) if e.is_no_slice() => {
            anyhow::bail!("no slice at this pose ({e})");
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        width = output.image.width,
        height = output.image.height,
        polygon = output.polygon.len(),
        "slice rendered"
    );
    voxslice_io::save_slice_png(&output.image, out)?;
    println!(
        "Wrote {}x{} slice to {}",
        output.image.width,
        output.image.height,
        out.display()
    );

    if let Some(path) = corners {
        let report = CornersReport::new(&output);
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("Wrote corners to {}", path.display());
    }

    Ok(())
}

/// Placement data for showing the slice in a scene.
#[derive(Serialize)]
struct CornersReport {
    width: usize,
    height: usize,
    upper_left: [f64; 3],
    lower_left: [f64; 3],
    lower_right: [f64; 3],
    upper_right: [f64; 3],
    /// Same corners as voxel-boundary positions.
    voxel_corners: [[f64; 3]; 4],
    /// Exact section polygon.
    polygon: Vec<[f64; 3]>,
}

impl CornersReport {
    fn new(output: &SliceOutput) -> Self {
        let xyz = |p: &Point3| [p.x, p.y, p.z];
        Self {
            width: output.image.width,
            height: output.image.height,
            upper_left: xyz(&output.quad.upper_left),
            lower_left: xyz(&output.quad.lower_left),
            lower_right: xyz(&output.quad.lower_right),
            upper_right: xyz(&output.quad.upper_right),
            voxel_corners: output.voxel_corners.map(|p| xyz(&p)),
            polygon: output.polygon.iter().map(xyz).collect(),
        }
    }
}
