//! MVE Importer Library
//!
//! Reads reconstruction workspaces of the MVE (Multi-View Environment)
//! photogrammetry pipeline into calibrated cameras and a sparse point cloud.
//! This library provides:
//! - A pinhole camera type with world-to-camera pose and image location
//! - Readers for the bundle file (`synth_0.out`) and per-view `meta.ini` files
//! - A workspace reader that combines both into an [`MveScene`]
//!
//! ```no_run
//! use mve_importer::{parse_workspace, ImportOptions};
//!
//! let scene = parse_workspace("path/to/workspace", &ImportOptions::default())?;
//! println!("{} cameras, {} points", scene.cameras.len(), scene.points.len());
//! # Ok::<(), mve_importer::MveError>(())
//! ```

pub mod camera;
pub mod mve;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, CameraModelError, ImageLocation, Intrinsics, PinholeModel, Resolution};

pub use mve::{
    parse_bundle_file, parse_meta_file, parse_workspace, parse_workspace_with, ImageHeaderResolver,
    ImageSizeResolver, ImportOptions, ImportWarning, MveError,
};

pub use scene::{export_points_csv, MveScene, Point3D, SceneSummary};
