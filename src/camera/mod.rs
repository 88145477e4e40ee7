//! Calibrated camera types shared by the MVE readers.
//!
//! A [`Camera`] couples a [`PinholeModel`] (intrinsics and resolution) with a
//! world-to-camera pose and the location of the image it was reconstructed from.

use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod pinhole;

pub use pinhole::{compute_calibration_matrix, PinholeModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// The larger of width and height, used to scale normalized focal lengths.
    pub fn max_extent(&self) -> u32 {
        self.width.max(self.height)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CameraModelError {
    #[error("Projection is outside the image")]
    ProjectionOutSideImage,
    #[error("z is close to zero or negative, point is not in front of the camera")]
    PointAtCameraCenter,
}

/// Where the image of a view lives.
///
/// MVE keeps every view in its own folder below a shared `views` directory, so the
/// image is addressed relative to that directory and resolved on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
    /// Shared image root of the workspace (the `views` directory).
    pub image_dir: PathBuf,
    /// Path of the image relative to `image_dir`, e.g. `view_0000.mve/undistorted.png`.
    pub relative_path: PathBuf,
}

impl ImageLocation {
    pub fn new(image_dir: impl Into<PathBuf>, relative_path: impl Into<PathBuf>) -> Self {
        ImageLocation {
            image_dir: image_dir.into(),
            relative_path: relative_path.into(),
        }
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn absolute_path(&self) -> PathBuf {
        self.image_dir.join(&self.relative_path)
    }
}

/// A calibrated view of the scene.
///
/// The pose follows the "translation after rotation" convention: a world point
/// `X` maps to camera coordinates as `R * X + t`. Cameras are only created
/// through [`Camera::new`], which takes intrinsics and extrinsics together.
/// Cameras can be serialized for output but not deserialized.
#[derive(Debug, Clone, Serialize)]
pub struct Camera {
    name: String,
    model: PinholeModel,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    image: ImageLocation,
}

impl Camera {
    pub fn new(
        name: impl Into<String>,
        model: PinholeModel,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        image: ImageLocation,
    ) -> Self {
        Camera {
            name: name.into(),
            model,
            rotation,
            translation,
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &PinholeModel {
        &self.model
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.model.intrinsics
    }

    pub fn resolution(&self) -> Resolution {
        self.model.resolution
    }

    /// Focal length in pixels. MVE cameras are isotropic, so `fx == fy`.
    pub fn focal_length(&self) -> f64 {
        self.model.intrinsics.fx
    }

    pub fn principal_point(&self) -> Vector2<f64> {
        Vector2::new(self.model.intrinsics.cx, self.model.intrinsics.cy)
    }

    pub fn calibration_matrix(&self) -> Matrix3<f64> {
        self.model.calibration_matrix()
    }

    /// World-to-camera rotation.
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Translation applied after [`Camera::rotation`].
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Camera center in world coordinates, `-R^T * t`.
    pub fn camera_center(&self) -> Vector3<f64> {
        -(self.rotation.transpose() * self.translation)
    }

    pub fn image(&self) -> &ImageLocation {
        &self.image
    }

    pub fn world_to_camera(&self, point_world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point_world + self.translation
    }

    /// Projects a world point into this camera's image.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::PointAtCameraCenter`] if the point is not in front of the camera.
    /// * [`CameraModelError::ProjectionOutSideImage`] if it lands outside the image.
    pub fn project(&self, point_world: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        self.model.project(&self.world_to_camera(point_world))
    }
}
