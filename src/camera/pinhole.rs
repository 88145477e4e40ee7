//! Implements the Pinhole camera model used for MVE views.
//!
//! MVE stores undistorted views, so the intrinsics reduce to a single focal
//! length and a principal point. This module converts between those values and
//! the 3x3 calibration matrix and projects camera-frame points to pixels.

use crate::camera::{CameraModelError, Intrinsics, Resolution};
use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Builds the pinhole calibration matrix for an isotropic focal length.
///
/// ```text
/// | f  0  cx |
/// | 0  f  cy |
/// | 0  0  1  |
/// ```
///
/// # Examples
///
/// ```rust
/// use mve_importer::camera::compute_calibration_matrix;
///
/// let k = compute_calibration_matrix(640.0, 400.0, 300.0);
/// assert_eq!(k[(0, 0)], 640.0);
/// assert_eq!(k[(1, 2)], 300.0);
/// assert_eq!(k[(2, 2)], 1.0);
/// ```
pub fn compute_calibration_matrix(focal_length: f64, cx: f64, cy: f64) -> Matrix3<f64> {
    Matrix3::new(
        focal_length,
        0.0,
        cx,
        0.0,
        focal_length,
        cy,
        0.0,
        0.0,
        1.0,
    )
}

/// Represents a Pinhole camera model.
///
/// Holds the intrinsic parameters in pixel units together with the image
/// resolution they refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinholeModel {
    /// The intrinsic parameters of the camera, [`Intrinsics`] (fx, fy, cx, cy).
    pub intrinsics: Intrinsics,
    /// The resolution of the camera image, [`Resolution`] (width, height).
    pub resolution: Resolution,
}

impl PinholeModel {
    /// Reads fx, fy, cx and cy from a calibration matrix.
    ///
    /// Skew is not represented and is ignored.
    pub fn from_calibration_matrix(calibration: &Matrix3<f64>, resolution: Resolution) -> Self {
        PinholeModel {
            intrinsics: Intrinsics {
                fx: calibration[(0, 0)],
                fy: calibration[(1, 1)],
                cx: calibration[(0, 2)],
                cy: calibration[(1, 2)],
            },
            resolution,
        }
    }

    pub fn calibration_matrix(&self) -> Matrix3<f64> {
        let mut calibration = compute_calibration_matrix(
            self.intrinsics.fx,
            self.intrinsics.cx,
            self.intrinsics.cy,
        );
        calibration[(1, 1)] = self.intrinsics.fy;
        calibration
    }

    /// Projects a 3D point from camera coordinates to pixel coordinates.
    ///
    /// `u = fx * X / Z + cx`, `v = fy * Y / Z + cy`
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::PointAtCameraCenter`]: If Z is too close to zero or negative.
    /// * [`CameraModelError::ProjectionOutSideImage`]: If the pixel falls outside the resolution.
    pub fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        // If z is very small, the point is at the camera center
        if point_3d.z < f64::EPSILON.sqrt() {
            return Err(CameraModelError::PointAtCameraCenter);
        }
        let u = self.intrinsics.fx * point_3d.x / point_3d.z + self.intrinsics.cx;
        let v = self.intrinsics.fy * point_3d.y / point_3d.z + self.intrinsics.cy;

        if u < 0.0
            || u >= self.resolution.width as f64
            || v < 0.0
            || v >= self.resolution.height as f64
        {
            return Err(CameraModelError::ProjectionOutSideImage);
        }

        Ok(Vector2::new(u, v))
    }
}
