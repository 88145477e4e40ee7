//! Scene-level containers produced by the workspace reader.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::camera::Camera;
use crate::mve::{ImportWarning, MveError};

/// One reconstructed point of the sparse cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    /// Ordinal position in the bundle file.
    pub id: usize,
    pub position: Vector3<f64>,
    pub color: [u8; 3],
    /// Per-point scalar attributes. MVE provides none.
    pub scalars: Vec<f64>,
}

/// Cameras and points read from one workspace.
///
/// The two lists are independent: cameras never reference points and vice versa.
#[derive(Debug, Clone, Default)]
pub struct MveScene {
    pub cameras: Vec<Camera>,
    pub points: Vec<Point3D>,
    /// Non-fatal issues in the order they were reported.
    pub warnings: Vec<ImportWarning>,
}

impl MveScene {
    pub fn into_parts(self) -> (Vec<Camera>, Vec<Point3D>) {
        (self.cameras, self.points)
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            num_cameras: self.cameras.len(),
            num_points: self.points.len(),
            camera_names: self.cameras.iter().map(|c| c.name().to_string()).collect(),
            bounding_box: bounding_box(&self.points),
            num_warnings: self.warnings.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub num_cameras: usize,
    pub num_points: usize,
    pub camera_names: Vec<String>,
    pub bounding_box: Option<BoundingBox>,
    pub num_warnings: usize,
}

/// Axis-aligned bounds of the point positions, `None` for an empty cloud.
pub fn bounding_box(points: &[Point3D]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (min, max) = points.iter().fold(
        (first.position, first.position),
        |(min, max), point| (min.inf(&point.position), max.sup(&point.position)),
    );
    Some(BoundingBox {
        min: [min.x, min.y, min.z],
        max: [max.x, max.y, max.z],
    })
}

#[derive(Serialize)]
struct PointRecord {
    id: usize,
    x: f64,
    y: f64,
    z: f64,
    r: u8,
    g: u8,
    b: u8,
}

/// Writes the point cloud as CSV with the header `id,x,y,z,r,g,b`.
pub fn export_points_csv(points: &[Point3D], path: impl AsRef<Path>) -> Result<(), MveError> {
    let path = path.as_ref();
    let to_error = |e: csv::Error| MveError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for point in points {
        writer
            .serialize(PointRecord {
                id: point.id,
                x: point.position.x,
                y: point.position.y,
                z: point.position.z,
                r: point.color[0],
                g: point.color[1],
                b: point.color[2],
            })
            .map_err(to_error)?;
    }
    writer.flush().map_err(|e| MveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
