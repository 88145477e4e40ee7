//! Reader for the workspace bundle file (`synth_0.out`).
//!
//! ## Format
//!
//! 1. **Marker line**: format/version banner, not interpreted.
//! 2. **Header line**: `<num_cameras> <num_points>`
//! 3. **Camera blocks**: 5 lines per camera (intrinsics line, 3 rotation rows,
//!    translation line).
//! 4. **Point blocks**: 3 lines per point (position, color, measurement list).
//!
//! Camera blocks are consumed but not returned: the per-view `meta.ini` files
//! carry the authoritative calibration.

use log::debug;
use nalgebra::{Matrix3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::text::{parse_fixed_line, parse_numeric_line, parse_rotation_matrix, LineReader};
use super::MveError;
use crate::scene::Point3D;

/// Camera record of the bundle file.
///
/// Only its shape is checked. The values are superseded by the view calibration.
#[derive(Debug, Clone)]
pub struct CameraPlaceholder {
    pub intrinsics: Vec<f64>,
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Parses the bundle file at `path` into its point cloud.
///
/// # Errors
///
/// * [`MveError::Io`] if the file cannot be opened or read.
/// * [`MveError::Format`] if the header is malformed, a record has the wrong shape,
///   or the file ends before the declared number of cameras and points.
pub fn parse_bundle_file(path: impl AsRef<Path>) -> Result<Vec<Point3D>, MveError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_bundle(&mut LineReader::new(BufReader::new(file), path))
}

/// Parses a bundle stream. See [`parse_bundle_file`].
pub fn parse_bundle<R: BufRead>(reader: &mut LineReader<R>) -> Result<Vec<Point3D>, MveError> {
    let marker = reader.next_line()?;
    debug!("Bundle marker: {}", marker);

    let [num_cameras, num_points] = parse_fixed_line::<usize, R, 2>(reader, "bundle header")?;
    debug!(
        "Bundle header: {} cameras, {} points",
        num_cameras, num_points
    );

    for _ in 0..num_cameras {
        // Keeps the stream aligned; the data itself is dropped.
        let _placeholder = parse_camera_placeholder(reader)?;
    }

    // The header count is untrusted until the records are actually read.
    let mut points = Vec::new();
    for id in 0..num_points {
        points.push(parse_point(reader, id)?);
    }
    Ok(points)
}

fn parse_camera_placeholder<R: BufRead>(
    reader: &mut LineReader<R>,
) -> Result<CameraPlaceholder, MveError> {
    let intrinsics = parse_numeric_line::<f64, R>(reader)?;
    let rotation = parse_rotation_matrix(reader)?;
    let translation = parse_fixed_line::<f64, R, 3>(reader, "camera translation")?;
    Ok(CameraPlaceholder {
        intrinsics,
        rotation,
        translation: Vector3::from(translation),
    })
}

fn parse_point<R: BufRead>(reader: &mut LineReader<R>, id: usize) -> Result<Point3D, MveError> {
    let position = parse_fixed_line::<f64, R, 3>(reader, "point position")?;

    let channels = parse_fixed_line::<i64, R, 3>(reader, "point color")?;
    let mut color = [0u8; 3];
    for (dst, value) in color.iter_mut().zip(channels) {
        *dst = u8::try_from(value).map_err(|_| {
            reader.error(format!("color channel {value} is outside 0..=255"))
        })?;
    }

    // Visibility list: parsed to validate the tokens, not retained.
    let _measurements = parse_numeric_line::<i64, R>(reader)?;

    Ok(Point3D {
        id,
        position: Vector3::from(position),
        color,
        scalars: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(text: &str) -> Result<Vec<Point3D>, MveError> {
        let mut reader = LineReader::new(Cursor::new(text.as_bytes().to_vec()), "synth_0.out");
        parse_bundle(&mut reader)
    }

    const CAMERA_BLOCK: &str = "0.8 0 0\n1 0 0\n0 1 0\n0 0 1\n0 0 0\n";

    fn point_block(i: usize) -> String {
        format!(
            "{}.5 -{} 2\n{} {} {}\n2 0 {} 0 1 {} 0\n",
            i,
            i,
            i * 10,
            i * 20,
            i * 30,
            i,
            i
        )
    }

    fn bundle_text(num_cameras: usize, declared_points: usize, written_points: usize) -> String {
        let mut text = format!("drews 1.0\n{num_cameras} {declared_points}\n");
        for _ in 0..num_cameras {
            text.push_str(CAMERA_BLOCK);
        }
        for i in 0..written_points {
            text.push_str(&point_block(i));
        }
        text
    }

    #[test]
    fn test_points_are_numbered_in_file_order() {
        let points = parse_str(&bundle_text(2, 4, 4)).unwrap();

        assert_eq!(points.len(), 4);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.id, i);
            assert_eq!(point.position, Vector3::new(i as f64 + 0.5, -(i as f64), 2.0));
            assert_eq!(
                point.color,
                [(i * 10) as u8, (i * 20) as u8, (i * 30) as u8]
            );
            assert!(point.scalars.is_empty());
        }
    }

    #[test]
    fn test_camera_block_values_are_not_interpreted() {
        let garbage_cameras = "1e9 -3 42 7 7\n\
                               5 5 5\n-1 -1 -1\n100 200 300\n\
                               9 9 9\n\
                               \n\
                               0 0 0\n0 0 0\n0 0 0\n\
                               -0.1 0.2 1e-3\n";
        let text = format!(
            "drews 1.0\n2 2\n{garbage_cameras}{}{}",
            point_block(0),
            point_block(1)
        );
        let expected = parse_str(&bundle_text(2, 2, 2)).unwrap();
        assert_eq!(parse_str(&text).unwrap(), expected);
    }

    #[test]
    fn test_truncated_point_list_is_an_error() {
        let err = parse_str(&bundle_text(1, 5, 3)).unwrap_err();
        match err {
            MveError::Format { message, .. } => assert!(message.contains("end of file")),
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_point_count_fails_at_end_of_file() {
        for count in ["18446744073709551615", "100000000000"] {
            let text = format!("drews 1.0\n0 {count}\n0 0 0\n1 2 3\n0\n");
            let err = parse_str(&text).unwrap_err();
            assert!(err.is_format_error());
            assert!(err.to_string().contains("line 6"));
        }
    }

    #[test]
    fn test_truncated_camera_block_is_an_error() {
        let text = "drews 1.0\n1 0\n0.8 0 0\n1 0 0\n0 1 0\n";
        assert!(parse_str(text).unwrap_err().is_format_error());
    }

    #[test]
    fn test_malformed_header() {
        assert!(parse_str("").unwrap_err().is_format_error());
        assert!(parse_str("drews 1.0\n").unwrap_err().is_format_error());
        assert!(parse_str("drews 1.0\n3\n").unwrap_err().is_format_error());
        assert!(parse_str("drews 1.0\n-1 2\n").unwrap_err().is_format_error());
        assert!(parse_str("drews 1.0\n0 0\n").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_point_records() {
        let bad_color = "drews 1.0\n0 1\n0 0 0\n256 0 0\n0\n";
        let err = parse_str(bad_color).unwrap_err();
        assert!(err.to_string().contains("outside 0..=255"));
        assert!(err.to_string().contains("line 4"));

        let bad_measurement = "drews 1.0\n0 1\n0 0 0\n1 2 3\n1 0 0.5\n";
        assert!(parse_str(bad_measurement).unwrap_err().is_format_error());

        let short_position = "drews 1.0\n0 1\n0 0\n1 2 3\n0\n";
        assert!(parse_str(short_position).unwrap_err().is_format_error());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_bundle_file("samples/does_not_exist/synth_0.out").unwrap_err();
        assert!(matches!(err, MveError::Io { .. }));
    }

    #[test]
    fn test_parse_sample_workspace_bundle() {
        let points = parse_bundle_file("samples/mve_workspace/synth_0.out").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].position, Vector3::new(0.25, -0.5, 4.0));
        assert_eq!(points[2].color, [12, 200, 255]);
        assert_eq!(points[2].id, 2);
    }
}
