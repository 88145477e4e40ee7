//! Reader for the per-view calibration file (`meta.ini`).
//!
//! MVE stores view metadata in INI syntax. Only the `[camera]` section is used:
//!
//! ```text
//! [camera]
//! focal_length = 0.8
//! pixel_aspect = 1
//! principal_point = 0.5 0.5
//! radial_distortion = 0 0
//! rotation = 1 0 0 0 1 0 0 0 1
//! translation = 0 0 0
//! ```
//!
//! Focal length and principal point are normalized by the image size and are
//! converted to pixels here.

use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::distortion::check_radial_distortion;
use super::text::parse_numeric_str;
use super::{ImportWarning, MveError, CAMERA_SECTION, UNDISTORTED_IMAGE};
use crate::camera::{compute_calibration_matrix, Camera, ImageLocation, PinholeModel, Resolution};

/// Key/value pairs of a single INI section.
///
/// Keys are case-insensitive. Accessors fail with a format error instead of
/// falling back to defaults.
#[derive(Debug, Clone)]
pub struct IniSection {
    path: PathBuf,
    name: String,
    values: HashMap<String, String>,
}

impl IniSection {
    /// Reads `section` from the INI file at `path`.
    pub fn load(path: impl AsRef<Path>, section: &str) -> Result<Self, MveError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => MveError::format(path, None, "file is not valid UTF-8"),
            _ => MveError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::parse(&contents, path, section)
    }

    /// Parses `section` from INI text. `path` is only used for error messages.
    pub fn parse(contents: &str, path: impl Into<PathBuf>, section: &str) -> Result<Self, MveError> {
        let path = path.into();
        let mut values = HashMap::new();
        let mut found = false;
        let mut in_section = false;

        for (idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = name.trim() == section;
                found |= in_section;
                continue;
            }
            if !in_section {
                continue;
            }

            let split_at = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| {
                MveError::format(&path, Some(idx + 1), format!("expected 'key = value', got '{line}'"))
            })?;
            let key = line[..split_at].trim().to_lowercase();
            let value = line[split_at + 1..].trim().to_string();
            if values.insert(key.clone(), value).is_some() {
                return Err(MveError::format(
                    &path,
                    Some(idx + 1),
                    format!("duplicate key '{key}' in section [{section}]"),
                ));
            }
        }

        if !found {
            return Err(MveError::format(
                &path,
                None,
                format!("missing section [{section}]"),
            ));
        }

        Ok(IniSection {
            path,
            name: section.to_string(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Result<&str, MveError> {
        self.values
            .get(&key.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| MveError::MissingKey {
                path: self.path.clone(),
                section: self.name.clone(),
                key: key.to_string(),
            })
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, MveError> {
        let value = self.get(key)?;
        value
            .parse::<f64>()
            .map_err(|_| self.invalid_value(key, value, "a floating-point number"))
    }

    /// Whitespace-separated list of values.
    pub fn get_vec<T: FromStr>(&self, key: &str) -> Result<Vec<T>, MveError> {
        let value = self.get(key)?;
        parse_numeric_str(value).map_err(|token| {
            self.invalid_value(
                key,
                value,
                &format!("a list of {} (bad token '{token}')", std::any::type_name::<T>()),
            )
        })
    }

    /// Whitespace-separated list of exactly `N` values.
    pub fn get_array<T: FromStr, const N: usize>(&self, key: &str) -> Result<[T; N], MveError> {
        let values = self.get_vec::<T>(key)?;
        let count = values.len();
        values.try_into().map_err(|_| {
            MveError::format(
                &self.path,
                None,
                format!("key '{key}' must hold {N} values, got {count}"),
            )
        })
    }

    fn invalid_value(&self, key: &str, value: &str, expected: &str) -> MveError {
        MveError::format(
            &self.path,
            None,
            format!("key '{key}' = '{value}' is not {expected}"),
        )
    }
}

/// Builds the camera of one view from its `meta.ini`.
///
/// `resolution` is the pixel size of the view's undistorted image. Non-fatal
/// issues are logged and appended to `warnings`.
///
/// # Errors
///
/// * [`MveError::Io`] if the file cannot be read.
/// * [`MveError::MissingKey`] if a calibration key is absent.
/// * [`MveError::Format`] if a value is not numeric or has the wrong number of entries.
pub fn parse_meta_file(
    meta_path: impl AsRef<Path>,
    resolution: Resolution,
    camera_name: &str,
    suppress_distortion_warnings: bool,
    warnings: &mut Vec<ImportWarning>,
) -> Result<Camera, MveError> {
    let meta_path = meta_path.as_ref();
    let section = IniSection::load(meta_path, CAMERA_SECTION)?;
    let image = image_location_for(meta_path);
    build_camera(
        &section,
        resolution,
        camera_name,
        image,
        suppress_distortion_warnings,
        warnings,
    )
}

/// The undistorted image sits next to `meta.ini`; its path is kept relative to
/// the directory holding all view folders.
fn image_location_for(meta_path: &Path) -> ImageLocation {
    let view_dir = meta_path.parent().unwrap_or_else(|| Path::new(""));
    let image_dir = view_dir.parent().unwrap_or_else(|| Path::new(""));
    let relative_path = match view_dir.file_name() {
        Some(folder) => Path::new(folder).join(UNDISTORTED_IMAGE),
        None => PathBuf::from(UNDISTORTED_IMAGE),
    };
    ImageLocation::new(image_dir, relative_path)
}

pub(crate) fn build_camera(
    section: &IniSection,
    resolution: Resolution,
    camera_name: &str,
    image: ImageLocation,
    suppress_distortion_warnings: bool,
    warnings: &mut Vec<ImportWarning>,
) -> Result<Camera, MveError> {
    let mut focal_length_normalized = section.get_f64("focal_length")?;
    let pixel_aspect = section.get_f64("pixel_aspect")?;
    if pixel_aspect != 1.0 {
        let warning = ImportWarning::AnisotropicFocalLength {
            camera: camera_name.to_string(),
            pixel_aspect,
        };
        warn!("{}", warning);
        warnings.push(warning);
        focal_length_normalized =
            (focal_length_normalized + focal_length_normalized * pixel_aspect) / 2.0;
    }
    let focal_length = focal_length_normalized * resolution.max_extent() as f64;

    let [cx_normalized, cy_normalized] = section.get_array::<f64, 2>("principal_point")?;
    let cx = cx_normalized * resolution.width as f64;
    let cy = cy_normalized * resolution.height as f64;

    let calibration = compute_calibration_matrix(focal_length, cx, cy);
    let model = PinholeModel::from_calibration_matrix(&calibration, resolution);

    let radial_distortion = section.get_vec::<f64>("radial_distortion")?;
    let context = image.relative_path().display().to_string();
    if let Some(warning) =
        check_radial_distortion(&radial_distortion, &context, suppress_distortion_warnings)
    {
        warnings.push(warning);
    }

    let rotation = section.get_array::<f64, 9>("rotation")?;
    let translation = section.get_array::<f64, 3>("translation")?;

    debug!(
        "Camera {}: f = {:.3} px, c = ({:.3}, {:.3}), {}x{}",
        camera_name, focal_length, cx, cy, resolution.width, resolution.height
    );

    Ok(Camera::new(
        camera_name,
        model,
        Matrix3::from_row_slice(&rotation),
        Vector3::from(translation),
        image,
    ))
}
