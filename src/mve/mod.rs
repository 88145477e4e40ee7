//! Readers for MVE (Multi-View Environment) reconstruction workspaces.
//!
//! A workspace looks like this:
//!
//! ```text
//! <root>/
//!   synth_0.out               bundle file: sparse points (+ camera placeholders)
//!   views/
//!     view_0000.mve/
//!       meta.ini              calibration of this view
//!       undistorted.png       undistorted image, used for its dimensions
//!     view_0001.mve/
//!       ...
//! ```
//!
//! The bundle file is only used for points. Its camera records lack the image
//! dimensions and the full distortion model, so calibration always comes from the
//! per-view `meta.ini` files.

use std::fmt;
use std::path::PathBuf;

pub mod bundle;
pub mod distortion;
pub mod meta;
pub mod options;
pub mod text;
pub mod workspace;

pub use bundle::{parse_bundle, parse_bundle_file};
pub use distortion::check_radial_distortion;
pub use meta::{parse_meta_file, IniSection};
pub use options::ImportOptions;
pub use workspace::{
    camera_name_from_folder, parse_views, parse_workspace, parse_workspace_with,
    ImageHeaderResolver, ImageSizeResolver,
};

pub const VIEWS_DIR: &str = "views";
pub const BUNDLE_FILE: &str = "synth_0.out";
pub const META_FILE: &str = "meta.ini";
pub const UNDISTORTED_IMAGE: &str = "undistorted.png";
pub const CAMERA_SECTION: &str = "camera";

#[derive(thiserror::Error, Debug)]
pub enum MveError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid format in {:?}{}: {}", .path, line_suffix(.line), .message)]
    Format {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },
    #[error("Missing key '{key}' in section [{section}] of {path:?}")]
    MissingKey {
        path: PathBuf,
        section: String,
        key: String,
    },
    #[error("Cannot determine image size of {path:?}: {reason}")]
    ImageSize { path: PathBuf, reason: String },
    #[error("Failed to handle YAML: {0}")]
    Yaml(String),
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

impl MveError {
    pub(crate) fn format(
        path: impl Into<PathBuf>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        MveError::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for schema violations, including missing configuration keys.
    pub fn is_format_error(&self) -> bool {
        matches!(self, MveError::Format { .. } | MveError::MissingKey { .. })
    }
}

impl From<yaml_rust::ScanError> for MveError {
    fn from(err: yaml_rust::ScanError) -> Self {
        MveError::Yaml(err.to_string())
    }
}

impl From<serde_yaml::Error> for MveError {
    fn from(err: serde_yaml::Error) -> Self {
        MveError::Yaml(err.to_string())
    }
}

/// Non-fatal problems found while importing. Each one is logged once and kept in
/// [`crate::scene::MveScene::warnings`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    /// `pixel_aspect` differs from 1; the focal length was averaged over both axes.
    AnisotropicFocalLength { camera: String, pixel_aspect: f64 },
    /// Radial distortion is present but not corrected for.
    RadialDistortion {
        context: String,
        coefficients: Vec<f64>,
    },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::AnisotropicFocalLength {
                camera,
                pixel_aspect,
            } => write!(
                f,
                "Focal length of camera {camera} differs in x and y direction (pixel aspect {pixel_aspect}), setting it to the average value."
            ),
            ImportWarning::RadialDistortion {
                context,
                coefficients,
            } => write!(
                f,
                "Radial distortion of {context} is not supported and will be ignored: {coefficients:?}. \
                 Re-compute the reconstruction without radial distortion or suppress distortion warnings."
            ),
        }
    }
}
