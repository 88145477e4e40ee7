//! Reads a complete MVE workspace: one camera per view folder plus the sparse
//! point cloud of the bundle file.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::bundle::parse_bundle_file;
use super::meta::parse_meta_file;
use super::options::ImportOptions;
use super::{ImportWarning, MveError, BUNDLE_FILE, META_FILE, UNDISTORTED_IMAGE, VIEWS_DIR};
use crate::camera::{Camera, Resolution};
use crate::scene::MveScene;

/// Source of image dimensions for the views.
pub trait ImageSizeResolver {
    /// Returns the pixel size of the image at `path`.
    ///
    /// Implementations fall back to `default` when the image cannot be read and
    /// fail with [`MveError::ImageSize`] when no default is available.
    fn resolve(&self, path: &Path, default: Option<&Resolution>)
        -> Result<Resolution, MveError>;
}

/// Reads the dimensions from the image header with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageHeaderResolver;

impl ImageSizeResolver for ImageHeaderResolver {
    fn resolve(
        &self,
        path: &Path,
        default: Option<&Resolution>,
    ) -> Result<Resolution, MveError> {
        match image::image_dimensions(path) {
            Ok((width, height)) => Ok(Resolution { width, height }),
            Err(err) => match default {
                Some(resolution) => {
                    info!(
                        "Cannot read image size of {:?} ({}), using default {}x{}",
                        path, err, resolution.width, resolution.height
                    );
                    Ok(*resolution)
                }
                None => Err(MveError::ImageSize {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                }),
            },
        }
    }
}

/// Extracts the camera name from a view folder name: `view_0007.mve` gives `0007`.
///
/// The name is the segment after the first `_`, cut at the next `_` or `.`.
pub fn camera_name_from_folder(folder_name: &str) -> Result<String, MveError> {
    let (_, rest) = folder_name.split_once('_').ok_or_else(|| {
        MveError::format(
            folder_name,
            None,
            "view folder name does not follow the 'view_<id>.mve' convention",
        )
    })?;
    let name = rest
        .split(|c: char| c == '_' || c == '.')
        .next()
        .unwrap_or(rest);
    Ok(name.to_string())
}

/// Immediate subdirectories of `dir`, sorted by name.
fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, MveError> {
    let io_error = |e: std::io::Error| MveError::Io {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

/// Builds one camera per view folder in `views_dir`, in folder-name order.
///
/// Stops at the first view that fails.
pub fn parse_views(
    views_dir: &Path,
    options: &ImportOptions,
    resolver: &dyn ImageSizeResolver,
    warnings: &mut Vec<ImportWarning>,
) -> Result<Vec<Camera>, MveError> {
    let mut cameras = Vec::new();
    for view_dir in sorted_subdirs(views_dir)? {
        let folder_name = view_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let camera_name = camera_name_from_folder(&folder_name)?;
        debug!("Parsing view {} ({})", camera_name, folder_name);

        let image_path = view_dir.join(UNDISTORTED_IMAGE);
        let resolution = resolver.resolve(&image_path, options.default_resolution.as_ref())?;

        let camera = parse_meta_file(
            view_dir.join(META_FILE),
            resolution,
            &camera_name,
            options.suppress_distortion_warnings,
            warnings,
        )?;
        cameras.push(camera);
    }
    Ok(cameras)
}

/// Parses the workspace at `root`, reading image sizes with [`ImageHeaderResolver`].
///
/// # Errors
///
/// Any failure of a view or of the bundle file aborts the whole parse; no partial
/// scene is returned.
pub fn parse_workspace(root: impl AsRef<Path>, options: &ImportOptions) -> Result<MveScene, MveError> {
    parse_workspace_with(root, options, &ImageHeaderResolver)
}

/// Like [`parse_workspace`] with a custom source of image sizes.
pub fn parse_workspace_with(
    root: impl AsRef<Path>,
    options: &ImportOptions,
    resolver: &dyn ImageSizeResolver,
) -> Result<MveScene, MveError> {
    let root = root.as_ref();
    info!("Parse MVE workspace: {:?}", root);

    let mut warnings = Vec::new();
    let cameras = parse_views(&root.join(VIEWS_DIR), options, resolver, &mut warnings)?;
    let points = parse_bundle_file(root.join(BUNDLE_FILE))?;

    info!(
        "Parse MVE workspace: done ({} cameras, {} points, {} warnings)",
        cameras.len(),
        points.len(),
        warnings.len()
    );
    Ok(MveScene {
        cameras,
        points,
        warnings,
    })
}
