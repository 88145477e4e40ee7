//! Import settings for a workspace parse.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use yaml_rust::YamlLoader;

use super::MveError;
use crate::camera::Resolution;

/// Settings controlling [`crate::mve::parse_workspace`].
///
/// A YAML file holding these options looks like:
///
/// ```yaml
/// default_width: 1920
/// default_height: 1080
/// suppress_distortion_warnings: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Image size used when a view's image cannot be read. `None` makes that fatal.
    pub default_resolution: Option<Resolution>,
    /// Do not report radial distortion found in view calibrations.
    pub suppress_distortion_warnings: bool,
}

impl ImportOptions {
    /// Loads options from a YAML file. Missing keys keep their default value.
    ///
    /// # Errors
    ///
    /// * [`MveError::Io`]: If the file cannot be read.
    /// * [`MveError::Yaml`]: If the YAML is malformed, a value has the wrong type, or
    ///   only one of `default_width`/`default_height` is given, or either is zero.
    pub fn load_from_yaml(path: &str) -> Result<Self, MveError> {
        let contents = fs::read_to_string(path).map_err(|e| MveError::Io {
            path: path.into(),
            source: e,
        })?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = match docs.first() {
            Some(doc) => doc,
            None => return Ok(ImportOptions::default()),
        };

        let dimension = |key: &str| -> Result<Option<u32>, MveError> {
            let value = &doc[key];
            if value.is_badvalue() || value.is_null() {
                return Ok(None);
            }
            value
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .map(Some)
                .ok_or_else(|| MveError::Yaml(format!("Invalid {key}: not a positive integer")))
        };

        let default_resolution = match (dimension("default_width")?, dimension("default_height")?)
        {
            (Some(width), Some(height)) => Some(Resolution { width, height }),
            (None, None) => None,
            _ => {
                return Err(MveError::Yaml(
                    "default_width and default_height must be given together".to_string(),
                ))
            }
        };

        let suppress = &doc["suppress_distortion_warnings"];
        let suppress_distortion_warnings = if suppress.is_badvalue() || suppress.is_null() {
            false
        } else {
            suppress.as_bool().ok_or_else(|| {
                MveError::Yaml("Invalid suppress_distortion_warnings: not a bool".to_string())
            })?
        };

        Ok(ImportOptions {
            default_resolution,
            suppress_distortion_warnings,
        })
    }

    /// Saves the options in the layout read by [`ImportOptions::load_from_yaml`].
    pub fn save_to_yaml(&self, path: &str) -> Result<(), MveError> {
        let mut mapping = serde_yaml::Mapping::new();
        if let Some(resolution) = &self.default_resolution {
            mapping.insert(
                serde_yaml::Value::String("default_width".to_string()),
                serde_yaml::to_value(resolution.width)?,
            );
            mapping.insert(
                serde_yaml::Value::String("default_height".to_string()),
                serde_yaml::to_value(resolution.height)?,
            );
        }
        mapping.insert(
            serde_yaml::Value::String("suppress_distortion_warnings".to_string()),
            serde_yaml::Value::Bool(self.suppress_distortion_warnings),
        );

        let yaml_string = serde_yaml::to_string(&mapping)?;

        let mut file = fs::File::create(path).map_err(|e| MveError::Io {
            path: path.into(),
            source: e,
        })?;
        file.write_all(yaml_string.as_bytes())
            .map_err(|e| MveError::Io {
                path: path.into(),
                source: e,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_from_yaml() {
        let options = ImportOptions::load_from_yaml("samples/import_options.yaml").unwrap();
        assert_eq!(
            options.default_resolution,
            Some(Resolution {
                width: 1920,
                height: 1080
            })
        );
        assert!(options.suppress_distortion_warnings);
    }

    #[test]
    fn test_options_save_and_reload() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let path = "output/import_options_saved.yaml";

        let options = ImportOptions {
            default_resolution: Some(Resolution {
                width: 640,
                height: 480,
            }),
            suppress_distortion_warnings: false,
        };
        options.save_to_yaml(path).unwrap();
        assert_eq!(ImportOptions::load_from_yaml(path).unwrap(), options);

        let defaults = ImportOptions::default();
        defaults.save_to_yaml(path).unwrap();
        assert_eq!(ImportOptions::load_from_yaml(path).unwrap(), defaults);
    }

    #[test]
    fn test_partial_default_resolution_is_rejected() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let path = "output/import_options_partial.yaml";
        fs::write(path, "default_width: 640\n").unwrap();

        let err = ImportOptions::load_from_yaml(path).unwrap_err();
        assert!(matches!(err, MveError::Yaml(_)));
    }

    #[test]
    fn test_zero_default_resolution_is_rejected() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let path = "output/import_options_zero.yaml";
        fs::write(path, "default_width: 0\ndefault_height: 480\n").unwrap();

        let err = ImportOptions::load_from_yaml(path).unwrap_err();
        assert!(matches!(err, MveError::Yaml(ref msg) if msg.contains("default_width")));
    }

    #[test]
    fn test_missing_options_file() {
        let err = ImportOptions::load_from_yaml("samples/no_such_options.yaml").unwrap_err();
        assert!(matches!(err, MveError::Io { .. }));
    }
}
