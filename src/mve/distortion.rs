//! Detection of radial distortion that the importer does not correct for.

use log::warn;

use super::ImportWarning;

/// Coefficients with a magnitude at or below this value count as zero.
pub const DISTORTION_EPSILON: f64 = 1e-12;

/// Reports non-negligible radial distortion.
///
/// Returns the warning (after logging it) when any coefficient exceeds
/// [`DISTORTION_EPSILON`] and warnings are not suppressed.
pub fn check_radial_distortion(
    coefficients: &[f64],
    context: &str,
    suppress: bool,
) -> Option<ImportWarning> {
    if suppress || coefficients.iter().all(|k| k.abs() <= DISTORTION_EPSILON) {
        return None;
    }
    let warning = ImportWarning::RadialDistortion {
        context: context.to_string(),
        coefficients: coefficients.to_vec(),
    };
    warn!("{}", warning);
    Some(warning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distortion_is_silent() {
        assert!(check_radial_distortion(&[0.0, 0.0], "view_0000", false).is_none());
        assert!(check_radial_distortion(&[], "view_0000", false).is_none());
        assert!(check_radial_distortion(&[1e-15, -1e-13], "view_0000", false).is_none());
    }

    #[test]
    fn test_non_zero_distortion_warns_unless_suppressed() {
        let warning = check_radial_distortion(&[-0.12, 0.0], "view_0003", false).unwrap();
        assert_eq!(
            warning,
            ImportWarning::RadialDistortion {
                context: "view_0003".to_string(),
                coefficients: vec![-0.12, 0.0],
            }
        );
        assert!(warning.to_string().contains("view_0003"));

        assert!(check_radial_distortion(&[-0.12, 0.0], "view_0003", true).is_none());
    }
}
