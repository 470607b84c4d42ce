use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Dimension, InputImageType, Interpolation, OutputDataType, Transform};

/// Task parameters suitable for config files and presets.
///
/// Paths of the images themselves are not part of the params; they are
/// given per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyTransformsParams {
    pub dimension: Dimension,
    pub input_image_type: InputImageType,
    pub interpolation: Interpolation,
    /// Spline order, only used with `BSpline`
    pub bspline_order: Option<u8>,
    pub transforms: Vec<Transform>,
    /// Value for voxels that map outside the moving image
    pub default_value: f64,
    pub output_data_type: OutputDataType,
    /// Use single precision internally (`--float 1`)
    pub float: bool,
    pub verbose: bool,
}

impl Default for ApplyTransformsParams {
    fn default() -> Self {
        Self {
            dimension: Dimension::Three,
            input_image_type: InputImageType::Scalar,
            interpolation: Interpolation::Linear,
            bspline_order: None,
            transforms: vec![Transform::Identity],
            default_value: 0.0,
            output_data_type: OutputDataType::Default,
            float: false,
            verbose: false,
        }
    }
}

impl ApplyTransformsParams {
    /// Load params from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Value passed to `--interpolation`
    pub fn interpolation_arg(&self) -> String {
        match (self.interpolation, self.bspline_order) {
            (Interpolation::BSpline, Some(order)) => format!("BSpline[{}]", order),
            (interp, _) => interp.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_smoke_test_setup() {
        let p = ApplyTransformsParams::default();
        assert_eq!(p.dimension, Dimension::Three);
        assert_eq!(p.interpolation, Interpolation::Linear);
        assert_eq!(p.transforms, vec![Transform::Identity]);
        assert_eq!(p.interpolation_arg(), "Linear");
    }

    #[test]
    fn bspline_order_is_rendered() {
        let p = ApplyTransformsParams {
            interpolation: Interpolation::BSpline,
            bspline_order: Some(3),
            ..Default::default()
        };
        assert_eq!(p.interpolation_arg(), "BSpline[3]");
    }

    #[test]
    fn partial_json_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{ "interpolation": "NearestNeighbor", "transforms": [{"file": {"path": "a.mat", "invert": true}}] }"#,
        )
        .unwrap();

        let p = ApplyTransformsParams::from_json_file(&path).unwrap();
        assert_eq!(p.interpolation, Interpolation::NearestNeighbor);
        assert_eq!(p.transforms, vec![Transform::inverse("a.mat")]);
        assert_eq!(p.dimension, Dimension::Three);
    }

    #[test]
    fn malformed_config_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "dimension": 7 }"#).unwrap();

        match ApplyTransformsParams::from_json_file(&path) {
            Err(Error::Config { .. }) => {}
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
