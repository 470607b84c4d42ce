//! Shared types and enums used across antsrun.
//! Includes `Dimension`, `InputImageType`, `Interpolation`, `OutputDataType`
//! and the `Transform` specifier passed to `--transform`.
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Image dimensionality (`--dimensionality`)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimension {
    Two,
    Three,
    Four,
}

impl Dimension {
    pub fn as_u8(self) -> u8 {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
            Dimension::Four => 4,
        }
    }
}

impl TryFrom<u8> for Dimension {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimension::Two),
            3 => Ok(Dimension::Three),
            4 => Ok(Dimension::Four),
            other => Err(format!("dimension must be 2, 3 or 4, got {}", other)),
        }
    }
}

impl From<Dimension> for u8 {
    fn from(d: Dimension) -> Self {
        d.as_u8()
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// Manual implementation so the CLI accepts the plain numbers
impl clap::ValueEnum for Dimension {
    fn value_variants<'a>() -> &'a [Self] {
        &[Dimension::Two, Dimension::Three, Dimension::Four]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Dimension::Two => clap::builder::PossibleValue::new("2"),
            Dimension::Three => clap::builder::PossibleValue::new("3"),
            Dimension::Four => clap::builder::PossibleValue::new("4"),
        })
    }
}

/// Pixel type of the input image (`--input-image-type`)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputImageType {
    Scalar,
    Vector,
    Tensor,
    TimeSeries,
    MultiChannel,
}

impl InputImageType {
    pub fn code(self) -> u8 {
        match self {
            InputImageType::Scalar => 0,
            InputImageType::Vector => 1,
            InputImageType::Tensor => 2,
            InputImageType::TimeSeries => 3,
            InputImageType::MultiChannel => 4,
        }
    }
}

/// Resampling strategy (`--interpolation`).
///
/// The CLI takes kebab-case names and, as aliases, the tool's own spelling
/// (`Linear`, `NearestNeighbor`), which is also what config files use.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Interpolation {
    #[value(alias = "Linear")]
    Linear,
    #[value(alias = "NearestNeighbor")]
    NearestNeighbor,
    #[value(alias = "MultiLabel")]
    MultiLabel,
    #[value(alias = "Gaussian")]
    Gaussian,
    #[value(name = "bspline", alias = "BSpline")]
    BSpline,
    #[value(alias = "CosineWindowedSinc")]
    CosineWindowedSinc,
    #[value(alias = "WelchWindowedSinc")]
    WelchWindowedSinc,
    #[value(alias = "HammingWindowedSinc")]
    HammingWindowedSinc,
    #[value(alias = "LanczosWindowedSinc")]
    LanczosWindowedSinc,
    #[value(alias = "GenericLabel")]
    GenericLabel,
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Interpolation::Linear => "Linear",
            Interpolation::NearestNeighbor => "NearestNeighbor",
            Interpolation::MultiLabel => "MultiLabel",
            Interpolation::Gaussian => "Gaussian",
            Interpolation::BSpline => "BSpline",
            Interpolation::CosineWindowedSinc => "CosineWindowedSinc",
            Interpolation::WelchWindowedSinc => "WelchWindowedSinc",
            Interpolation::HammingWindowedSinc => "HammingWindowedSinc",
            Interpolation::LanczosWindowedSinc => "LanczosWindowedSinc",
            Interpolation::GenericLabel => "GenericLabel",
        };
        write!(f, "{}", s)
    }
}

/// Voxel type of the written output (`--output-data-type`)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDataType {
    Char,
    Uchar,
    Short,
    Int,
    Float,
    Double,
    Default,
}

impl std::fmt::Display for OutputDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputDataType::Char => "char",
            OutputDataType::Uchar => "uchar",
            OutputDataType::Short => "short",
            OutputDataType::Int => "int",
            OutputDataType::Float => "float",
            OutputDataType::Double => "double",
            OutputDataType::Default => "default",
        };
        write!(f, "{}", s)
    }
}

/// A single `--transform` argument.
///
/// Transforms are applied in reverse order of appearance, the way the tool
/// composes its stack; callers list them the same way they would on the
/// command line.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Identity,
    File { path: PathBuf, invert: bool },
}

impl Transform {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Transform::File {
            path: path.into(),
            invert: false,
        }
    }

    pub fn inverse(path: impl Into<PathBuf>) -> Self {
        Transform::File {
            path: path.into(),
            invert: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Transform::Identity => None,
            Transform::File { path, .. } => Some(path.as_path()),
        }
    }

    /// Argument value as passed to the tool
    pub fn to_arg(&self) -> String {
        match self {
            Transform::Identity => "identity".to_string(),
            Transform::File {
                path,
                invert: false,
            } => path.display().to_string(),
            Transform::File { path, invert: true } => format!("[{},1]", path.display()),
        }
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_arg())
    }
}

impl std::str::FromStr for Transform {
    type Err = String;

    /// Accepts `identity`, `path` or `[path,1]` / `[path,0]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("transform must not be empty".to_string());
        }
        if s.eq_ignore_ascii_case("identity") {
            return Ok(Transform::Identity);
        }
        if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let (path, flag) = inner
                .rsplit_once(',')
                .ok_or_else(|| format!("expected [path,0|1], got {}", s))?;
            let invert = match flag.trim() {
                "1" => true,
                "0" => false,
                other => return Err(format!("invalid inverse flag: {}", other)),
            };
            let path = path.trim();
            if path.is_empty() {
                return Err(format!("missing transform path in {}", s));
            }
            return Ok(Transform::File {
                path: PathBuf::from(path),
                invert,
            });
        }
        Ok(Transform::file(s))
    }
}
