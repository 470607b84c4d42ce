use clap::Parser;
use std::path::PathBuf;

use antsrun::{Dimension, InputImageType, Interpolation, OutputDataType, Transform};

pub const DEFAULT_MOVING: &str = "test_output/nii_files/moving.nii";
pub const DEFAULT_REFERENCE: &str = "test_output/nii_files/fixed.nii";
pub const DEFAULT_OUTPUT: &str = "antsApplyTransforms_result.nii";

#[derive(Parser, Debug)]
#[command(
    name = "antsrun",
    version,
    about = "Run antsApplyTransforms through a typed task and verify its output"
)]
pub struct CliArgs {
    /// Moving image to resample (relative paths resolve against --workdir)
    #[arg(short = 'i', long, default_value = DEFAULT_MOVING)]
    pub moving: PathBuf,

    /// Reference image defining the output space
    #[arg(short, long, default_value = DEFAULT_REFERENCE)]
    pub reference: PathBuf,

    /// Output image; defaults to <workdir>/antsApplyTransforms_result.nii
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory relative paths are resolved against (default: current dir)
    #[arg(short = 'C', long)]
    pub workdir: Option<PathBuf>,

    /// Directory holding the ANTs binaries, prepended to PATH (repeatable)
    #[arg(long = "ants-bin", value_name = "DIR")]
    pub ants_bin: Vec<PathBuf>,

    /// JSON file with task parameters; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Transform: identity, a file, or [file,1] for its inverse (repeatable)
    #[arg(short, long = "transform", value_name = "TRANSFORM")]
    pub transforms: Vec<Transform>,

    /// Interpolation mode [default: linear]
    #[arg(short = 'n', long, value_enum)]
    pub interpolation: Option<Interpolation>,

    /// Spline order for bspline interpolation (0-5)
    #[arg(long)]
    pub bspline_order: Option<u8>,

    /// Image dimensionality [default: 3]
    #[arg(short, long, value_enum)]
    pub dimension: Option<Dimension>,

    /// Pixel type of the input image [default: scalar]
    #[arg(short = 'e', long, value_enum)]
    pub input_image_type: Option<InputImageType>,

    /// Value for voxels mapped outside the moving image [default: 0]
    #[arg(short = 'f', long, allow_negative_numbers = true)]
    pub default_value: Option<f64>,

    /// Voxel type of the output image [default: default]
    #[arg(short = 'u', long, value_enum)]
    pub output_data_type: Option<OutputDataType>,

    /// Use single precision inside the tool
    #[arg(long, default_value_t = false)]
    pub float: bool,

    /// Ask the tool for verbose output
    #[arg(long, default_value_t = false)]
    pub tool_verbose: bool,

    /// Result cache directory (default: user cache dir/antsrun)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Do not clear the result cache before running
    #[arg(long, default_value_t = false)]
    pub keep_cache: bool,

    /// Print the command line and stop
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the task result as JSON after the run
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable logging (RUST_LOG overrides the level)
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
