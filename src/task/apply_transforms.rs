//! `antsApplyTransforms` task: resample a moving image into the space of a
//! reference image through a stack of transforms.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::core::params::ApplyTransformsParams;
use crate::env::ToolEnv;
use crate::error::{Error, Result};
use crate::task::TaskResult;
use crate::types::{Dimension, InputImageType, Interpolation, OutputDataType, Transform};

pub const TOOL_NAME: &str = "antsApplyTransforms";

const MAX_BSPLINE_ORDER: u8 = 5;

#[derive(Debug, Clone)]
pub struct ApplyTransforms {
    input_image: PathBuf,
    reference_image: PathBuf,
    output_image: PathBuf,
    params: ApplyTransformsParams,
}

impl ApplyTransforms {
    /// New task with default params (3-D, scalar, Linear, identity)
    pub fn new(
        input_image: impl Into<PathBuf>,
        reference_image: impl Into<PathBuf>,
        output_image: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_image: input_image.into(),
            reference_image: reference_image.into(),
            output_image: output_image.into(),
            params: ApplyTransformsParams::default(),
        }
    }

    pub fn params(mut self, params: ApplyTransformsParams) -> Self {
        self.params = params;
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.params.dimension = dimension;
        self
    }

    pub fn input_image_type(mut self, kind: InputImageType) -> Self {
        self.params.input_image_type = kind;
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.params.interpolation = interpolation;
        self
    }

    pub fn bspline_order(mut self, order: u8) -> Self {
        self.params.bspline_order = Some(order);
        self
    }

    /// Replace the transform stack
    pub fn transforms(mut self, transforms: Vec<Transform>) -> Self {
        self.params.transforms = transforms;
        self
    }

    /// Append to the transform stack
    pub fn transform(mut self, transform: Transform) -> Self {
        self.params.transforms.push(transform);
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.params.default_value = value;
        self
    }

    pub fn output_data_type(mut self, data_type: OutputDataType) -> Self {
        self.params.output_data_type = data_type;
        self
    }

    pub fn float(mut self, enabled: bool) -> Self {
        self.params.float = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.params.verbose = enabled;
        self
    }

    pub fn input_image(&self) -> &Path {
        &self.input_image
    }

    pub fn reference_image(&self) -> &Path {
        &self.reference_image
    }

    pub fn output_image(&self) -> &Path {
        &self.output_image
    }

    pub fn get_params(&self) -> &ApplyTransformsParams {
        &self.params
    }

    /// Check the configuration before anything is spawned
    pub fn validate(&self) -> Result<()> {
        for path in [&self.input_image, &self.reference_image] {
            if !path.exists() {
                return Err(Error::MissingInput { path: path.clone() });
            }
        }
        if self.output_image.as_os_str().is_empty() {
            return Err(Error::InvalidArgument {
                arg: "output_image",
                value: String::new(),
            });
        }
        if self.params.transforms.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "transforms",
                value: "[]".to_string(),
            });
        }
        for path in self.params.transforms.iter().filter_map(Transform::path) {
            if !path.exists() {
                return Err(Error::MissingInput {
                    path: path.to_path_buf(),
                });
            }
        }
        // A time series is a stack of 3-D volumes; --dimensionality names the
        // spatial dimension of each volume, so only 3 is accepted.
        if self.params.input_image_type == InputImageType::TimeSeries
            && self.params.dimension != Dimension::Three
        {
            return Err(Error::InvalidArgument {
                arg: "input_image_type",
                value: format!(
                    "time-series requires dimension 3, got {}",
                    self.params.dimension
                ),
            });
        }
        if let Some(order) = self.params.bspline_order {
            if self.params.interpolation != Interpolation::BSpline {
                return Err(Error::InvalidArgument {
                    arg: "bspline_order",
                    value: format!(
                        "{} given with {} interpolation",
                        order, self.params.interpolation
                    ),
                });
            }
            if order > MAX_BSPLINE_ORDER {
                return Err(Error::InvalidArgument {
                    arg: "bspline_order",
                    value: order.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Arguments in the order the tool receives them, without the program
    pub fn args(&self) -> Vec<OsString> {
        let p = &self.params;
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |flag: &str, value: OsString| {
            args.push(flag.into());
            args.push(value);
        };

        push("--dimensionality", p.dimension.to_string().into());
        push(
            "--input-image-type",
            p.input_image_type.code().to_string().into(),
        );
        push("--input", self.input_image.clone().into_os_string());
        push(
            "--reference-image",
            self.reference_image.clone().into_os_string(),
        );
        push("--output", self.output_image.clone().into_os_string());
        push("--interpolation", p.interpolation_arg().into());
        if p.output_data_type != OutputDataType::Default {
            push("--output-data-type", p.output_data_type.to_string().into());
        }
        push("--default-value", p.default_value.to_string().into());
        if p.float {
            push("--float", "1".into());
        }
        if p.verbose {
            push("--verbose", "1".into());
        }
        for t in &p.transforms {
            push("--transform", t.to_arg().into());
        }
        args
    }

    /// The full command line as a printable string
    pub fn cmdline(&self) -> String {
        std::iter::once(TOOL_NAME.to_string())
            .chain(self.args().iter().map(|a| quote_arg(&a.to_string_lossy())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Command for the given binary with this task's arguments
    pub fn build_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(self.args());
        cmd
    }

    /// Run the tool to completion.
    ///
    /// Configuration and launch failures are errors; a non-zero exit status
    /// is reported in the returned `TaskResult`.
    pub fn run(&self, env: &ToolEnv) -> Result<TaskResult> {
        self.validate()?;
        let program = env.resolve(TOOL_NAME)?;
        let output_image = std::path::absolute(&self.output_image)?;

        let mut cmd = self.build_command(&program);
        cmd.env("PATH", env.search_path()?);

        let cmdline = self.cmdline();
        info!("Executing: {}", cmdline);
        let started_at = Utc::now();
        let output = cmd.output().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;
        let finished_at = Utc::now();

        let result = TaskResult {
            cmdline,
            return_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            output_image,
            started_at,
            finished_at,
            cached: false,
        };
        if result.exited_cleanly() {
            debug!(
                "{} finished in {} ms",
                TOOL_NAME,
                result.elapsed().num_milliseconds()
            );
        } else {
            warn!("{} exited with {:?}", TOOL_NAME, result.return_code);
        }
        Ok(result)
    }

    /// Like [`run`](Self::run), but reuse a cached result for identical
    /// inputs whose output is still on disk. Only clean runs that produced
    /// their output are stored.
    pub fn run_cached(&self, env: &ToolEnv, cache: &ResultCache) -> Result<TaskResult> {
        self.validate()?;
        let mut inputs: Vec<&Path> = vec![self.input_image.as_path(), self.reference_image.as_path()];
        inputs.extend(self.params.transforms.iter().filter_map(Transform::path));
        let key = cache.key(&self.cmdline(), &inputs)?;

        if let Some(mut hit) = cache.get(&key)? {
            info!("Cache hit {} -> {:?}", key, hit.output_image);
            hit.cached = true;
            return Ok(hit);
        }

        let result = self.run(env)?;
        if result.exited_cleanly() && result.output_exists() {
            if let Err(e) = cache.put(&key, &result) {
                warn!("Could not store cache record: {}", e);
            }
        }
        Ok(result)
    }
}

/// Single-quote an argument for display if it contains shell-special text
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./,:=+@%[]".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args_of(task: &ApplyTransforms) -> Vec<String> {
        task.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        let pos = args.iter().position(|a| a == flag)?;
        args.get(pos + 1).cloned()
    }

    #[test]
    fn default_cmdline_matches_identity_linear_3d() {
        let task = ApplyTransforms::new("moving.nii", "fixed.nii", "/tmp/out.nii");
        assert_eq!(
            task.cmdline(),
            "antsApplyTransforms --dimensionality 3 --input-image-type 0 --input moving.nii \
             --reference-image fixed.nii --output /tmp/out.nii --interpolation Linear \
             --default-value 0 --transform identity"
        );
    }

    #[test]
    fn optional_flags_are_emitted_when_set() {
        let task = ApplyTransforms::new("m.nii", "f.nii", "o.nii")
            .interpolation(Interpolation::BSpline)
            .bspline_order(3)
            .output_data_type(OutputDataType::Short)
            .default_value(-1.5)
            .float(true)
            .verbose(true);
        let args = args_of(&task);
        assert_eq!(value_after(&args, "--interpolation").unwrap(), "BSpline[3]");
        assert_eq!(value_after(&args, "--output-data-type").unwrap(), "short");
        assert_eq!(value_after(&args, "--default-value").unwrap(), "-1.5");
        assert_eq!(value_after(&args, "--float").unwrap(), "1");
        assert_eq!(value_after(&args, "--verbose").unwrap(), "1");
    }

    #[test]
    fn transforms_keep_their_order() {
        let task = ApplyTransforms::new("m.nii", "f.nii", "o.nii").transforms(vec![
            Transform::file("warp.nii.gz"),
            Transform::inverse("affine.mat"),
        ]);
        let args = args_of(&task);
        let transforms: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "--transform")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(transforms, vec!["warp.nii.gz", "[affine.mat,1]"]);
    }

    #[test]
    fn cmdline_quotes_paths_with_spaces() {
        let task = ApplyTransforms::new("my scans/moving.nii", "f.nii", "it's.nii");
        let line = task.cmdline();
        assert!(line.contains("--input 'my scans/moving.nii'"));
        assert!(line.contains(r"--output 'it'\''s.nii'"));
    }

    #[test]
    fn validate_reports_missing_inputs_as_configuration() {
        let dir = tempdir().unwrap();
        let moving = dir.path().join("moving.nii");
        std::fs::write(&moving, b"x").unwrap();
        let task = ApplyTransforms::new(&moving, dir.path().join("fixed.nii"), "o.nii");
        let err = task.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, Error::MissingInput { path } if path.ends_with("fixed.nii")));
    }

    #[test]
    fn validate_rejects_bad_combinations() {
        let dir = tempdir().unwrap();
        let m = dir.path().join("m.nii");
        let f = dir.path().join("f.nii");
        std::fs::write(&m, b"x").unwrap();
        std::fs::write(&f, b"x").unwrap();

        let base = ApplyTransforms::new(&m, &f, dir.path().join("o.nii"));
        assert!(base.validate().is_ok());

        let no_transforms = base.clone().transforms(Vec::new());
        assert!(matches!(
            no_transforms.validate(),
            Err(Error::InvalidArgument { arg: "transforms", .. })
        ));

        let order = base
            .clone()
            .interpolation(Interpolation::BSpline)
            .bspline_order(9);
        assert!(order.validate().is_err());
        assert!(order.bspline_order(3).validate().is_ok());

        let stray_order = base.clone().bspline_order(3);
        assert!(matches!(
            stray_order.validate(),
            Err(Error::InvalidArgument { arg: "bspline_order", .. })
        ));

        let missing_affine = base.transform(Transform::file(dir.path().join("a.mat")));
        assert!(matches!(
            missing_affine.validate(),
            Err(Error::MissingInput { .. })
        ));
    }

    #[test]
    fn time_series_takes_spatial_dimension_three() {
        let dir = tempdir().unwrap();
        let bold = dir.path().join("bold.nii");
        let reference = dir.path().join("ref.nii");
        std::fs::write(&bold, b"x").unwrap();
        std::fs::write(&reference, b"x").unwrap();

        let task = ApplyTransforms::new(&bold, &reference, dir.path().join("o.nii"))
            .input_image_type(InputImageType::TimeSeries)
            .dimension(Dimension::Three);
        assert!(task.validate().is_ok());
        let args = args_of(&task);
        assert_eq!(value_after(&args, "--dimensionality").unwrap(), "3");
        assert_eq!(value_after(&args, "--input-image-type").unwrap(), "3");

        assert!(task.clone().dimension(Dimension::Four).validate().is_err());
        assert!(task.dimension(Dimension::Two).validate().is_err());
    }

    #[test]
    fn multi_channel_input_type_is_code_four() {
        let task = ApplyTransforms::new("m.nii", "f.nii", "o.nii")
            .input_image_type(InputImageType::MultiChannel);
        assert_eq!(
            value_after(&args_of(&task), "--input-image-type").unwrap(),
            "4"
        );
    }

    #[test]
    fn run_without_tool_is_execution_error() {
        let dir = tempdir().unwrap();
        let m = dir.path().join("m.nii");
        let f = dir.path().join("f.nii");
        std::fs::write(&m, b"x").unwrap();
        std::fs::write(&f, b"x").unwrap();

        let task = ApplyTransforms::new(&m, &f, dir.path().join("o.nii"));
        let env = ToolEnv::isolated().prepend(dir.path());
        let err = task.run(&env).unwrap_err();
        assert!(!err.is_configuration());
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Shell stand-in that copies `--input` to `--output` and counts calls
        fn install_fake_tool(dir: &Path, exit_code: i32) -> PathBuf {
            let bin_dir = dir.join("bin");
            std::fs::create_dir_all(&bin_dir).unwrap();
            let script = format!(
                "#!/bin/sh\n\
                 echo called >> \"{calls}\"\n\
                 while [ $# -gt 0 ]; do\n\
                   case \"$1\" in\n\
                     --input) in=\"$2\"; shift 2;;\n\
                     --output) out=\"$2\"; shift 2;;\n\
                     *) shift;;\n\
                   esac\n\
                 done\n\
                 echo \"resampling $in\"\n\
                 if [ {code} -eq 0 ]; then cp \"$in\" \"$out\"; else echo boom >&2; fi\n\
                 exit {code}\n",
                calls = dir.join("calls.log").display(),
                code = exit_code,
            );
            let bin = bin_dir.join(TOOL_NAME);
            std::fs::write(&bin, script).unwrap();
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
            bin_dir
        }

        fn call_count(dir: &Path) -> usize {
            std::fs::read_to_string(dir.join("calls.log"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        fn inputs(dir: &Path) -> (PathBuf, PathBuf) {
            let m = dir.join("moving.nii");
            let f = dir.join("fixed.nii");
            std::fs::write(&m, b"moving").unwrap();
            std::fs::write(&f, b"fixed").unwrap();
            (m, f)
        }

        #[test]
        fn successful_run_creates_output() {
            let dir = tempdir().unwrap();
            let bin_dir = install_fake_tool(dir.path(), 0);
            let (m, f) = inputs(dir.path());
            let out = dir.path().join("result.nii");

            let task = ApplyTransforms::new(&m, &f, &out);
            let result = task.run(&ToolEnv::inherit().prepend(bin_dir)).unwrap();

            assert_eq!(result.return_code, Some(0));
            assert!(result.output_exists());
            assert_eq!(result.output_image, out);
            assert!(result.stdout.contains("resampling"));
            assert!(!result.cached);
            assert_eq!(std::fs::read(&out).unwrap(), b"moving");
        }

        #[test]
        fn failing_tool_is_a_result_not_an_error() {
            let dir = tempdir().unwrap();
            let bin_dir = install_fake_tool(dir.path(), 3);
            let (m, f) = inputs(dir.path());

            let task = ApplyTransforms::new(&m, &f, dir.path().join("result.nii"));
            let result = task.run(&ToolEnv::inherit().prepend(bin_dir)).unwrap();

            assert_eq!(result.return_code, Some(3));
            assert!(result.stderr.contains("boom"));
            assert!(!result.output_exists());
        }

        #[test]
        fn cached_run_skips_the_tool() {
            let dir = tempdir().unwrap();
            let bin_dir = install_fake_tool(dir.path(), 0);
            let (m, f) = inputs(dir.path());
            let env = ToolEnv::inherit().prepend(bin_dir);
            let cache = ResultCache::new(dir.path().join("cache"));

            let task = ApplyTransforms::new(&m, &f, dir.path().join("result.nii"));
            let first = task.run_cached(&env, &cache).unwrap();
            assert!(!first.cached);
            let second = task.run_cached(&env, &cache).unwrap();
            assert!(second.cached);
            assert_eq!(call_count(dir.path()), 1);

            cache.clear().unwrap();
            let third = task.run_cached(&env, &cache).unwrap();
            assert!(!third.cached);
            assert_eq!(call_count(dir.path()), 2);
        }

        #[test]
        fn failed_runs_are_not_cached() {
            let dir = tempdir().unwrap();
            let bin_dir = install_fake_tool(dir.path(), 1);
            let (m, f) = inputs(dir.path());
            let env = ToolEnv::inherit().prepend(bin_dir);
            let cache = ResultCache::new(dir.path().join("cache"));

            let task = ApplyTransforms::new(&m, &f, dir.path().join("result.nii"));
            task.run_cached(&env, &cache).unwrap();
            task.run_cached(&env, &cache).unwrap();
            assert_eq!(call_count(dir.path()), 2);
        }

        #[test]
        fn truncated_record_reruns_the_tool() {
            let dir = tempdir().unwrap();
            let bin_dir = install_fake_tool(dir.path(), 0);
            let (m, f) = inputs(dir.path());
            let env = ToolEnv::inherit().prepend(bin_dir);
            let cache = ResultCache::new(dir.path().join("cache"));

            let task = ApplyTransforms::new(&m, &f, dir.path().join("result.nii"));
            task.run_cached(&env, &cache).unwrap();
            for entry in std::fs::read_dir(cache.root()).unwrap() {
                std::fs::write(entry.unwrap().path(), r#"{"cmdline": "trunc"#).unwrap();
            }

            let again = task.run_cached(&env, &cache).unwrap();
            assert!(!again.cached);
            assert!(again.output_exists());
            assert_eq!(call_count(dir.path()), 2);

            let third = task.run_cached(&env, &cache).unwrap();
            assert!(third.cached);
            assert_eq!(call_count(dir.path()), 2);
        }
    }
}
