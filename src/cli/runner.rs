use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use antsrun::{
    ApplyTransforms, ApplyTransformsParams, Error, ResultCache, TOOL_NAME, ToolEnv, Transform,
    check_inputs, default_cache_dir, describe_volume,
};

use super::args::{CliArgs, DEFAULT_OUTPUT};
use super::errors::AppError;

fn init_logging(enabled: bool) {
    if !enabled {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    // Logs go to stderr so the stdout report stays readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn tool_env(args: &CliArgs) -> ToolEnv {
    args.ants_bin
        .iter()
        .fold(ToolEnv::inherit().with_antspath(), |env, dir| {
            env.prepend(dir)
        })
}

/// Params from the config file (or defaults), with explicit flags on top
fn build_params(args: &CliArgs) -> Result<ApplyTransformsParams, AppError> {
    let mut params = match &args.config {
        Some(path) => {
            info!("Loading task params from {:?}", path);
            ApplyTransformsParams::from_json_file(path)?
        }
        None => ApplyTransformsParams::default(),
    };

    if !args.transforms.is_empty() {
        params.transforms = args.transforms.clone();
    }
    if let Some(interp) = args.interpolation {
        params.interpolation = interp;
    }
    if let Some(order) = args.bspline_order {
        params.bspline_order = Some(order);
    }
    if let Some(dim) = args.dimension {
        params.dimension = dim;
    }
    if let Some(kind) = args.input_image_type {
        params.input_image_type = kind;
    }
    if let Some(value) = args.default_value {
        params.default_value = value;
    }
    if let Some(t) = args.output_data_type {
        params.output_data_type = t;
    }
    params.float |= args.float;
    params.verbose |= args.tool_verbose;
    Ok(params)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The smoke test proper. `Ok(false)` is a reported failure (missing input,
/// tool failure, no output); `Err` is an error that aborted the run.
fn smoke_test(args: &CliArgs) -> Result<bool, AppError> {
    let env = tool_env(args);
    debug!("Tool search dirs: {:?}", env.extra_dirs());

    let cache = ResultCache::new(match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => default_cache_dir()?,
    });
    if args.keep_cache {
        info!("Keeping cache at {:?}", cache.root());
    } else if cache.clear()? {
        println!("Cleared cache: {}", cache.root().display());
    }

    let workdir = match &args.workdir {
        Some(dir) => std::path::absolute(dir)?,
        None => std::env::current_dir()?,
    };
    let moving = workdir.join(&args.moving);
    let reference = workdir.join(&args.reference);

    match check_inputs(&[moving.as_path(), reference.as_path()]) {
        Ok(()) => {}
        Err(Error::MissingInput { path }) => {
            println!("Missing: {}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    }

    println!("Input data:");
    println!("   Moving: {}", describe_volume(&moving)?);
    println!("   Reference: {}", describe_volume(&reference)?);

    let mut params = build_params(args)?;
    for t in params.transforms.iter_mut() {
        if let Transform::File { path, .. } = t {
            *path = workdir.join(&*path);
        }
    }
    let output: PathBuf = std::path::absolute(
        workdir.join(args.output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT))),
    )?;

    let task = ApplyTransforms::new(&moving, &reference, &output).params(params);
    let p = task.get_params();
    let transforms: Vec<String> = p.transforms.iter().map(|t| t.to_string()).collect();
    println!("   Transform: {}", transforms.join(", "));
    println!("   Interpolation: {}", p.interpolation_arg());
    println!("   Dimension: {}", p.dimension);
    println!("   Output: {}", file_name(&output));

    println!("\nGenerated ANTs command:");
    println!("   {}", task.cmdline());

    if args.dry_run {
        task.validate()?;
        println!("\nDry run, not executing");
        return Ok(true);
    }

    println!("\nExecuting {}...", TOOL_NAME);
    let result = task.run_cached(&env, &cache)?;

    match result.return_code {
        Some(code) => println!("   Return code: {}", code),
        None => println!("   Return code: none (terminated by signal)"),
    }
    if result.cached {
        println!("   (cached result from {})", result.finished_at.to_rfc3339());
    }
    if !result.stderr.is_empty() {
        println!("   stderr: {}", result.stderr.trim_end());
    }
    if !result.stdout.is_empty() {
        println!("   stdout: {}", result.stdout.trim_end());
    }
    println!("   Output path: {}", result.output_image.display());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if result.output_exists() {
        println!("\nSUCCESS");
        println!("   Output file: {}", file_name(&result.output_image));
        if let Some(size) = result.output_size_mb() {
            println!("   Output size: {:.1} MB", size);
        }
        println!(
            "   Elapsed: {:.2} s",
            result.elapsed().num_milliseconds() as f64 / 1000.0
        );
        Ok(true)
    } else {
        println!("\nOutput file not created");
        Ok(false)
    }
}

/// Run the smoke test and print the verdict. Returns the success flag the
/// process exit code is derived from.
pub fn run(args: CliArgs) -> bool {
    init_logging(args.log);

    println!("{} smoke test", TOOL_NAME);
    println!("{}", "=".repeat(50));

    let success = match smoke_test(&args) {
        Ok(ok) => ok,
        Err(e) => {
            println!("\nError ({}): {}", e.kind(), e);
            false
        }
    };

    if success {
        println!("{} working", TOOL_NAME);
    } else {
        println!("\nTest failed");
    }
    success
}
