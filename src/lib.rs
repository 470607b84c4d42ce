#![doc = r#"
antsrun — a typed task wrapper for the ANTs `antsApplyTransforms` tool.

This crate configures an `antsApplyTransforms` invocation through typed setters,
renders the command line, runs the tool to completion and reports the result.
It powers the `antsrun` smoke-test CLI and can be embedded in your own Rust
applications.

Requirements
------------
- An ANTs installation; its `bin` directory on `PATH`, in `$ANTSPATH`, or
  added through [`ToolEnv::prepend`].
- Rust 2024 edition toolchain.

Quick start: resample with an identity transform
------------------------------------------------
```rust,no_run
use antsrun::{ApplyTransforms, Dimension, Interpolation, ToolEnv, Transform};

fn main() -> antsrun::Result<()> {
    let task = ApplyTransforms::new(
        "test_output/nii_files/moving.nii",
        "test_output/nii_files/fixed.nii",
        "/out/antsApplyTransforms_result.nii",
    )
    .transforms(vec![Transform::Identity])
    .interpolation(Interpolation::Linear)
    .dimension(Dimension::Three);

    println!("{}", task.cmdline());

    let env = ToolEnv::inherit().prepend("/opt/ants/bin");
    let result = task.run(&env)?;
    println!("return code: {:?}", result.return_code);
    assert!(result.output_exists());
    Ok(())
}
```

Cached runs
-----------
```rust,no_run
use std::path::Path;
use antsrun::{apply_transforms_cached, default_cache_dir, ApplyTransformsParams, ResultCache, ToolEnv};

fn main() -> antsrun::Result<()> {
    let cache = ResultCache::new(default_cache_dir()?);
    let result = apply_transforms_cached(
        Path::new("moving.nii"),
        Path::new("fixed.nii"),
        Path::new("/out/result.nii"),
        &ApplyTransformsParams::default(),
        &ToolEnv::inherit(),
        &cache,
    )?;
    println!("cached={}", result.cached);
    Ok(())
}
```

Error handling
--------------
All public functions return `antsrun::Result<T>`. Configuration errors
(`InvalidArgument`, `MissingInput`, `Config`) are raised before any process is
started; execution errors (`ToolNotFound`, `Spawn`) mean the tool could not be
launched. A tool that runs and exits non-zero is not an error: inspect
[`TaskResult::return_code`] and [`TaskResult::output_exists`].

```rust,no_run
use antsrun::{ApplyTransforms, Error, ToolEnv};

fn main() {
    let task = ApplyTransforms::new("moving.nii", "fixed.nii", "/out.nii");
    match task.run(&ToolEnv::inherit()) {
        Ok(result) => println!("exit {:?}", result.return_code),
        Err(e) if e.is_configuration() => eprintln!("bad task: {e}"),
        Err(Error::ToolNotFound { searched, .. }) => eprintln!("install ANTs (searched {searched})"),
        Err(other) => eprintln!("{other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level entry points.
- [`task`] — the `ApplyTransforms` task and its `TaskResult`.
- [`types`] — option enums (`Interpolation`, `Dimension`, `Transform`, ...).
- [`env`] — tool search path for child processes.
- [`cache`] — result cache.
- [`io`] — NIfTI header inspection.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod cache;
pub mod core;
pub mod env;
pub mod error;
pub mod io;
pub mod task;
pub mod types;

// Curated public API surface
pub use cache::{CacheError, ResultCache, clear_cache, default_cache_dir};
pub use core::params::ApplyTransformsParams;
pub use env::ToolEnv;
pub use error::{Error, Result};
pub use io::nifti::{NiftiError, NiftiHeader, VolumeInfo};
pub use task::{ApplyTransforms, TOOL_NAME, TaskResult};
pub use types::{Dimension, InputImageType, Interpolation, OutputDataType, Transform};

pub use api::{
    VolumeSummary, apply_transforms_cached, apply_transforms_to_path, check_inputs,
    describe_volume,
};
