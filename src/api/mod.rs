//! High-level library API: input checks, volume descriptions, and one-call
//! helpers that configure and run an `antsApplyTransforms` task. Prefer these
//! entrypoints over assembling tasks by hand when integrating antsrun.
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::cache::ResultCache;
use crate::core::params::ApplyTransformsParams;
use crate::env::ToolEnv;
use crate::error::{Error, Result};
use crate::io::nifti::{self, VolumeInfo};
use crate::task::{ApplyTransforms, TaskResult};

/// Verify that every path exists. The first missing one is returned as
/// [`Error::MissingInput`].
pub fn check_inputs(paths: &[&Path]) -> Result<()> {
    for path in paths {
        if !path.exists() {
            return Err(Error::MissingInput {
                path: path.to_path_buf(),
            });
        }
        debug!("Found input: {:?}", path);
    }
    Ok(())
}

/// Size and header summary of a volume on disk
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSummary {
    pub path: PathBuf,
    pub size_mb: f64,
    /// `None` when the header could not be read
    pub info: Option<VolumeInfo>,
}

impl std::fmt::Display for VolumeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.1} MB", self.path.display(), self.size_mb)?;
        match &self.info {
            Some(VolumeInfo::Nifti(h)) => {
                let dims: Vec<String> = h.dims.iter().map(|d| d.to_string()).collect();
                let spacing: Vec<String> = h.pixdim.iter().map(|p| format!("{:.2}", p)).collect();
                write!(
                    f,
                    ", {} {}, spacing {}",
                    dims.join("x"),
                    h.datatype_name(),
                    spacing.join("x")
                )?;
            }
            Some(VolumeInfo::Compressed) => write!(f, ", gzip")?,
            None => {}
        }
        write!(f, ")")
    }
}

/// Describe a volume. Header problems are not errors here, the summary just
/// carries no header info.
pub fn describe_volume(path: &Path) -> Result<VolumeSummary> {
    let size_mb = nifti::size_mb(path)?;
    let info = match nifti::inspect(path) {
        Ok(info) => Some(info),
        Err(e) => {
            debug!("No readable header for {:?}: {}", path, e);
            None
        }
    };
    Ok(VolumeSummary {
        path: path.to_path_buf(),
        size_mb,
        info,
    })
}

/// Configure and run a task in one call, without caching
pub fn apply_transforms_to_path(
    input: &Path,
    reference: &Path,
    output: &Path,
    params: &ApplyTransformsParams,
    env: &ToolEnv,
) -> Result<TaskResult> {
    ApplyTransforms::new(input, reference, output)
        .params(params.clone())
        .run(env)
}

/// Same as [`apply_transforms_to_path`], reusing results from `cache`
pub fn apply_transforms_cached(
    input: &Path,
    reference: &Path,
    output: &Path,
    params: &ApplyTransformsParams,
    env: &ToolEnv,
    cache: &ResultCache,
) -> Result<TaskResult> {
    ApplyTransforms::new(input, reference, output)
        .params(params.clone())
        .run_cached(env, cache)
}
