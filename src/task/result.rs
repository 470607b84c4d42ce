use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of running a task to completion.
///
/// A tool that exits non-zero still yields a `TaskResult`; success is
/// decided by [`TaskResult::output_exists`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub cmdline: String,
    /// Exit code; `None` if the process was terminated by a signal
    pub return_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Absolute path of the declared output image
    pub output_image: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Served from the result cache without running the tool
    #[serde(default)]
    pub cached: bool,
}

impl TaskResult {
    pub fn output_exists(&self) -> bool {
        self.output_image.exists()
    }

    pub fn exited_cleanly(&self) -> bool {
        self.return_code == Some(0)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Output size in MiB, if the file exists
    pub fn output_size_mb(&self) -> Option<f64> {
        crate::io::nifti::size_mb(&self.output_image).ok()
    }
}
