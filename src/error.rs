//! Crate-level error type and `Result` alias.
//! Configuration problems (bad arguments, missing inputs, unreadable config)
//! are kept apart from execution problems (tool not found, spawn failure), so
//! callers can tell a misconfigured task from a tool that could not run.
//! A tool that runs and exits non-zero is not an error; see `TaskResult`.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] crate::io::NiftiError),

    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing input file: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Tool not found: {tool} (searched {searched})")]
    ToolNotFound { tool: String, searched: String },

    #[error("Failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for errors raised before any process was started because the
    /// task itself is wrong.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument { .. } | Error::MissingInput { .. } | Error::Config { .. }
        )
    }

    /// Short label used in user-facing reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument { .. } | Error::MissingInput { .. } | Error::Config { .. } => {
                "configuration"
            }
            Error::ToolNotFound { .. } | Error::Spawn { .. } => "execution",
            Error::Io(_) | Error::Json(_) | Error::Nifti(_) | Error::Cache(_) => "i/o",
        }
    }
}
