//! Tool environment: where external binaries are looked up.
//!
//! Extra directories are prepended to the inherited `PATH` for the child
//! process only. The current process environment is never modified.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable the ANTs install scripts set to the `bin` directory
pub const ANTSPATH_VAR: &str = "ANTSPATH";

#[derive(Debug, Clone, Default)]
pub struct ToolEnv {
    extra_dirs: Vec<PathBuf>,
    base_path: Option<OsString>,
}

impl ToolEnv {
    /// Environment inheriting the current `PATH`
    pub fn inherit() -> Self {
        Self {
            extra_dirs: Vec::new(),
            base_path: std::env::var_os("PATH"),
        }
    }

    /// Environment that sees only the given directories; used by tests
    pub fn isolated() -> Self {
        Self::default()
    }

    /// Prepend a directory to the search path. Later calls take precedence
    /// over earlier ones, as with repeated `PATH=dir:$PATH`.
    pub fn prepend(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_dirs.insert(0, dir.into());
        self
    }

    /// Prepend `$ANTSPATH` if it is set and non-empty
    pub fn with_antspath(self) -> Self {
        match std::env::var_os(ANTSPATH_VAR) {
            Some(dir) if !dir.is_empty() => self.prepend(PathBuf::from(dir)),
            _ => self,
        }
    }

    pub fn extra_dirs(&self) -> &[PathBuf] {
        &self.extra_dirs
    }

    /// The `PATH` value handed to child processes
    pub fn search_path(&self) -> Result<OsString> {
        let mut dirs: Vec<PathBuf> = self.extra_dirs.clone();
        if let Some(base) = &self.base_path {
            dirs.extend(std::env::split_paths(base));
        }
        std::env::join_paths(dirs).map_err(|e| Error::InvalidArgument {
            arg: "PATH",
            value: e.to_string(),
        })
    }

    /// Resolve a binary name against the search path
    pub fn resolve(&self, program: &str) -> Result<PathBuf> {
        let path = self.search_path()?;
        let cwd = std::env::current_dir()?;
        match which::which_in(program, Some(&path), cwd) {
            Ok(found) => {
                debug!("Resolved {} -> {:?}", program, found);
                Ok(found)
            }
            Err(_) => Err(Error::ToolNotFound {
                tool: program.to_string(),
                searched: Path::new(&path).display().to_string(),
            }),
        }
    }
}
