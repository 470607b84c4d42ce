//! Content-addressed cache of task results.
//!
//! Each record lives in `<root>/<key>.json`, where the key is a SHA-256 over
//! the rendered command line and the size and modification time of every
//! input file. Clearing the cache removes the whole root directory.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::task::TaskResult;

const APP_DIR: &str = "antsrun";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No user cache directory available on this platform")]
    NoCacheDir,
    #[error("Cannot fingerprint {}: {source}", path.display())]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot encode cache record {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Default cache root: `<user cache dir>/antsrun`
pub fn default_cache_dir() -> Result<PathBuf, CacheError> {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or(CacheError::NoCacheDir)
}

/// Remove a cache directory and everything under it.
///
/// Returns `true` if something was removed.
pub fn clear_cache(dir: &Path) -> Result<bool, CacheError> {
    if !dir.exists() {
        debug!("Cache not present: {:?}", dir);
        return Ok(false);
    }
    std::fs::remove_dir_all(dir)?;
    info!("Cleared cache: {:?}", dir);
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clear(&self) -> Result<bool, CacheError> {
        clear_cache(&self.root)
    }

    /// Key for a command line over the given inputs
    pub fn key(&self, cmdline: &str, inputs: &[&Path]) -> Result<String, CacheError> {
        let mut hasher = Sha256::new();
        hasher.update(cmdline.as_bytes());
        for path in inputs {
            let meta = std::fs::metadata(path).map_err(|source| CacheError::Fingerprint {
                path: path.to_path_buf(),
                source,
            })?;
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            hasher.update([0u8]);
            hasher.update(path.as_os_str().as_encoded_bytes());
            hasher.update(meta.len().to_le_bytes());
            hasher.update(mtime.to_le_bytes());
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Look up a stored result. A record that does not parse, or whose
    /// output file has disappeared, is treated as a miss; unparsable records
    /// are removed.
    pub fn get(&self, key: &str) -> Result<Option<TaskResult>, CacheError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        let result: TaskResult = match serde_json::from_str(&text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Discarding corrupt cache record {:?}: {}", path, e);
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Could not remove {:?}: {}", path, e);
                }
                return Ok(None);
            }
        };
        if !result.output_exists() {
            warn!(
                "Cached output missing, ignoring record: {:?}",
                result.output_image
            );
            return Ok(None);
        }
        Ok(Some(result))
    }

    pub fn put(&self, key: &str, result: &TaskResult) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.record_path(key);
        let text = serde_json::to_string_pretty(result).map_err(|source| CacheError::Encode {
            path: path.clone(),
            source,
        })?;
        // Write beside the record and rename, so readers never see a partial file
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(&path).map_err(|e| CacheError::Io(e.error))?;
        debug!("Stored cache record {:?}", path);
        Ok(())
    }
}
