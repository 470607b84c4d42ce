use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Task(#[from] antsrun::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] antsrun::CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Error class shown next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Task(e) => e.kind(),
            AppError::Cache(_) | AppError::Io(_) | AppError::Json(_) => "i/o",
        }
    }
}
