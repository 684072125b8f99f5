use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CosError {
    // Configuration
    #[error("COS configuration is incomplete, missing: {}", .missing.join(", "))]
    IncompleteConfig { missing: Vec<&'static str> },

    #[error("COS is not configured yet, run `najie-storage-cos config set` first")]
    ConfigNotFound,

    // Local resources
    #[error("File not found: {}", .0.display())]
    LocalFileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Remote service
    #[error("{0}")]
    Remote(String),

    // Persistence
    #[error("Failed to access config file: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CosError>;
