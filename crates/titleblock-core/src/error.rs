use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TitleBlockError {
    #[error("invalid page description: {0}")]
    InvalidInput(String),

    #[error("failed to load engine config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid engine config: {0}")]
    ConfigInvalid(String),

    #[error("unknown preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
