use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubdeckError {
    #[error("Caption fetch failed for {source_name}: {reason}")]
    CaptionFetchFailed { source_name: String, reason: String },

    #[error("Chunk {index} failed to load: {reason}")]
    ChunkLoadFailed { index: usize, reason: String },

    #[error("Media probe failed for {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WAV decode error: {0}")]
    WavError(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, DubdeckError>;
