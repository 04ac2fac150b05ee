use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArError {
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no frames found for {0}")]
    EmptySource(String),

    #[error("invalid frame pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no overlay source, provide a patch image or a second video")]
    NoOverlay,

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("there are no frames to record")]
    EmptyRecording,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArError>;
