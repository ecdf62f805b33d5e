use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by facegroup operations.
#[derive(Debug, Error)]
pub enum FaceGroupError {
    #[error("invalid room id {room:?}: {reason}")]
    InvalidRoom { room: String, reason: &'static str },

    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    #[error("empty input")]
    EmptyInput,

    #[error("no faces detected in any photo")]
    NoFaces,

    #[error("no photo provided for search in {}", dir.display())]
    NoQueryImage { dir: PathBuf },

    #[error("no face detected in search image {file}")]
    NoQueryFace { file: String },

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("extractor error: {0}")]
    Extractor(String),

    #[error("cannot run face extractor {}: {source}", program.display())]
    ExtractorUnavailable {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FaceGroupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, FaceGroupError>;
