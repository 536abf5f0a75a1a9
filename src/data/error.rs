//! Errors raised while reading the vocabulary and dataset containers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read npz container: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    #[error("array '{name}' not found in '{path}'")]
    MissingArray { path: PathBuf, name: String },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("vocabulary has no '{0}' token")]
    MissingToken(String),

    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("negative token index {0} in sentence data")]
    NegativeToken(i64),
}

impl DataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io { path: path.into(), source }
    }
}
