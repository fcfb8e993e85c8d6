/*!
Errors produced by the classification pipeline stages.
*/

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can be returned by the classification pipeline.
#[derive(Error, Debug)]
pub enum LesionError {
    #[error("unknown model {0:?}")]
    UnknownModel(String),

    #[error("failed decoding image: {0}")]
    DecodeError(#[from] image::ImageError),

    #[error("failed loading model from {path:?}")]
    ModelLoadError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("shape mismatch: expected {expected:?} but found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("inference failed: {0}")]
    InferenceError(anyhow::Error),
}

impl LesionError {
    pub(crate) fn model_load(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::ModelLoadError {
            path: path.into(),
            source: source.into(),
        }
    }
}
