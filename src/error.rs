//! Error types for identity matching.

use ndarray::ArrayView1;
use thiserror::Error;

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, ReidError>;

/// Errors surfaced by the identity store, tracklet smoothing and configuration.
#[derive(Error, Debug)]
pub enum ReidError {
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Embedding contains a NaN or infinite component")]
    NonFiniteEmbedding,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReidError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn check_dim(expected: usize, got: usize) -> Result<()> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, got })
        }
    }

    pub(crate) fn check_finite(embedding: ArrayView1<'_, f32>) -> Result<()> {
        if embedding.iter().all(|x| x.is_finite()) {
            Ok(())
        } else {
            Err(Self::NonFiniteEmbedding)
        }
    }
}
