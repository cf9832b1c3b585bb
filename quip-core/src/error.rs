use thiserror::Error;

use crate::hash_type::HashType;

#[derive(Error, Debug)]
pub enum QuipError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Digest length mismatch for {hash_type}: expected {expected} bytes, got {actual}")]
    DigestLengthMismatch {
        hash_type: HashType,
        expected: usize,
        actual: usize,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Perceptual hash error: {0}")]
    PerceptualHash(String),
}

impl QuipError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether the error was caused by caller input rather than the engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::DigestLengthMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, QuipError>;
