//! The closed set of perceptual hash algorithms the engine understands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuipError;

/// Identifies which perceptual hashing algorithm produced a digest.
///
/// The set is fixed at compile time; an engine is configured with a
/// non-empty subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashType {
    /// Average hash: each bit is a pixel compared to the mean luminance.
    Mean,
    /// Horizontal gradient (dHash).
    Gradient,
    /// Horizontal and vertical gradients combined.
    DoubleGradient,
    /// Blockhash grid algorithm.
    Block,
    /// Mean hash over DCT coefficients (pHash).
    Dct,
}

impl HashType {
    /// Every hash type, in canonical order.
    pub const ALL: [HashType; 5] = [
        HashType::Mean,
        HashType::Gradient,
        HashType::DoubleGradient,
        HashType::Block,
        HashType::Dct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Gradient => "gradient",
            Self::DoubleGradient => "double_gradient",
            Self::Block => "block",
            Self::Dct => "dct",
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashType {
    type Err = QuipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| QuipError::validation(format!("Unknown hash type: '{}'", s)))
    }
}
