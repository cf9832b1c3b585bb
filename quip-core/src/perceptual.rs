//! Perceptual hashing for images.
//!
//! Computes one [`Digest`] per configured [`HashType`] so that visually
//! similar images land at small Hamming distances from each other, even
//! after re-encoding, resizing, or light edits.
//!
//! # Usage
//!
//! ```no_run
//! use quip_core::perceptual::PerceptualHasher;
//!
//! let image_data = std::fs::read("image.jpg").unwrap();
//! let hasher = PerceptualHasher::default();
//! let digests = hasher.hash_bytes(&image_data).unwrap();
//!
//! let other = hasher.hash_bytes(&std::fs::read("image2.jpg").unwrap()).unwrap();
//! for (hash_type, digest) in &digests {
//!     let distance = digest.hamming_distance(&other[hash_type]).unwrap();
//!     println!("{hash_type}: {distance}");
//! }
//! ```

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::Serialize;
use sha3::{Digest as _, Sha3_256};

use crate::digest::{Digest, DigestSet};
use crate::error::{QuipError, Result};
use crate::hash_type::HashType;

/// Side length of the hash grid; 8x8 gives 64-bit digests for most types.
pub const HASH_GRID_SIZE: u32 = 8;

/// Digests and exact-content fingerprint of one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageFingerprint {
    pub digests: DigestSet,
    pub content_fingerprint: String,
}

/// Computes digests for a fixed set of hash types.
pub struct PerceptualHasher {
    hashers: Vec<(HashType, Hasher)>,
}

impl PerceptualHasher {
    pub fn new(hash_types: impl IntoIterator<Item = HashType>) -> Self {
        Self {
            hashers: hash_types
                .into_iter()
                .map(|t| (t, build_hasher(t)))
                .collect(),
        }
    }

    pub fn hash_types(&self) -> impl Iterator<Item = HashType> + '_ {
        self.hashers.iter().map(|(t, _)| *t)
    }

    /// Decode encoded image bytes and hash them.
    ///
    /// Supports JPEG, PNG, GIF, and WebP formats.
    pub fn hash_bytes(&self, image_data: &[u8]) -> Result<DigestSet> {
        let image = image::load_from_memory(image_data)
            .map_err(|e| QuipError::PerceptualHash(format!("Failed to decode image: {}", e)))?;

        Ok(self.hash_image(&image))
    }

    /// Hash an already decoded image.
    pub fn hash_image(&self, image: &DynamicImage) -> DigestSet {
        self.hashers
            .iter()
            .map(|(hash_type, hasher)| {
                let hash = hasher.hash_image(image);
                (*hash_type, Digest::from(hash.as_bytes()))
            })
            .collect()
    }

    /// Digests plus the SHA3-256 fingerprint of the raw bytes.
    pub fn fingerprint(&self, image_data: &[u8]) -> Result<ImageFingerprint> {
        Ok(ImageFingerprint {
            digests: self.hash_bytes(image_data)?,
            content_fingerprint: content_fingerprint(image_data),
        })
    }

    /// Check if the provided bytes appear to be a supported image format.
    pub fn is_supported_format(data: &[u8]) -> bool {
        image::guess_format(data).is_ok()
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(HashType::ALL)
    }
}

impl std::fmt::Debug for PerceptualHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptualHasher")
            .field("hash_types", &self.hash_types().collect::<Vec<_>>())
            .finish()
    }
}

fn build_hasher(hash_type: HashType) -> Hasher {
    let config = HasherConfig::new().hash_size(HASH_GRID_SIZE, HASH_GRID_SIZE);
    match hash_type {
        HashType::Mean => config.hash_alg(HashAlg::Mean),
        HashType::Gradient => config.hash_alg(HashAlg::Gradient),
        HashType::DoubleGradient => config.hash_alg(HashAlg::DoubleGradient),
        HashType::Block => config.hash_alg(HashAlg::Blockhash),
        HashType::Dct => config.hash_alg(HashAlg::Mean).preproc_dct(),
    }
    .to_hasher()
}

/// Hex-encoded SHA3-256 of the raw bytes.
pub fn content_fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
