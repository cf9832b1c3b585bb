//! Request validation module
//!
//! Turns transport-encoded digests and image payloads into engine inputs.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use quip_core::{parse_digest_set, DigestSet, PerceptualHasher};

use crate::config::MAX_TOP_K;
use crate::error::ApiError;

/// Default max decoded image size in bytes (20 MB)
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

/// Digests resolved from a request, with the key used by the exact-match cache
#[derive(Debug, Clone)]
pub struct ResolvedDigests {
    pub digests: DigestSet,
    pub content_fingerprint: Option<String>,
}

impl ResolvedDigests {
    /// Cache key: the content fingerprint when known, otherwise every digest
    /// as `type:hex` joined by commas.
    pub fn cache_key(&self) -> Option<String> {
        if let Some(fp) = self.content_fingerprint.as_deref().filter(|fp| !fp.is_empty()) {
            return Some(fp.to_string());
        }
        if self.digests.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .digests
            .iter()
            .map(|(hash_type, digest)| format!("{}:{}", hash_type, digest.to_hex()))
            .collect();
        Some(parts.join(","))
    }
}

/// Resolve the digests of a request carrying either `digests` or `image_data`.
///
/// When image bytes are sent, the digests and fingerprint are computed here;
/// an explicit `content_fingerprint` from the client takes precedence.
pub fn resolve_digests(
    hasher: &PerceptualHasher,
    digests: Option<&BTreeMap<String, String>>,
    image_data: Option<&str>,
    content_fingerprint: Option<String>,
) -> Result<ResolvedDigests, ApiError> {
    match (digests, image_data) {
        (Some(_), Some(_)) => Err(ApiError::bad_request(
            "Provide either 'digests' or 'image_data', not both",
        )),
        (Some(map), None) => {
            let digests = decode_digests(map)?;
            Ok(ResolvedDigests {
                digests,
                content_fingerprint,
            })
        }
        (None, Some(encoded)) => {
            let bytes = decode_image_data(encoded, DEFAULT_MAX_IMAGE_SIZE)?;
            let fingerprint = hasher.fingerprint(&bytes)?;
            Ok(ResolvedDigests {
                digests: fingerprint.digests,
                content_fingerprint: content_fingerprint.or(Some(fingerprint.content_fingerprint)),
            })
        }
        (None, None) => Err(ApiError::bad_request(
            "Either 'digests' or 'image_data' must be provided",
        )),
    }
}

/// Decode a `{hash type name: encoded digest}` map.
///
/// Each digest is read as hex when it is valid hex, otherwise as standard base64.
pub fn decode_digests(map: &BTreeMap<String, String>) -> Result<DigestSet, ApiError> {
    if map.is_empty() {
        return Err(ApiError::bad_request("'digests' must not be empty"));
    }
    let digests = parse_digest_set(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(digests)
}

/// Decode base64 image data and enforce a size limit
pub fn decode_image_data(encoded: &str, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 image_data: {}", e)))?;

    if bytes.is_empty() {
        return Err(ApiError::bad_request("image_data must not be empty"));
    }
    validate_file_size(bytes.len(), max_size)?;
    Ok(bytes)
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Reject `k = 0` and cap large values at [`MAX_TOP_K`]
pub fn validate_top_k(k: Option<usize>) -> Result<Option<usize>, ApiError> {
    match k {
        Some(0) => Err(ApiError::bad_request("k must be at least 1")),
        Some(k) => Ok(Some(k.min(MAX_TOP_K))),
        None => Ok(None),
    }
}
