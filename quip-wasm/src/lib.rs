//! WebAssembly bindings for Quip perceptual hashing.
//!
//! This module computes image digests directly in the browser, so only
//! digests (never the image itself) need to be sent to a Quip server.

use std::collections::BTreeMap;

use quip_core::{Digest, HashType, PerceptualHasher};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

const FALLBACK_ERROR_JSON: &str =
    r#"{"digests":{},"content_fingerprint":"","error":"Unknown error"}"#;

/// Result of hashing an image.
#[derive(Serialize, Default)]
pub struct HashResult {
    /// Hex digest per hash type
    pub digests: BTreeMap<HashType, String>,
    /// SHA3-256 of the raw bytes (hex encoded)
    pub content_fingerprint: String,
    /// Error message if hashing failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compute all perceptual digests of an encoded image.
///
/// # Arguments
/// * `image_bytes` - JPEG, PNG, GIF or WebP file content
///
/// # Returns
/// A JSON string with `digests` and `content_fingerprint`, or an `error`
#[wasm_bindgen]
pub fn hash_image_wasm(image_bytes: &[u8]) -> String {
    let result = match PerceptualHasher::default().fingerprint(image_bytes) {
        Ok(fingerprint) => HashResult {
            digests: fingerprint
                .digests
                .iter()
                .map(|(t, d)| (*t, d.to_hex()))
                .collect(),
            content_fingerprint: fingerprint.content_fingerprint,
            error: None,
        },
        Err(e) => HashResult {
            error: Some(e.to_string()),
            ..Default::default()
        },
    };

    serde_json::to_string(&result).unwrap_or_else(|_| FALLBACK_ERROR_JSON.to_string())
}

/// Hamming distance between two hex-encoded digests.
///
/// Returns -1 if either digest is not valid hex or the lengths differ.
#[wasm_bindgen]
pub fn hamming_distance_wasm(a_hex: &str, b_hex: &str) -> i32 {
    let distance = Digest::from_hex(a_hex)
        .and_then(|a| Digest::from_hex(b_hex).and_then(|b| a.hamming_distance(&b)));

    match distance {
        Ok(d) => i32::try_from(d).unwrap_or(-1),
        Err(_) => -1,
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_hamming_distance_wasm() {
        assert_eq!(hamming_distance_wasm("00ff", "00ff"), 0);
        assert_eq!(hamming_distance_wasm("0000", "ffff"), 16);
        assert_eq!(hamming_distance_wasm("00", "0000"), -1);
        assert_eq!(hamming_distance_wasm("zz", "00"), -1);
        assert_eq!(hamming_distance_wasm("", ""), -1);
    }

    #[test]
    fn test_hash_image_wasm_reports_errors() {
        let json: Value = serde_json::from_str(&hash_image_wasm(b"not an image")).unwrap();
        assert!(json["error"].as_str().unwrap().contains("decode"));
        assert!(json["digests"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_get_version() {
        assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
    }
}
