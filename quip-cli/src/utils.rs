//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use quip_core::{HashType, ImageFingerprint, PerceptualHasher};
use serde::Serialize;
use tracing::{debug, info};

/// Read an image file and compute its digests and content fingerprint.
pub fn fingerprint_file(hasher: &PerceptualHasher, path: &Path) -> Result<ImageFingerprint> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    info!(path = %path.display(), bytes = content.len(), "Read file");

    if !PerceptualHasher::is_supported_format(&content) {
        debug!(path = %path.display(), "Unrecognized image container");
    }

    hasher
        .fingerprint(&content)
        .with_context(|| format!("Failed to decode image: {}", path.display()))
}

/// Hash types to compute: the given list, or all of them.
pub fn selected_types(types: &[HashType]) -> Vec<HashType> {
    if types.is_empty() {
        HashType::ALL.to_vec()
    } else {
        let mut selected = types.to_vec();
        selected.sort();
        selected.dedup();
        selected
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
