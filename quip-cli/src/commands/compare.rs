//! Compare command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use quip_core::{HashType, PerceptualHasher};
use serde::Serialize;
use tracing::info;

use crate::utils::{fingerprint_file, print_json, selected_types};

/// Distances at or below this fraction of the digest length read as "similar".
const SIMILAR_FRACTION: f64 = 10.0 / 64.0;

#[derive(Debug, Serialize, PartialEq)]
struct TypeDistance {
    distance: u32,
    bits: u32,
}

#[derive(Debug, Serialize)]
struct CompareOutput {
    identical: bool,
    distances: BTreeMap<HashType, TypeDistance>,
    /// Mean of the per-type distances, every type weighted equally
    combined: f64,
}

/// Execute the compare command.
pub fn execute(
    first: PathBuf,
    second: PathBuf,
    types: Vec<HashType>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let hasher = PerceptualHasher::new(selected_types(&types));
    let a = fingerprint_file(&hasher, &first)?;
    let b = fingerprint_file(&hasher, &second)?;

    let mut distances = BTreeMap::new();
    for (hash_type, digest) in &a.digests {
        let Some(other) = b.digests.get(hash_type) else {
            continue;
        };
        let distance = digest
            .hamming_distance(other)
            .with_context(|| format!("Cannot compare {} digests", hash_type))?;
        distances.insert(
            *hash_type,
            TypeDistance {
                distance,
                bits: digest.bit_len(),
            },
        );
    }

    let output = CompareOutput {
        identical: a.content_fingerprint == b.content_fingerprint,
        combined: combined_score(&distances),
        distances,
    };

    info!(
        identical = output.identical,
        combined = output.combined,
        "Compared images"
    );

    if json {
        return print_json(&output);
    }

    if quiet {
        return Ok(());
    }

    println!();
    if output.identical {
        println!("   {}", "Byte-identical files".green().bold());
    }
    for (hash_type, d) in &output.distances {
        let similar = f64::from(d.distance) <= f64::from(d.bits) * SIMILAR_FRACTION;
        let verdict = if similar {
            "similar".green()
        } else {
            "different".yellow()
        };
        println!(
            "   {:<16} {:>3} / {:<3} {}",
            hash_type.as_str().cyan(),
            d.distance,
            d.bits,
            verdict
        );
    }
    println!();
    println!(
        "   {} {:.2}",
        "Combined (even weights):".dimmed(),
        output.combined
    );
    println!();

    Ok(())
}

fn combined_score(distances: &BTreeMap<HashType, TypeDistance>) -> f64 {
    if distances.is_empty() {
        return 0.0;
    }
    let weight = 1.0 / distances.len() as f64;
    distances
        .values()
        .map(|d| weight * f64::from(d.distance))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_score_even_split() {
        let mut distances = BTreeMap::new();
        distances.insert(HashType::Mean, TypeDistance { distance: 4, bits: 64 });
        distances.insert(HashType::Dct, TypeDistance { distance: 8, bits: 64 });
        assert!((combined_score(&distances) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_combined_score_empty() {
        assert_eq!(combined_score(&BTreeMap::new()), 0.0);
    }
}
