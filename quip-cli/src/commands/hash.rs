//! Hash command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use quip_core::{HashType, PerceptualHasher};
use serde::Serialize;
use tracing::info;

use crate::utils::{fingerprint_file, print_json, selected_types};

#[derive(Serialize)]
struct HashOutput {
    file: String,
    content_fingerprint: String,
    digests: BTreeMap<HashType, String>,
}

/// Execute the hash command.
pub fn execute(file: PathBuf, types: Vec<HashType>, json: bool, quiet: bool) -> Result<()> {
    let hasher = PerceptualHasher::new(selected_types(&types));
    let fingerprint = fingerprint_file(&hasher, &file)?;

    info!(
        path = %file.display(),
        hash_types = fingerprint.digests.len(),
        "Computed digests"
    );

    if json {
        return print_json(&HashOutput {
            file: file.display().to_string(),
            content_fingerprint: fingerprint.content_fingerprint,
            digests: fingerprint
                .digests
                .iter()
                .map(|(t, d)| (*t, d.to_hex()))
                .collect(),
        });
    }

    if quiet {
        return Ok(());
    }

    println!();
    println!("   {} {}", "File:".dimmed(), file.display());
    println!(
        "   {} {}",
        "SHA3-256:".dimmed(),
        fingerprint.content_fingerprint
    );
    println!();
    for (hash_type, digest) in &fingerprint.digests {
        println!(
            "   {:<16} {} {}",
            hash_type.as_str().cyan(),
            digest.to_hex().bold(),
            format!("({} bits)", digest.bit_len()).dimmed()
        );
    }
    println!();

    Ok(())
}
