//! Example demonstrating the engine's tracing instrumentation.
//!
//! Run with: cargo run -p quip-core --example engine_tracing

use quip_core::{Digest, DigestSet, EngineConfig, HashType, Observation, SimilarityEngine};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

fn digests(mean: &str, dct: &str) -> quip_core::Result<DigestSet> {
    let mut set = DigestSet::new();
    set.insert(HashType::Mean, Digest::from_hex(mean)?);
    set.insert(HashType::Dct, Digest::from_hex(dct)?);
    Ok(set)
}

fn main() -> quip_core::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::new("quip_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Quip Engine Tracing Demo ===\n");

    let engine = SimilarityEngine::in_memory(EngineConfig::default())?;

    engine.submit_observation(Observation::new(
        digests("f0f0f0f0f0f0f0f0", "0123456789abcdef")?,
        "demo-ai",
        true,
        0.92,
    ))?;
    engine.submit_observation(Observation::new(
        digests("0f0f0f0f0f0f0f0f", "fedcba9876543210")?,
        "demo-real",
        false,
        0.88,
    ))?;

    let query = digests("f0f0f0f0f0f0f0f1", "0123456789abcdee")?;
    let outcome = engine.query_similarity(&query, Some(1))?;
    println!("\nOutcome: {:?}\n", outcome);

    engine.submit_feedback(&json!({
        "contributions": {"mean": 1.0, "dct": 0.5},
        "correct": true
    }))?;

    for entry in engine.trust_report()? {
        println!(
            "   {:<16} correct={:<5} incorrect={:<5} weight={:.3}",
            entry.hash_type.as_str(),
            entry.correct,
            entry.incorrect,
            entry.weight
        );
    }

    Ok(())
}
