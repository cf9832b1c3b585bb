//! Robustness tests for perceptual hashing and end-to-end retrieval.
//!
//! These tests verify that digests stay close after common image
//! transformations, and that the engine retrieves the original record for a
//! re-encoded copy.

#![cfg(feature = "perceptual-hash")]

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use quip_core::{
    EngineConfig, HashType, Observation, PerceptualHasher, QueryOutcome, SimilarityEngine,
};
use std::io::Cursor;

/// Maximum acceptable Hamming distance for "similar" 64-bit digests.
const SIMILARITY_THRESHOLD: u32 = 10;

/// Create a test image with recognizable patterns.
fn create_test_image(width: u32, height: u32) -> RgbImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let r = ((x as f32 / width as f32) * 255.0) as u8;
        let g = ((y as f32 / height as f32) * 255.0) as u8;
        let b = (((x + y) as f32 / (width + height) as f32) * 200.0) as u8;

        let pattern = if (x / 20 + y / 20) % 2 == 0 { 30 } else { 0 };
        *pixel = Rgb([r.saturating_add(pattern), g, b]);
    }

    img
}

/// A visually unrelated image: dark on the left, bright on the right, inverted vertically.
fn create_other_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let v = if (x * 3 / width + y * 5 / height) % 2 == 0 { 240 } else { 10 };
        Rgb([v, 255 - v, v / 2])
    })
}

/// Compress an image to JPEG with the specified quality (1-100).
fn compress_jpeg(img: &DynamicImage, quality: u8) -> DynamicImage {
    let mut buffer = Cursor::new(Vec::new());

    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    img.write_with_encoder(encoder)
        .expect("JPEG encoding failed");

    buffer.set_position(0);
    image::load_from_memory(&buffer.into_inner()).expect("JPEG decoding failed")
}

/// Resize an image by the given percentage (e.g., 50 = 50% of original size).
fn resize_image(img: &DynamicImage, percentage: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let new_width = (width * percentage) / 100;
    let new_height = (height * percentage) / 100;
    img.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)
        .expect("PNG encoding failed");
    buffer.into_inner()
}

// ============================================================================
// Digest stability
// ============================================================================

#[test]
fn test_identical_images_zero_distance_all_types() {
    let original = DynamicImage::ImageRgb8(create_test_image(256, 256));
    let hasher = PerceptualHasher::default();

    let a = hasher.hash_image(&original);
    let b = hasher.hash_image(&original);

    for hash_type in HashType::ALL {
        assert_eq!(
            a[&hash_type].hamming_distance(&b[&hash_type]).unwrap(),
            0,
            "{} should be deterministic",
            hash_type
        );
    }
}

#[test]
fn test_dct_jpeg_compression_90() {
    let original = DynamicImage::ImageRgb8(create_test_image(256, 256));
    let compressed = compress_jpeg(&original, 90);

    let hasher = PerceptualHasher::new([HashType::Dct]);
    let a = hasher.hash_image(&original);
    let b = hasher.hash_image(&compressed);

    let distance = a[&HashType::Dct]
        .hamming_distance(&b[&HashType::Dct])
        .expect("Distance calculation failed");
    println!("JPEG 90% quality - dct distance: {}", distance);

    assert!(
        distance <= SIMILARITY_THRESHOLD,
        "JPEG 90% compression should preserve similarity (distance: {}, threshold: {})",
        distance,
        SIMILARITY_THRESHOLD
    );
}

#[test]
fn test_mean_resize_75_percent() {
    let original = DynamicImage::ImageRgb8(create_test_image(256, 256));
    let resized = resize_image(&original, 75);

    let hasher = PerceptualHasher::new([HashType::Mean]);
    let a = hasher.hash_image(&original);
    let b = hasher.hash_image(&resized);

    let distance = a[&HashType::Mean]
        .hamming_distance(&b[&HashType::Mean])
        .expect("Distance calculation failed");
    println!("Resize 75% - mean distance: {}", distance);

    assert!(
        distance <= SIMILARITY_THRESHOLD,
        "75% resize should preserve similarity (distance: {}, threshold: {})",
        distance,
        SIMILARITY_THRESHOLD
    );
}

#[test]
fn test_algorithm_comparison_on_compression() {
    let original = DynamicImage::ImageRgb8(create_test_image(256, 256));
    let compressed = compress_jpeg(&original, 70);

    let hasher = PerceptualHasher::default();
    let a = hasher.hash_image(&original);
    let b = hasher.hash_image(&compressed);

    for hash_type in HashType::ALL {
        let distance = a[&hash_type].hamming_distance(&b[&hash_type]).unwrap();
        println!(
            "{} ({} bits) - JPEG 70% distance: {}",
            hash_type,
            a[&hash_type].bit_len(),
            distance
        );
    }
}

// ============================================================================
// End-to-end retrieval
// ============================================================================

#[test]
fn test_engine_retrieves_original_for_reencoded_copy() {
    let hasher = PerceptualHasher::default();
    let engine = SimilarityEngine::in_memory(EngineConfig::default()).unwrap();

    let original = DynamicImage::ImageRgb8(create_test_image(256, 256));
    let other = DynamicImage::ImageRgb8(create_other_image(256, 256));

    let original_fp = hasher.fingerprint(&encode_png(&original)).unwrap();
    let other_fp = hasher.fingerprint(&encode_png(&other)).unwrap();
    assert_ne!(original_fp.content_fingerprint, other_fp.content_fingerprint);

    let other_id = engine
        .submit_observation(Observation::new(
            other_fp.digests,
            other_fp.content_fingerprint,
            false,
            0.95,
        ))
        .unwrap();
    let original_id = engine
        .submit_observation(Observation::new(
            original_fp.digests,
            original_fp.content_fingerprint,
            true,
            0.9,
        ))
        .unwrap();
    assert_ne!(original_id, other_id);

    let query = hasher.hash_image(&compress_jpeg(&original, 85));
    let outcome = engine.query_similarity(&query, Some(1)).unwrap();

    match outcome {
        QueryOutcome::Classified(c) => {
            assert_eq!(c.n_matches, 1);
            assert!((c.p_yes - 0.9).abs() < 1e-9, "nearest should be the original");
            assert!(c.likely);
        }
        QueryOutcome::NotFound => panic!("expected a match"),
    }
}
