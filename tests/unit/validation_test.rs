//! Unit tests for upload validation

use jenna_api::config::UploadConfig;
use jenna_api::pipeline::validator::SIZE_WARNING;
use jenna_api::pipeline::{InputValidator, UploadedImage};

const EXTENSION_WARNING: &str = "Only images with extensions jpeg, jpg and png are allowed.";

fn image(content_type: Option<&str>, size: usize) -> UploadedImage {
    UploadedImage {
        bytes: Vec::new(),
        content_type: content_type.map(str::to_string),
        size,
    }
}

#[test]
fn test_accepted_types() {
    let validator = InputValidator::default();
    for ct in ["image/jpeg", "image/jpg", "image/png", "image/PNG", "anything/JPG"] {
        assert!(validator.validate_image(&image(Some(ct), 100)).is_empty(), "{}", ct);
    }
}

#[test]
fn test_rejected_types() {
    let validator = InputValidator::default();
    for ct in [Some("image/gif"), Some("image/webp"), Some("text/plain"), Some("png; charset=x"), None] {
        assert_eq!(
            validator.validate_image(&image(ct, 100)),
            vec![EXTENSION_WARNING.to_string()],
            "{:?}",
            ct
        );
    }
}

#[test]
fn test_size_boundary() {
    let validator = InputValidator::default();
    assert!(validator.validate_image(&image(Some("image/png"), 26_999_999)).is_empty());
    assert_eq!(
        validator.validate_image(&image(Some("image/png"), 27_000_000)),
        vec![SIZE_WARNING.to_string()]
    );
    assert_eq!(SIZE_WARNING, "File size is too large. Choose a file of a size lower than 20 MB.");
}

#[test]
fn test_both_failures_reported() {
    let validator = InputValidator::default();
    assert_eq!(
        validator.validate_image(&image(Some("image/bmp"), 40_000_000)),
        vec![EXTENSION_WARNING.to_string(), SIZE_WARNING.to_string()]
    );
}

#[test]
fn test_custom_extensions() {
    let validator = InputValidator::new(&UploadConfig {
        allowed_extensions: vec!["PNG".to_string(), "webp".to_string()],
        max_size_bytes: 10,
    });

    assert_eq!(
        validator.extension_warning(),
        "Only images with extensions png and webp are allowed."
    );
    assert!(validator.validate_image(&image(Some("image/webp"), 9)).is_empty());
    assert_eq!(validator.validate_image(&image(Some("image/png"), 10)).len(), 1);
}
