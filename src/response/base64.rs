//! Base64 helpers for moving image bytes to the provider and back to clients

use base64::{engine::general_purpose::STANDARD, Engine};
use crate::error::{AppError, Result};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a base64 string, tolerating a `data:image/...;base64,` prefix
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let data = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };

    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::Backend(format!("Invalid base64 image data: {}", e)))
}
