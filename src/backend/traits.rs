//! Capability boundary between the request pipeline and a generation provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Reference to an uploaded image materialized on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub path: PathBuf,
    pub mime_type: String,
}

/// Parameters for an image generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenParams {
    /// The composed prompt
    pub prompt: String,

    /// Number of images to request
    pub count: u32,

    /// "1:1", "3:4" or "4:3"
    pub aspect_ratio: String,

    /// Provider safety filter threshold
    pub safety_level: String,

    /// Provider policy for generating people
    pub person_policy: String,
}

/// The four remote capabilities the pipeline depends on.
///
/// Empty sequences are valid results meaning "nothing produced". Failures carry
/// the provider's message; structured safety blocks are reported as
/// `AppError::ContentBlocked`.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Provider name, for logging
    fn name(&self) -> &str;

    /// Candidate texts for a prompt
    async fn generate_text(&self, prompt: &str) -> Result<Vec<String>>;

    /// Up to a fixed number of captions in a fixed language
    async fn caption_image(&self, image: &ImageRef) -> Result<Vec<String>>;

    /// Candidate texts for a prompt conditioned on an image
    async fn generate_text_from_image(&self, prompt: &str, image: &ImageRef) -> Result<Vec<String>>;

    /// Raw image bytes; may legitimately be empty
    async fn generate_images(&self, params: &ImageGenParams) -> Result<Vec<Vec<u8>>>;
}
