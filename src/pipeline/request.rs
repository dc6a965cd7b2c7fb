//! Inbound request shapes

use serde::{Deserialize, Serialize};

use crate::pipeline::validator::UploadedImage;

/// Body of `POST /generate-text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    pub content_type: String,
}

/// Body of `POST /generate-image-from-text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenRequest {
    pub prompt: String,
    pub style: String,
    pub orientation: String,
}

/// One request, owned by the handler for its whole lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    Text(TextRequest),
    Caption {
        image: UploadedImage,
    },
    ImageText {
        image: UploadedImage,
        prompt: String,
        content_type: String,
    },
    ImageGen(ImageGenRequest),
}

impl GenerationRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Text(_) => "generate_text",
            Self::Caption { .. } => "caption_image",
            Self::ImageText { .. } => "generate_text_from_image",
            Self::ImageGen(_) => "generate_images",
        }
    }
}
