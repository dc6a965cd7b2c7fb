//! Canonical three-way outcome and the rules that produce it from provider results

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{AppError, PolicyViolation, Result};
use crate::response::base64;

/// Returned when a text, caption or image+text call produced no candidates
pub const EMPTY_TEXT_WARNING: &str =
    "Sorry. We are having trouble generating text content for this image. Try again.";

/// Returned when image generation produced no images
pub const EMPTY_IMAGES_WARNING: &str =
    "Sorry. We are having trouble generating images for this prompt. Try again.";

pub const CHILD_SAFETY_WARNING: &str =
    "Child content detected and blocked. Please ensure that your prompt does not solicit inappropriate content.";

pub const RESPONSIBLE_AI_WARNING: &str =
    "Your prompt was blocked for violating Responsible AI guidelines. Please rephrase your prompt and try again.";

/// Provider text that marks a child-safety block (Vertex support codes).
/// Checked before the responsible-AI marker because the same message carries both.
const CHILD_SAFETY_MARKERS: &[&str] = &["17301594", "58061214"];

const RESPONSIBLE_AI_MARKER: &str = "Responsible AI practices";

/// Success payload, one shape per operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Captions(Vec<String>),
    /// Base64 encoded images
    Images(Vec<String>),
}

/// Result of one request. Serializes to exactly one of
/// `{"response": ..}`, `{"warnings": [..]}` or `{"error": ".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationOutcome {
    Success { response: Payload },
    Warning { warnings: Vec<String> },
    Error { error: String },
}

impl GenerationOutcome {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            warnings: vec![message.into()],
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Warning { .. } => "warning",
            Self::Error { .. } => "error",
        }
    }
}

impl IntoResponse for GenerationOutcome {
    fn into_response(self) -> Response {
        // Every outcome kind is delivered with 200
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Identify a safety rejection, preferring the structured signal over message text
pub fn classify_failure(err: &AppError) -> Option<PolicyViolation> {
    if let AppError::ContentBlocked { violation, .. } = err {
        return Some(*violation);
    }

    let message = err.to_string();
    if CHILD_SAFETY_MARKERS.iter().any(|m| message.contains(m)) {
        Some(PolicyViolation::ChildSafety)
    } else if message.contains(RESPONSIBLE_AI_MARKER) {
        Some(PolicyViolation::ResponsibleAi)
    } else {
        None
    }
}

/// Map a failed call to a warning (known safety block) or an error (anything else)
pub fn normalize_failure(err: AppError) -> GenerationOutcome {
    match classify_failure(&err) {
        Some(PolicyViolation::ChildSafety) => {
            warn!(error = %err, "Request blocked by child-safety filter");
            GenerationOutcome::warning(CHILD_SAFETY_WARNING)
        }
        Some(PolicyViolation::ResponsibleAi) => {
            warn!(error = %err, "Request blocked by content policy");
            GenerationOutcome::warning(RESPONSIBLE_AI_WARNING)
        }
        None => {
            error!(error = %err, "Generation failed");
            GenerationOutcome::error(err.to_string())
        }
    }
}

fn normalize_with<T>(
    result: Result<Vec<T>>,
    empty_warning: &str,
    shape: impl FnOnce(Vec<T>) -> Payload,
) -> GenerationOutcome {
    match result {
        Ok(items) if items.is_empty() => GenerationOutcome::warning(empty_warning),
        Ok(items) => GenerationOutcome::Success {
            response: shape(items),
        },
        Err(err) => normalize_failure(err),
    }
}

/// Text and image+text generation: only the first candidate is returned
pub fn normalize_text(result: Result<Vec<String>>) -> GenerationOutcome {
    normalize_with(result, EMPTY_TEXT_WARNING, |texts| {
        Payload::Text(texts.into_iter().next().unwrap_or_default())
    })
}

pub fn normalize_captions(result: Result<Vec<String>>) -> GenerationOutcome {
    normalize_with(result, EMPTY_TEXT_WARNING, Payload::Captions)
}

/// Image generation: every image is base64 encoded independently
pub fn normalize_images(result: Result<Vec<Vec<u8>>>) -> GenerationOutcome {
    normalize_with(result, EMPTY_IMAGES_WARNING, |images| {
        Payload::Images(images.iter().map(|bytes| base64::encode(bytes)).collect())
    })
}
