//! HTTP handlers for the generation endpoints

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    response::Html,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::pipeline::{GenerationRequest, ImageGenRequest, TextRequest, UploadedImage};
use crate::response::GenerationOutcome;
use crate::AppState;

const WELCOME_PAGE: &str = r#"
    <html>
        <head>
            <title>Jenna API</title>
        </head>
        <body>
            <p>Welcome to the Jenna API! 🤖</p>
        </body>
    </html>
"#;

pub async fn root() -> Html<&'static str> {
    Html(WELCOME_PAGE)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TextRequest>, JsonRejection>,
) -> Result<GenerationOutcome> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    info!(content_type = %request.content_type, "Received text generation request");

    Ok(state.service.handle(GenerationRequest::Text(request)).await)
}

pub async fn generate_image_captions(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<GenerationOutcome> {
    let mut form = ImageForm::read(multipart, state.settings.uploads.max_size_bytes).await?;
    let image = form.take_image()?;
    info!(size = image.size, content_type = ?image.content_type, "Received caption request");

    Ok(state
        .service
        .handle(GenerationRequest::Caption { image })
        .await)
}

pub async fn generate_text_from_image(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<GenerationOutcome> {
    let mut form = ImageForm::read(multipart, state.settings.uploads.max_size_bytes).await?;
    let image = form.take_image()?;
    let content_type = form.take_field("content_type")?;
    let prompt = form.take_field("prompt")?;
    info!(
        size = image.size,
        content_type = %content_type,
        "Received image text generation request"
    );

    Ok(state
        .service
        .handle(GenerationRequest::ImageText {
            image,
            prompt,
            content_type,
        })
        .await)
}

pub async fn generate_image_from_text(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ImageGenRequest>, JsonRejection>,
) -> Result<GenerationOutcome> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    info!(
        style = %request.style,
        orientation = %request.orientation,
        "Received image generation request"
    );

    Ok(state.service.handle(GenerationRequest::ImageGen(request)).await)
}

/// Fields of a multipart upload: the `image` file plus plain text fields
struct ImageForm {
    image: Option<UploadedImage>,
    fields: HashMap<String, String>,
}

impl ImageForm {
    /// `keep_limit` bounds how many image bytes are held in memory; the full
    /// size is still counted so the size check sees it.
    async fn read(
        multipart: std::result::Result<Multipart, MultipartRejection>,
        keep_limit: usize,
    ) -> Result<Self> {
        let mut multipart =
            multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

        let mut form = Self {
            image: None,
            fields: HashMap::new(),
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "image" {
                form.image = Some(read_image(field, keep_limit).await?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Field read error: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn take_image(&mut self) -> Result<UploadedImage> {
        self.image
            .take()
            .ok_or_else(|| AppError::InvalidRequest("Missing required field: image".to_string()))
    }

    fn take_field(&mut self, name: &str) -> Result<String> {
        self.fields
            .remove(name)
            .ok_or_else(|| AppError::InvalidRequest(format!("Missing required field: {}", name)))
    }
}

async fn read_image(mut field: Field<'_>, keep_limit: usize) -> Result<UploadedImage> {
    let content_type = field.content_type().map(str::to_string);
    let mut bytes = Vec::new();
    let mut size = 0usize;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Image read error: {}", e)))?
    {
        size += chunk.len();
        // Past the limit the upload is rejected anyway: count, don't keep
        if size < keep_limit {
            bytes.extend_from_slice(&chunk);
        }
    }

    Ok(UploadedImage {
        bytes,
        content_type,
        size,
    })
}
