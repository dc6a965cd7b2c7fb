//! Request pipeline: validate, compose, invoke, normalize

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::backend::traits::{GenerationGateway, ImageGenParams};
use crate::config::Settings;
use crate::pipeline::prompt::{ArtStyle, ContentKind, Orientation, PromptComposer};
use crate::pipeline::request::{GenerationRequest, ImageGenRequest, TextRequest};
use crate::pipeline::validator::{InputValidator, UploadedImage};
use crate::response::{
    normalize_captions, normalize_images, normalize_text, GenerationOutcome,
};
use crate::storage::{ScratchDir, TempImage};

/// Provider knobs for image generation that clients do not choose
#[derive(Debug, Clone)]
pub struct ImageDefaults {
    pub count: u32,
    pub safety_level: String,
    pub person_policy: String,
}

/// Runs every request kind against a shared, read-only gateway
pub struct ContentService {
    gateway: Arc<dyn GenerationGateway>,
    validator: InputValidator,
    composer: PromptComposer,
    scratch: ScratchDir,
    image_defaults: ImageDefaults,
}

impl ContentService {
    pub fn new(gateway: Arc<dyn GenerationGateway>, settings: &Settings) -> Self {
        Self {
            gateway,
            validator: InputValidator::new(&settings.uploads),
            composer: PromptComposer::new(settings.prompt.include_title),
            scratch: ScratchDir::new(&settings.storage.scratch_dir),
            image_defaults: ImageDefaults {
                count: settings.vertex.image_count,
                safety_level: settings.vertex.safety_filter_level.clone(),
                person_policy: settings.vertex.person_generation.clone(),
            },
        }
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Dispatch any request kind
    pub async fn handle(&self, request: GenerationRequest) -> GenerationOutcome {
        let operation = request.operation();
        let outcome = match request {
            GenerationRequest::Text(req) => self.generate_text(&req).await,
            GenerationRequest::Caption { image } => self.caption_image(image).await,
            GenerationRequest::ImageText {
                image,
                prompt,
                content_type,
            } => {
                self.generate_text_from_image(image, &prompt, &content_type)
                    .await
            }
            GenerationRequest::ImageGen(req) => self.generate_images(&req).await,
        };

        info!(
            operation,
            backend = self.gateway.name(),
            outcome = outcome.kind(),
            "Request completed"
        );
        outcome
    }

    pub async fn generate_text(&self, request: &TextRequest) -> GenerationOutcome {
        let kind = ContentKind::from_code(&request.content_type);
        let prompt = self.composer.text_prompt(kind, &request.prompt);
        debug!(kind = ?kind, prompt = %prompt, "Composed text prompt");

        normalize_text(self.gateway.generate_text(&prompt).await)
    }

    pub async fn caption_image(&self, image: UploadedImage) -> GenerationOutcome {
        if let Some(rejected) = self.reject_invalid(&image) {
            return rejected;
        }

        let temp = match self.materialize(&image).await {
            Ok(temp) => temp,
            Err(outcome) => return outcome,
        };

        let result = self.gateway.caption_image(temp.image_ref()).await;
        temp.release().await;

        normalize_captions(result)
    }

    pub async fn generate_text_from_image(
        &self,
        image: UploadedImage,
        prompt: &str,
        content_type: &str,
    ) -> GenerationOutcome {
        if let Some(rejected) = self.reject_invalid(&image) {
            return rejected;
        }

        let kind = ContentKind::from_code(content_type);
        let prompt = self.composer.image_text_prompt(kind, prompt);
        debug!(kind = ?kind, prompt = %prompt, "Composed image text prompt");

        let temp = match self.materialize(&image).await {
            Ok(temp) => temp,
            Err(outcome) => return outcome,
        };

        let result = self
            .gateway
            .generate_text_from_image(&prompt, temp.image_ref())
            .await;
        temp.release().await;

        normalize_text(result)
    }

    pub async fn generate_images(&self, request: &ImageGenRequest) -> GenerationOutcome {
        let style = ArtStyle::from_code(&request.style);
        let orientation = Orientation::from_code(&request.orientation);

        let params = ImageGenParams {
            prompt: self.composer.image_prompt(style, &request.prompt),
            count: self.image_defaults.count,
            aspect_ratio: orientation.aspect_ratio().to_string(),
            safety_level: self.image_defaults.safety_level.clone(),
            person_policy: self.image_defaults.person_policy.clone(),
        };
        debug!(prompt = %params.prompt, aspect_ratio = %params.aspect_ratio, "Composed image prompt");

        normalize_images(self.gateway.generate_images(&params).await)
    }

    fn reject_invalid(&self, image: &UploadedImage) -> Option<GenerationOutcome> {
        let warnings = self.validator.validate_image(image);
        if warnings.is_empty() {
            return None;
        }

        warn!(
            content_type = ?image.content_type,
            size = image.size,
            warnings = ?warnings,
            "Rejected upload"
        );
        Some(GenerationOutcome::Warning { warnings })
    }

    /// A failed scratch write ends the request with an error, not a warning
    async fn materialize(&self, image: &UploadedImage) -> Result<TempImage, GenerationOutcome> {
        self.scratch
            .acquire(&image.bytes, &image.extension(), &image.mime_type())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to write scratch image");
                GenerationOutcome::error(e.to_string())
            })
    }
}
