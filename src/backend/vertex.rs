//! Vertex AI / Gemini REST backend

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::backend::auth::{ServiceAccountKey, ServiceAccountTokenSource, TokenSource};
use crate::backend::traits::{GenerationGateway, ImageGenParams, ImageRef};
use crate::config::VertexConfig;
use crate::error::{AppError, PolicyViolation, Result};
use crate::response::base64;

/// Gemini block reasons that mean the content policy rejected the prompt
const POLICY_BLOCK_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT"];

/// Generation backend talking to Vertex AI, and optionally to the Generative
/// Language API for image+text prompts
pub struct VertexBackend {
    name: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
    project_id: String,
    location: String,
    vertex_base: String,
    gemini_base: String,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
    caption_model: String,
    caption_count: u32,
    caption_language: String,
    image_model: String,
}

// --- Gemini wire types ---

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

// --- Vertex predict wire types ---

#[derive(Debug, Serialize)]
struct PredictRequest<I, P> {
    instances: Vec<I>,
    parameters: P,
}

#[derive(Debug, Serialize)]
struct CaptionInstance {
    image: EncodedImage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedImage {
    bytes_base64_encoded: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptionParameters<'a> {
    sample_count: u32,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    #[serde(default)]
    predictions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ImageInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    safety_setting: &'a str,
    person_generation: &'a str,
    include_rai_reason: bool,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl VertexBackend {
    /// Build the backend from configuration, authenticating with the
    /// configured service account key
    pub fn from_config(config: &VertexConfig) -> Result<Self> {
        if config.credentials_b64.is_empty() {
            return Err(AppError::Auth(
                "No service account key configured (GCP_SA_KEY_STRING)".to_string(),
            ));
        }

        let key = ServiceAccountKey::from_base64(&config.credentials_b64)?;
        let mut config = config.clone();
        if config.project_id.is_empty() {
            if let Some(project_id) = &key.project_id {
                config.project_id = project_id.clone();
            }
        }

        let client = build_client(config.timeout_ms)?;
        let tokens = Arc::new(ServiceAccountTokenSource::new(key, client.clone())?);
        Self::with_client(&config, client, tokens)
    }

    /// Build the backend with an explicit token source
    pub fn with_token_source(config: &VertexConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let client = build_client(config.timeout_ms)?;
        Self::with_client(config, client, tokens)
    }

    fn with_client(config: &VertexConfig, client: Client, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        if config.project_id.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "No Vertex project configured (GCP_PROJECT_ID)".to_string(),
            )));
        }

        let api_key = Some(config.api_key.clone()).filter(|k| !k.is_empty());

        Ok(Self {
            name: "vertex".to_string(),
            client,
            tokens,
            project_id: config.project_id.clone(),
            location: config.location.clone(),
            vertex_base: config.vertex_base_url(),
            gemini_base: config.gemini_endpoint.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            caption_model: config.caption_model.clone(),
            caption_count: config.caption_count,
            caption_language: config.caption_language.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.vertex_base, self.project_id, self.location, model, method
        )
    }

    /// POST to a Vertex endpoint with a bearer token
    async fn post_vertex<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.tokens.token().await?;
        send_json(self.client.post(url).bearer_auth(token).json(body)).await
    }

    async fn generate_content(&self, model: &str, request: &GenerateContentRequest) -> Result<Vec<String>> {
        let url = self.model_url(model, "generateContent");
        debug!(backend = %self.name, model = %model, "Sending generateContent request");

        let response: GenerateContentResponse = self.post_vertex(&url, request).await?;
        extract_texts(response)
    }
}

fn build_client(timeout_ms: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, turning Google error envelopes into
/// `AppError::Backend` carrying the provider's message
async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> Result<R> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(AppError::Backend(format!("{} {}", status.as_u16(), message)));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| AppError::Backend(format!("Failed to parse response: {}", e)))
}

/// Texts of the final candidate; an unanswered prompt with a policy block
/// reason becomes a structured block
fn extract_texts(response: GenerateContentResponse) -> Result<Vec<String>> {
    if response.candidates.is_empty() {
        if let Some(PromptFeedback {
            block_reason: Some(code),
            block_reason_message,
        }) = response.prompt_feedback
        {
            let message = block_reason_message.unwrap_or_else(|| code.clone());
            if POLICY_BLOCK_REASONS.contains(&code.as_str()) {
                return Err(AppError::ContentBlocked {
                    violation: PolicyViolation::ResponsibleAi,
                    message,
                });
            }
            return Err(AppError::Backend(format!("Prompt blocked: {}", message)));
        }
    }

    Ok(response
        .candidates
        .into_iter()
        .last()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default())
}

async fn read_image(image: &ImageRef) -> Result<String> {
    let data = fs::read(&image.path).await?;
    Ok(base64::encode(&data))
}

#[async_trait]
impl GenerationGateway for VertexBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_text(&self, prompt: &str) -> Result<Vec<String>> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart::Text {
                    text: prompt.to_string(),
                }],
            }],
        };

        self.generate_content(&self.text_model, &request).await
    }

    async fn caption_image(&self, image: &ImageRef) -> Result<Vec<String>> {
        let request = PredictRequest {
            instances: vec![CaptionInstance {
                image: EncodedImage {
                    bytes_base64_encoded: read_image(image).await?,
                },
            }],
            parameters: CaptionParameters {
                sample_count: self.caption_count,
                language: &self.caption_language,
            },
        };

        let url = self.model_url(&self.caption_model, "predict");
        debug!(backend = %self.name, model = %self.caption_model, "Sending caption request");

        let response: CaptionResponse = self.post_vertex(&url, &request).await?;
        Ok(response.predictions)
    }

    async fn generate_text_from_image(&self, prompt: &str, image: &ImageRef) -> Result<Vec<String>> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Text {
                        text: prompt.to_string(),
                    },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: read_image(image).await?,
                        },
                    },
                ],
            }],
        };

        match &self.api_key {
            Some(api_key) => {
                let url = format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.gemini_base, self.vision_model
                );
                debug!(backend = %self.name, model = %self.vision_model, "Sending Gemini API request");

                let response: GenerateContentResponse = send_json(
                    self.client
                        .post(&url)
                        .header("x-goog-api-key", api_key)
                        .json(&request),
                )
                .await?;
                extract_texts(response)
            }
            None => self.generate_content(&self.vision_model, &request).await,
        }
    }

    async fn generate_images(&self, params: &ImageGenParams) -> Result<Vec<Vec<u8>>> {
        let request = PredictRequest {
            instances: vec![ImageInstance {
                prompt: &params.prompt,
            }],
            parameters: ImageParameters {
                sample_count: params.count,
                aspect_ratio: &params.aspect_ratio,
                safety_setting: &params.safety_level,
                person_generation: &params.person_policy,
                include_rai_reason: true,
            },
        };

        let url = self.model_url(&self.image_model, "predict");
        debug!(
            backend = %self.name,
            model = %self.image_model,
            count = params.count,
            aspect_ratio = %params.aspect_ratio,
            "Sending image generation request"
        );

        let response: ImageResponse = self.post_vertex(&url, &request).await?;

        let mut images = Vec::with_capacity(response.predictions.len());
        let mut filtered_reason = None;
        for prediction in response.predictions {
            match (prediction.bytes_base64_encoded, prediction.rai_filtered_reason) {
                (Some(encoded), _) => images.push(base64::decode(&encoded)?),
                (None, Some(reason)) => filtered_reason = Some(reason),
                (None, None) => {}
            }
        }

        // Everything filtered: surface the reason so it can be classified
        if images.is_empty() {
            if let Some(reason) = filtered_reason {
                return Err(AppError::Backend(reason));
            }
        }

        Ok(images)
    }
}
