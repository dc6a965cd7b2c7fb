//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub vertex: VertexConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on JSON request bodies. Image uploads are streamed and
    /// not subject to it.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Scratch storage for uploaded images
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
}

fn default_scratch_dir() -> String {
    std::env::temp_dir().to_string_lossy().to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
        }
    }
}

/// Upload constraints applied before any remote call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpeg".to_string(), "jpg".to_string(), "png".to_string()]
}

fn default_max_size_bytes() -> usize {
    27_000_000
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

/// Prompt composition switches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    /// Append the bold-title instruction to text prompts
    #[serde(default = "default_true")]
    pub include_title: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_title: true,
        }
    }
}

/// Vertex AI / Gemini provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VertexConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_location")]
    pub location: String,
    /// Base64 encoded service account key JSON
    #[serde(default)]
    pub credentials_b64: String,
    /// Gemini API key; image+text requests use the Generative Language API when set
    #[serde(default)]
    pub api_key: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_caption_model")]
    pub caption_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_caption_count")]
    pub caption_count: u32,
    #[serde(default = "default_caption_language")]
    pub caption_language: String,
    #[serde(default = "default_image_count")]
    pub image_count: u32,
    #[serde(default = "default_safety_filter_level")]
    pub safety_filter_level: String,
    #[serde(default = "default_person_generation")]
    pub person_generation: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_text_model() -> String {
    "gemini-1.0-pro-vision".to_string()
}

fn default_vision_model() -> String {
    "gemini-pro-vision".to_string()
}

fn default_caption_model() -> String {
    "imagetext@001".to_string()
}

fn default_image_model() -> String {
    "imagegeneration@006".to_string()
}

fn default_caption_count() -> u32 {
    3
}

fn default_caption_language() -> String {
    "en".to_string()
}

fn default_image_count() -> u32 {
    4
}

fn default_safety_filter_level() -> String {
    "block_some".to_string()
}

fn default_person_generation() -> String {
    "allow_adult".to_string()
}

fn default_timeout() -> u64 {
    120000
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: default_location(),
            credentials_b64: String::new(),
            api_key: String::new(),
            endpoint: None,
            gemini_endpoint: default_gemini_endpoint(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            caption_model: default_caption_model(),
            image_model: default_image_model(),
            caption_count: default_caption_count(),
            caption_language: default_caption_language(),
            image_count: default_image_count(),
            safety_filter_level: default_safety_filter_level(),
            person_generation: default_person_generation(),
            timeout_ms: default_timeout(),
        }
    }
}

impl VertexConfig {
    /// Base URL of the regional Vertex AI endpoint
    pub fn vertex_base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Load from configuration file
            .add_source(File::from(path.as_ref()).required(false))
            // Override with environment variables (JENNA__SECTION__KEY)
            .add_source(
                Environment::with_prefix("JENNA")
                    .separator("__")
                    .try_parsing(true),
            )
            // Variable names the deployment has always used
            .set_override_option("vertex.credentials_b64", env_var("GCP_SA_KEY_STRING"))?
            .set_override_option("vertex.project_id", env_var("GCP_PROJECT_ID"))?
            .set_override_option("vertex.location", env_var("GCP_LOCATION"))?
            .set_override_option("vertex.api_key", env_var("GEMINI_API_KEY"))?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        if self.uploads.allowed_extensions.is_empty() {
            return Err(config_error("At least one upload extension must be allowed"));
        }

        if self.vertex.caption_count == 0 {
            return Err(config_error("vertex.caption_count must be at least 1"));
        }

        if self.vertex.image_count == 0 {
            return Err(config_error("vertex.image_count must be at least 1"));
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn config_error(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
