//! Jenna API
//!
//! HTTP front end that validates user prompts and uploads, forwards them to
//! Vertex AI text, captioning and image models, and relays the results as a
//! single success, warning or error outcome.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod response;
pub mod storage;

pub use error::{AppError, Result};

use std::sync::Arc;

use pipeline::ContentService;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub service: Arc<ContentService>,
}
