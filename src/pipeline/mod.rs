//! Validation, prompt composition and orchestration of generation requests

pub mod prompt;
pub mod request;
pub mod service;
pub mod validator;

pub use prompt::{ArtStyle, ContentKind, Orientation, PromptComposer};
pub use request::{GenerationRequest, ImageGenRequest, TextRequest};
pub use service::ContentService;
pub use validator::{InputValidator, UploadedImage};
