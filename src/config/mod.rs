//! Configuration module

pub mod settings;

pub use settings::{
    LoggingConfig, PromptConfig, ServerConfig, Settings, StorageConfig, UploadConfig,
    VertexConfig,
};
