//! Backend module - capability trait, Vertex AI client and credentials

pub mod auth;
pub mod traits;
pub mod vertex;

pub use traits::{GenerationGateway, ImageGenParams, ImageRef};
pub use vertex::VertexBackend;
