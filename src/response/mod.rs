//! Response handling module - outcome normalization and transport encoding

pub mod base64;
pub mod outcome;

pub use outcome::{
    classify_failure, normalize_captions, normalize_failure, normalize_images, normalize_text,
    GenerationOutcome, Payload,
};
