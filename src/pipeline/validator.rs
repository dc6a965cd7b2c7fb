//! Upload checks performed before any remote call

use crate::config::UploadConfig;

/// Fixed wording shown to users; the enforced limit is `max_size_bytes`.
pub const SIZE_WARNING: &str = "File size is too large. Choose a file of a size lower than 20 MB.";

/// An uploaded image as received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    /// Content type declared by the client
    pub content_type: Option<String>,
    pub size: usize,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        let size = bytes.len();
        Self {
            bytes,
            content_type,
            size,
        }
    }

    /// Lower-cased text after the last `/` of the declared content type.
    /// The file's bytes are not inspected.
    pub fn extension(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.rsplit('/').next())
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Canonical MIME type for the extension, independent of how the client
    /// spelled its content type ("image/jpg", "image/PNG").
    pub fn mime_type(&self) -> String {
        match self.extension().as_str() {
            "" | "jpg" | "jpeg" => "image/jpeg".to_string(),
            ext => format!("image/{}", ext),
        }
    }
}

/// Checks uploads against the configured extension and size limits
#[derive(Debug, Clone)]
pub struct InputValidator {
    allowed_extensions: Vec<String>,
    max_size_bytes: usize,
    extension_warning: String,
}

impl InputValidator {
    pub fn new(config: &UploadConfig) -> Self {
        let allowed_extensions: Vec<String> = config
            .allowed_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect();
        let extension_warning = format!(
            "Only images with extensions {} are allowed.",
            human_list(&allowed_extensions)
        );

        Self {
            allowed_extensions,
            max_size_bytes: config.max_size_bytes,
            extension_warning,
        }
    }

    pub fn extension_warning(&self) -> &str {
        &self.extension_warning
    }

    /// Run every check and collect one warning per failure. An empty result
    /// means the image may be sent on.
    pub fn validate_image(&self, image: &UploadedImage) -> Vec<String> {
        let mut warnings = Vec::new();

        let extension = image.extension();
        if !self.allowed_extensions.iter().any(|e| *e == extension) {
            warnings.push(self.extension_warning.clone());
        }

        if image.size >= self.max_size_bytes {
            warnings.push(SIZE_WARNING.to_string());
        }

        warnings
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

/// "a", "a and b", "a, b and c"
fn human_list(items: &[String]) -> String {
    match items.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}
