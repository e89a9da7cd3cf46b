//! Input schema validation for the content form.
//!
//! Runs before anything leaves the process: an invalid submission or edit
//! never reaches the sanitizer, the media host or the database.

use crate::media::ImageUpload;

const DEFAULT_CONTENT_MAX_CHARS: usize = 2000;
const DEFAULT_IMAGE_MAX_BYTES: usize = 10 * 1024 * 1024;

const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter some content.")]
    EmptyContent,
    #[error("content is too long ({actual} characters, max {max})")]
    ContentTooLong { max: usize, actual: usize },
    #[error("image is empty")]
    EmptyImage,
    #[error("image is too large ({actual} bytes, max {max})")]
    ImageTooLarge { max: usize, actual: usize },
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),
    #[error("malformed form: {0}")]
    Malformed(String),
}

impl crate::frame::ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "E_EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "E_CONTENT_TOO_LONG",
            Self::EmptyImage => "E_EMPTY_IMAGE",
            Self::ImageTooLarge { .. } => "E_IMAGE_TOO_LARGE",
            Self::UnsupportedImageType(_) => "E_UNSUPPORTED_IMAGE_TYPE",
            Self::Malformed(_) => "E_MALFORMED_FORM",
        }
    }
}

/// Size limits applied to every form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    pub max_chars: usize,
    pub max_image_bytes: usize,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self { max_chars: DEFAULT_CONTENT_MAX_CHARS, max_image_bytes: DEFAULT_IMAGE_MAX_BYTES }
    }
}

impl FormLimits {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_chars: crate::env_parse("CONTENT_MAX_CHARS", DEFAULT_CONTENT_MAX_CHARS),
            max_image_bytes: crate::env_parse("IMAGE_MAX_BYTES", DEFAULT_IMAGE_MAX_BYTES),
        }
    }
}

/// A form as received from the client, before validation.
#[derive(Debug, Default)]
pub struct ContentForm {
    pub content: String,
    pub image: Option<ImageUpload>,
}

/// A form that passed validation. `text` is trimmed and non-empty.
#[derive(Debug)]
pub struct ValidForm {
    pub text: String,
    pub image: Option<ImageUpload>,
}

/// Validate the text field: trimmed, non-empty, within the character limit.
///
/// # Errors
///
/// Returns `EmptyContent` for blank input and `ContentTooLong` past the limit.
pub fn validate_text(raw: &str, limits: FormLimits) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let actual = text.chars().count();
    if actual > limits.max_chars {
        return Err(ValidationError::ContentTooLong { max: limits.max_chars, actual });
    }
    Ok(text.to_string())
}

/// Validate an optional attached image.
///
/// # Errors
///
/// Returns an error for empty, oversized, or non-image uploads.
pub fn validate_image(image: &ImageUpload, limits: FormLimits) -> Result<(), ValidationError> {
    if image.bytes.is_empty() {
        return Err(ValidationError::EmptyImage);
    }
    if image.bytes.len() > limits.max_image_bytes {
        return Err(ValidationError::ImageTooLarge { max: limits.max_image_bytes, actual: image.bytes.len() });
    }
    let content_type = image.content_type.to_ascii_lowercase();
    if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(ValidationError::UnsupportedImageType(image.content_type.clone()));
    }
    Ok(())
}

/// Validate a whole form.
///
/// # Errors
///
/// Returns the first validation failure, text first.
pub fn validate_form(form: ContentForm, limits: FormLimits) -> Result<ValidForm, ValidationError> {
    let text = validate_text(&form.content, limits)?;
    if let Some(image) = &form.image {
        validate_image(image, limits)?;
    }
    Ok(ValidForm { text, image: form.image })
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
