//! Media — image upload and deletion against a hosted or local media store.
//!
//! DESIGN
//! ======
//! `MediaStore` is the seam between the form flow and the media host. Two
//! providers ship, selected by `MEDIA_PROVIDER`:
//! - `cloudinary`: unsigned preset upload, signed destroy.
//! - `local`: files on disk under `MEDIA_DIR`, served back at `/media`.
//!
//! Every upload returns a `StoredImage` carrying both the public URL and the
//! identifier needed to delete it later. Deleting something that is already
//! gone is success, never an error.

pub mod cloudinary;
pub mod config;
pub mod local;

use std::sync::Arc;

use config::{MediaConfig, MediaProviderKind};

// =============================================================================
// TYPES
// =============================================================================

/// An image received from the client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Reference to an image held by the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public URL the browser loads.
    pub url: String,
    /// Identifier passed back to [`MediaStore::delete`].
    pub path: String,
}

/// How a delete request ended. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("config parse failed: {0}")]
    ConfigParse(String),
    #[error("missing media config: env var {var} not set")]
    MissingConfig { var: String },
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
    #[error("media request failed: {0}")]
    Request(String),
    #[error("media host error: status {status}")]
    Response { status: u16, body: String },
    #[error("media response parse failed: {0}")]
    Parse(String),
    #[error("media host refused deletion: {0}")]
    DeleteRejected(String),
    #[error("invalid image reference: {0}")]
    InvalidReference(String),
    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::frame::ErrorCode for MediaError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingConfig { .. } => "E_MISSING_MEDIA_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_MEDIA_REQUEST",
            Self::Response { .. } => "E_MEDIA_RESPONSE",
            Self::Parse(_) => "E_MEDIA_PARSE",
            Self::DeleteRejected(_) => "E_MEDIA_DELETE_REJECTED",
            Self::InvalidReference(_) => "E_INVALID_IMAGE_REFERENCE",
            Self::Io(_) => "E_MEDIA_IO",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// MEDIA STORE TRAIT
// =============================================================================

/// Upload and delete images. Enables mocking in tests.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image and return its reference.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] if the media host rejects or never receives the file.
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError>;

    /// Remove a previously stored image by its `path` identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] for any failure other than "already absent".
    async fn delete(&self, path: &str) -> Result<DeleteOutcome, MediaError>;
}

/// Build a media store from a parsed typed config.
///
/// # Errors
///
/// Returns an error if the provider HTTP client fails to build.
pub fn from_config(config: MediaConfig) -> Result<Arc<dyn MediaStore>, MediaError> {
    let store: Arc<dyn MediaStore> = match config.provider {
        MediaProviderKind::Cloudinary(settings) => {
            Arc::new(cloudinary::CloudinaryClient::new(settings, config.request_timeout_secs)?)
        }
        MediaProviderKind::Local { dir } => Arc::new(local::LocalMediaStore::new(dir)),
    };
    Ok(store)
}
