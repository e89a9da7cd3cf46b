//! Media configuration parsed from environment variables.

use std::path::PathBuf;

use super::MediaError;

pub const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_MEDIA_DIR: &str = "./media";
pub const DEFAULT_MEDIA_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinarySettings {
    pub base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaProviderKind {
    Cloudinary(CloudinarySettings),
    Local { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub provider: MediaProviderKind,
    pub request_timeout_secs: u64,
}

impl MediaConfig {
    /// Build typed media config from environment variables.
    ///
    /// Returns `Ok(None)` when `MEDIA_PROVIDER` is unset, which disables
    /// image attachments.
    ///
    /// - `MEDIA_PROVIDER`: `cloudinary` or `local`
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_UPLOAD_PRESET`,
    ///   `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`: required for cloudinary
    /// - `CLOUDINARY_BASE_URL`: default Cloudinary API root
    /// - `MEDIA_DIR`: default `./media`, local provider only
    /// - `MEDIA_REQUEST_TIMEOUT_SECS`: default 60
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown provider or a missing required variable.
    pub fn from_env() -> Result<Option<Self>, MediaError> {
        let Ok(raw) = std::env::var("MEDIA_PROVIDER") else {
            return Ok(None);
        };
        let provider = match raw.trim() {
            "" => return Ok(None),
            "cloudinary" => MediaProviderKind::Cloudinary(CloudinarySettings {
                base_url: std::env::var("CLOUDINARY_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_CLOUDINARY_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                upload_preset: required("CLOUDINARY_UPLOAD_PRESET")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            }),
            "local" => MediaProviderKind::Local {
                dir: std::env::var("MEDIA_DIR")
                    .map_or_else(|_| PathBuf::from(DEFAULT_MEDIA_DIR), PathBuf::from),
            },
            other => return Err(MediaError::ConfigParse(format!("unknown MEDIA_PROVIDER: {other}"))),
        };
        let request_timeout_secs = crate::env_parse("MEDIA_REQUEST_TIMEOUT_SECS", DEFAULT_MEDIA_REQUEST_TIMEOUT_SECS);
        Ok(Some(Self { provider, request_timeout_secs }))
    }
}

fn required(var: &str) -> Result<String, MediaError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MediaError::MissingConfig { var: var.to_string() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
