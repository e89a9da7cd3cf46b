//! Cloudinary image API client.
//!
//! Uploads go through an unsigned upload preset (multipart form post).
//! Deletions use the signed `destroy` endpoint: parameters are sorted,
//! joined as `k=v&k=v`, suffixed with the API secret and hashed with
//! SHA-256. Pure signing and parsing helpers are split out for tests.

use std::fmt::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::multipart::{Form, Part};
use sha2::{Digest, Sha256};
use tracing::info;

use super::config::CloudinarySettings;
use super::{DeleteOutcome, ImageUpload, MediaError, MediaStore, StoredImage};

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct CloudinaryClient {
    http: reqwest::Client,
    settings: CloudinarySettings,
}

impl CloudinaryClient {
    pub fn new(settings: CloudinarySettings, request_timeout_secs: u64) -> Result<Self, MediaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| MediaError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{action}", self.settings.base_url, self.settings.cloud_name)
    }

    async fn post(&self, request: reqwest::RequestBuilder) -> Result<String, MediaError> {
        let response = request
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;
        if status != 200 {
            return Err(MediaError::Response { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| MediaError::Request(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone());

        let body = self
            .post(self.http.post(self.endpoint("upload")).multipart(form))
            .await?;
        let stored = parse_upload_response(&body)?;
        info!(public_id = %stored.path, bytes = image.bytes.len(), "cloudinary: image uploaded");
        Ok(stored)
    }

    async fn delete(&self, path: &str) -> Result<DeleteOutcome, MediaError> {
        let timestamp = unix_seconds().to_string();
        let signature = sign_params(
            &[("public_id", path), ("timestamp", timestamp.as_str())],
            &self.settings.api_secret,
        );
        let params = [
            ("public_id", path),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.settings.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let body = self
            .post(self.http.post(self.endpoint("destroy")).form(&params[..]))
            .await?;
        let outcome = parse_destroy_response(&body)?;
        info!(public_id = %path, ?outcome, "cloudinary: image destroyed");
        Ok(outcome)
    }
}

// =============================================================================
// SIGNING
// =============================================================================

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Sign request parameters the way the Cloudinary API expects.
pub(crate) fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(serde::Deserialize)]
struct DestroyResponse {
    result: String,
}

pub(crate) fn parse_upload_response(json: &str) -> Result<StoredImage, MediaError> {
    let api: UploadResponse = serde_json::from_str(json).map_err(|e| MediaError::Parse(e.to_string()))?;
    Ok(StoredImage { url: api.secure_url, path: api.public_id })
}

pub(crate) fn parse_destroy_response(json: &str) -> Result<DeleteOutcome, MediaError> {
    let api: DestroyResponse = serde_json::from_str(json).map_err(|e| MediaError::Parse(e.to_string()))?;
    match api.result.as_str() {
        "ok" => Ok(DeleteOutcome::Deleted),
        "not found" => Ok(DeleteOutcome::AlreadyAbsent),
        _ => Err(MediaError::DeleteRejected(api.result)),
    }
}

#[cfg(test)]
#[path = "cloudinary_test.rs"]
mod tests;
