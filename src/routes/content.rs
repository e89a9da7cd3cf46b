//! Content REST routes.
//!
//! Create and update take `multipart/form-data` with a `content` text field
//! and an optional `image` file field. Every error body is
//! `{code, message, retryable}`, the same shape websocket error frames use.

use std::net::SocketAddr;

use axum::extract::multipart::MultipartError;
use axum::extract::{ConnectInfo, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::warn;
use uuid::Uuid;

use crate::frame::{ErrorCode, error_data};
use crate::media::ImageUpload;
use crate::services::content::{ContentError, ContentRecord};
use crate::services::form::{self, FormError};
use crate::state::AppState;
use crate::validation::{ContentForm, ValidationError};

const FIELD_CONTENT: &str = "content";
const FIELD_IMAGE: &str = "image";

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error response carrying a status plus the structured error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: crate::frame::Data,
}

impl ApiError {
    fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, body: error_data(err) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        let status = form_error_to_status(&err);
        if status.is_server_error() {
            warn!(error = %err, code = err.error_code(), "content request failed");
        }
        Self::new(status, &err)
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        FormError::from(err).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        FormError::from(err).into()
    }
}

pub(crate) fn validation_error_to_status(err: &ValidationError) -> StatusCode {
    match err {
        ValidationError::ContentTooLong { .. } | ValidationError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ValidationError::EmptyContent
        | ValidationError::EmptyImage
        | ValidationError::UnsupportedImageType(_)
        | ValidationError::Malformed(_) => StatusCode::BAD_REQUEST,
    }
}

pub(crate) fn form_error_to_status(err: &FormError) -> StatusCode {
    match err {
        FormError::Validation(e) => validation_error_to_status(e),
        FormError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
        FormError::Sanitize(_) | FormError::Media(_) => StatusCode::BAD_GATEWAY,
        FormError::SanitizerNotConfigured | FormError::MediaNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        FormError::Content(ContentError::NotFound(_)) => StatusCode::NOT_FOUND,
        FormError::Content(ContentError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// MULTIPART
// =============================================================================

/// Body-level multipart failure (bad encoding or body over the size limit).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MultipartRejected(MultipartError);

impl ErrorCode for MultipartRejected {
    fn error_code(&self) -> &'static str {
        if self.0.status() == StatusCode::PAYLOAD_TOO_LARGE { "E_BODY_TOO_LARGE" } else { "E_MALFORMED_FORM" }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        Self::new(status, &MultipartRejected(err))
    }
}

/// Read the `content` and `image` fields. An image part with no file name
/// and no bytes is what browsers send for an empty picker; it means "none".
pub(crate) async fn read_form(mut multipart: Multipart) -> Result<ContentForm, ApiError> {
    let mut form = ContentForm::default();
    let mut saw_content = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_CONTENT => {
                form.content = field.text().await?;
                saw_content = true;
            }
            FIELD_IMAGE => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?.to_vec();
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.image = Some(ImageUpload { file_name, content_type, bytes });
            }
            other => {
                return Err(ValidationError::Malformed(format!("unexpected field '{other}'")).into());
            }
        }
    }

    if !saw_content {
        return Err(ValidationError::Malformed(format!("missing field '{FIELD_CONTENT}'")).into());
    }
    Ok(form)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/content` — all records, newest first.
pub async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<ContentRecord>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// `POST /api/content` — submit a new record.
pub async fn create_content(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ContentRecord>), ApiError> {
    let form = read_form(multipart).await?;
    let record = form::submit(&state, &addr.ip().to_string(), form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/content/:id` — fetch one record.
pub async fn get_content(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ContentRecord>, ApiError> {
    Ok(Json(state.store.get(id).await?))
}

/// `PATCH /api/content/:id` — edit text and optionally replace the image.
pub async fn update_content(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ContentRecord>, ApiError> {
    let form = read_form(multipart).await?;
    let record = form::edit(&state, &addr.ip().to_string(), id, form).await?;
    Ok(Json(record))
}

/// `DELETE /api/content/:id` — delete a record and its image.
pub async fn delete_content(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    form::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
