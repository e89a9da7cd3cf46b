//! Form service — submit, edit and delete flows.
//!
//! DESIGN
//! ======
//! Each flow awaits its remote calls one after another and stops at the
//! first failure. Nothing is persisted until sanitization has succeeded,
//! and every committed mutation ends with a feed publish.
//!
//! IMAGE POLICY
//! ============
//! - A record's image is deleted before the record itself. If that delete
//!   fails the record is kept and the error surfaced.
//! - A replaced image is deleted after the update commits. The image to
//!   delete is the one the store reports displacing, not the one read at
//!   the start of the edit. Failure there is logged only.
//! - An upload whose record write then fails is deleted best-effort.

use tracing::{info, warn};
use uuid::Uuid;

use super::content::{ContentError, ContentRecord, ContentUpdate, NewContent};
use super::sanitize::{self, SanitizeError};
use crate::frame::ErrorCode;
use crate::media::{MediaError, MediaStore, StoredImage};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;
use crate::validation::{ContentForm, ValidationError, validate_form};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error("sanitizer not configured")]
    SanitizerNotConfigured,
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
    #[error("media store not configured")]
    MediaNotConfigured,
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl ErrorCode for FormError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::RateLimit(e) => e.error_code(),
            Self::SanitizerNotConfigured => "E_SANITIZER_NOT_CONFIGURED",
            Self::Sanitize(e) => e.error_code(),
            Self::MediaNotConfigured => "E_MEDIA_NOT_CONFIGURED",
            Self::Media(e) => e.error_code(),
            Self::Content(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Validation(e) => e.retryable(),
            Self::RateLimit(e) => e.retryable(),
            Self::Sanitize(e) => e.retryable(),
            Self::Media(e) => e.retryable(),
            Self::Content(e) => e.retryable(),
            Self::SanitizerNotConfigured | Self::MediaNotConfigured => false,
        }
    }
}

// =============================================================================
// FLOWS
// =============================================================================

/// Validate, sanitize, upload and store a new record, then publish the list.
///
/// # Errors
///
/// Returns the first failing step. No record exists when this fails.
pub async fn submit(state: &AppState, client: &str, form: ContentForm) -> Result<ContentRecord, FormError> {
    let valid = validate_form(form, state.limits)?;
    let media = media_for(state, valid.image.is_some())?;

    state.rate_limiter.check_and_record(client)?;
    let text = sanitize_text(state, &valid.text).await?;

    let uploaded = match (media, &valid.image) {
        (Some(media), Some(image)) => Some(media.upload(image).await?),
        _ => None,
    };

    let record = match state.store.create(NewContent { text, image: uploaded.clone() }).await {
        Ok(record) => record,
        Err(e) => {
            discard_upload(media, uploaded.as_ref()).await;
            return Err(e.into());
        }
    };

    info!(id = %record.id, %client, has_image = record.image_url.is_some(), "form: submitted");
    state.feed.publish_after_commit(state.store.as_ref()).await;
    Ok(record)
}

/// Replace a record's text, and its image when a new one is supplied.
///
/// # Errors
///
/// Returns the first failing step. The record is unchanged when this fails.
pub async fn edit(state: &AppState, client: &str, id: Uuid, form: ContentForm) -> Result<ContentRecord, FormError> {
    // PHASE: everything local runs before the store is touched.
    let valid = validate_form(form, state.limits)?;
    let media = media_for(state, valid.image.is_some())?;

    // Not-found surfaces before any quota or upload is spent.
    state.store.get(id).await?;

    state.rate_limiter.check_and_record(client)?;
    let text = sanitize_text(state, &valid.text).await?;

    let uploaded = match (media, &valid.image) {
        (Some(media), Some(image)) => Some(media.upload(image).await?),
        _ => None,
    };

    let ContentUpdate { record, replaced } = match state.store.update(id, &text, uploaded.clone()).await {
        Ok(update) => update,
        Err(e) => {
            discard_upload(media, uploaded.as_ref()).await;
            return Err(e.into());
        }
    };

    info!(%id, %client, replaced_image = uploaded.is_some(), "form: edited");
    state.feed.publish_after_commit(state.store.as_ref()).await;

    // The store reports what this write displaced, so a concurrent edit's
    // image is never mistaken for ours.
    if let (Some(media), Some(old)) = (media, replaced) {
        if let Err(e) = media.delete(&old.path).await {
            warn!(%id, path = %old.path, error = %e, "form: replaced image not deleted");
        }
    }

    Ok(record)
}

/// Delete a record and the image it owns.
///
/// # Errors
///
/// Returns an error if the record is missing, the image cannot be deleted,
/// or the record delete fails.
pub async fn delete(state: &AppState, id: Uuid) -> Result<(), FormError> {
    let existing = state.store.get(id).await?;

    if let Some(image) = existing.image() {
        let media = state.media.as_deref().ok_or(FormError::MediaNotConfigured)?;
        let outcome = media.delete(&image.path).await?;
        info!(%id, path = %image.path, ?outcome, "form: image deleted");
    }

    state.store.delete(id).await?;
    info!(%id, "form: deleted");
    state.feed.publish_after_commit(state.store.as_ref()).await;
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

/// The media store, required only when an image is involved.
fn media_for(state: &AppState, needed: bool) -> Result<Option<&dyn MediaStore>, FormError> {
    if !needed {
        return Ok(None);
    }
    state
        .media
        .as_deref()
        .map(Some)
        .ok_or(FormError::MediaNotConfigured)
}

async fn sanitize_text(state: &AppState, text: &str) -> Result<String, FormError> {
    let llm = state.llm.as_deref().ok_or(FormError::SanitizerNotConfigured)?;
    Ok(sanitize::sanitize(llm, state.sanitize, text).await?)
}

async fn discard_upload(media: Option<&dyn MediaStore>, uploaded: Option<&StoredImage>) {
    let (Some(media), Some(image)) = (media, uploaded) else {
        return;
    };
    if let Err(e) = media.delete(&image.path).await {
        warn!(path = %image.path, error = %e, "form: orphaned upload not deleted");
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
