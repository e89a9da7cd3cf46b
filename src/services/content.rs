//! Content service — persistence of content records.
//!
//! DESIGN
//! ======
//! `ContentStore` is the seam between the form flow and the database. The
//! Postgres implementation is the only production store; tests substitute
//! an in-memory one. Listing is always newest first.
//!
//! An image reference is stored as a (`image_url`, `image_path`) pair. Both
//! columns are written together so they are either both set or both null.

use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::media::StoredImage;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for ContentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_CONTENT_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)))
    }
}

/// One saved content item. Mirrors the `content` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: Uuid,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ContentRecord {
    /// The stored image reference, if the record owns one.
    #[must_use]
    pub fn image(&self) -> Option<StoredImage> {
        match (&self.image_url, &self.image_path) {
            (Some(url), Some(path)) => Some(StoredImage { url: url.clone(), path: path.clone() }),
            _ => None,
        }
    }
}

/// Fields for a new record. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub text: String,
    pub image: Option<StoredImage>,
}

/// Outcome of an update: the row as written and the image it displaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub record: ContentRecord,
    /// The previous image, read under the same row lock as the write. `None`
    /// when no new image was supplied or the record had none.
    pub replaced: Option<StoredImage>,
}

// =============================================================================
// CONTENT STORE TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ContentRecord>, ContentError>;

    async fn get(&self, id: Uuid) -> Result<ContentRecord, ContentError>;

    async fn create(&self, new: NewContent) -> Result<ContentRecord, ContentError>;

    /// Replace the text and, when `image` is `Some`, the image reference.
    async fn update(&self, id: Uuid, text: &str, image: Option<StoredImage>) -> Result<ContentUpdate, ContentError>;

    async fn delete(&self, id: Uuid) -> Result<(), ContentError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

type ContentRow = (Uuid, String, Option<String>, Option<String>, OffsetDateTime, OffsetDateTime);

type UpdateRow = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    OffsetDateTime,
    OffsetDateTime,
    Option<String>,
    Option<String>,
);

const SELECT_COLUMNS: &str = "id, text, image_url, image_path, created_at, updated_at";

fn row_to_record((id, text, image_url, image_path, created_at, updated_at): ContentRow) -> ContentRecord {
    ContentRecord { id, text, image_url, image_path, created_at, updated_at }
}

pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn list(&self) -> Result<Vec<ContentRecord>, ContentError> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM content ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn get(&self, id: Uuid) -> Result<ContentRecord, ContentError> {
        let row = sqlx::query_as::<_, ContentRow>(&format!("SELECT {SELECT_COLUMNS} FROM content WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_record).ok_or(ContentError::NotFound(id))
    }

    async fn create(&self, new: NewContent) -> Result<ContentRecord, ContentError> {
        let (image_url, image_path) = new.image.map(|i| (i.url, i.path)).unzip();
        let row = sqlx::query_as::<_, ContentRow>(&format!(
            "INSERT INTO content (id, text, image_url, image_path)
             VALUES ($1, $2, $3, $4)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.text)
        .bind(image_url)
        .bind(image_path)
        .fetch_one(&self.pool)
        .await?;

        let record = row_to_record(row);
        info!(id = %record.id, has_image = record.image_url.is_some(), "content: created");
        Ok(record)
    }

    async fn update(&self, id: Uuid, text: &str, image: Option<StoredImage>) -> Result<ContentUpdate, ContentError> {
        let replace_image = image.is_some();
        let (image_url, image_path) = image.map(|i| (i.url, i.path)).unzip();
        // EDGE: `old` locks the row, so two concurrent image swaps each see
        // the image the other one wrote, never the same starting image.
        let row = sqlx::query_as::<_, UpdateRow>(
            "WITH old AS (
                 SELECT id, image_url, image_path FROM content WHERE id = $1 FOR UPDATE
             )
             UPDATE content c
             SET text = $2,
                 image_url = CASE WHEN $3 THEN $4 ELSE c.image_url END,
                 image_path = CASE WHEN $3 THEN $5 ELSE c.image_path END,
                 updated_at = now()
             FROM old
             WHERE c.id = old.id
             RETURNING c.id, c.text, c.image_url, c.image_path, c.created_at, c.updated_at,
                       old.image_url, old.image_path",
        )
        .bind(id)
        .bind(text)
        .bind(replace_image)
        .bind(image_url)
        .bind(image_path)
        .fetch_optional(&self.pool)
        .await?;

        let (id, text, image_url, image_path, created_at, updated_at, old_url, old_path) =
            row.ok_or(ContentError::NotFound(id))?;
        let record = row_to_record((id, text, image_url, image_path, created_at, updated_at));
        let replaced = match (replace_image, old_url, old_path) {
            (true, Some(url), Some(path)) => Some(StoredImage { url, path }),
            _ => None,
        };
        info!(%id, replace_image, had_image = replaced.is_some(), "content: updated");
        Ok(ContentUpdate { record, replaced })
    }

    async fn delete(&self, id: Uuid) -> Result<(), ContentError> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ContentError::NotFound(id));
        }
        info!(%id, "content: deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
