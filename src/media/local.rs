//! Local-directory media store.
//!
//! Files are written under one directory with generated names and served by
//! the HTTP layer at [`PUBLIC_PREFIX`]. The stored `path` is the bare file
//! name; anything with a separator is rejected on delete.

use std::path::PathBuf;

use tracing::info;
use uuid::Uuid;

use super::{DeleteOutcome, ImageUpload, MediaError, MediaStore, StoredImage};

/// URL prefix the router mounts the media directory under.
pub const PUBLIC_PREFIX: &str = "/media";

pub struct LocalMediaStore {
    dir: PathBuf,
}

impl LocalMediaStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Accept only the bare names this store generates.
fn checked_name(path: &str) -> Result<&str, MediaError> {
    let ok = !path.is_empty()
        && path != "."
        && path != ".."
        && !path.contains(['/', '\\'])
        && !path.starts_with('.');
    if ok { Ok(path) } else { Err(MediaError::InvalidReference(path.to_string())) }
}

#[async_trait::async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, MediaError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension_for(&image.content_type));
        tokio::fs::write(self.dir.join(&name), &image.bytes).await?;
        info!(%name, bytes = image.bytes.len(), "local media: image stored");
        Ok(StoredImage { url: format!("{PUBLIC_PREFIX}/{name}"), path: name })
    }

    async fn delete(&self, path: &str) -> Result<DeleteOutcome, MediaError> {
        let name = checked_name(path)?;
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => {
                info!(%name, "local media: image removed");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
