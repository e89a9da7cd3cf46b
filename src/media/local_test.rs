use super::*;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("formflow-media-{}", Uuid::new_v4()))
}

fn jpeg() -> ImageUpload {
    ImageUpload { file_name: "photo.jpg".into(), content_type: "image/jpeg".into(), bytes: vec![0xff, 0xd8, 0xff] }
}

#[tokio::test]
async fn upload_writes_file_and_returns_public_url() {
    let dir = scratch_dir();
    let store = LocalMediaStore::new(dir.clone());

    let stored = store.upload(&jpeg()).await.unwrap();
    assert!(stored.path.ends_with(".jpg"));
    assert_eq!(stored.url, format!("/media/{}", stored.path));

    let on_disk = tokio::fs::read(dir.join(&stored.path)).await.unwrap();
    assert_eq!(on_disk, vec![0xff, 0xd8, 0xff]);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn delete_removes_file_then_reports_absent() {
    let dir = scratch_dir();
    let store = LocalMediaStore::new(dir.clone());
    let stored = store.upload(&jpeg()).await.unwrap();

    assert_eq!(store.delete(&stored.path).await.unwrap(), DeleteOutcome::Deleted);
    assert!(!dir.join(&stored.path).exists());
    assert_eq!(store.delete(&stored.path).await.unwrap(), DeleteOutcome::AlreadyAbsent);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn delete_rejects_path_traversal() {
    let store = LocalMediaStore::new(scratch_dir());
    for bad in ["../etc/passwd", "a/b.png", "..", "", ".hidden", "a\\b.png"] {
        let err = store.delete(bad).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidReference(_)), "{bad} should be rejected");
    }
}

#[test]
fn extension_mapping() {
    assert_eq!(extension_for("image/png"), "png");
    assert_eq!(extension_for("IMAGE/WEBP"), "webp");
    assert_eq!(extension_for("application/octet-stream"), "bin");
}
