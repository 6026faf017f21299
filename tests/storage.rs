use std::sync::{Arc, Mutex};

use anyhow::Result;
use platform_api::ApiError;
use platform_client::{ProgressCallback, UPLOAD_CHUNK_BYTES, UploadProgress};
use products_crm::DEFAULT_ASSETS_BUCKET;
use serde_json::json;
use suite_tests::MockBackend;
use uuid::Uuid;

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<UploadProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |progress: UploadProgress| {
        sink.lock().unwrap().push(progress);
    });
    (callback, seen)
}

#[tokio::test]
async fn upload_reports_progress_and_serves_publicly() -> Result<()> {
    let backend = MockBackend::start().await;
    let crm = backend.crm();
    let folder = crm.assets.create_folder("Brand", None).await?;

    let bytes: Vec<u8> = (0..200 * 1024).map(|i| (i % 251) as u8).collect();
    let (callback, seen) = recorder();
    let asset = crm
        .assets
        .upload(Some(folder.id), "logo.png", "image/png", bytes.clone(), Some(callback))
        .await?;

    assert_eq!(asset.folder_id, Some(folder.id));
    assert_eq!(asset.size_bytes, bytes.len() as u64);
    assert!(asset.storage_path.starts_with(&format!("{}/", folder.id)));
    assert!(asset.storage_path.ends_with("-logo.png"));

    let progress = seen.lock().unwrap().clone();
    assert_eq!(progress.len(), bytes.len().div_ceil(UPLOAD_CHUNK_BYTES));
    assert!(progress.windows(2).all(|w| w[0].sent < w[1].sent));
    let last = progress.last().copied().expect("progress reported");
    assert_eq!(last.sent, last.total);
    assert_eq!(last.fraction(), 1.0);

    let stored = backend
        .object(DEFAULT_ASSETS_BUCKET, &asset.storage_path)
        .expect("object stored");
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(stored.bytes, bytes);

    let url = crm.assets.public_url(&asset)?;
    let served = reqwest::get(&url).await?.error_for_status()?.bytes().await?;
    assert_eq!(served.as_ref(), bytes.as_slice());

    let listed = crm.assets.assets_in(Some(folder.id)).await?;
    assert_eq!(listed, vec![asset]);
    assert!(crm.assets.assets_in(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn root_uploads_and_single_delete() -> Result<()> {
    let backend = MockBackend::start().await;
    let crm = backend.crm();
    let asset = crm
        .assets
        .upload(None, "notes.txt", "text/plain", b"hello".to_vec(), None)
        .await?;
    assert!(asset.storage_path.starts_with("root/"));
    assert_eq!(backend.object_count(DEFAULT_ASSETS_BUCKET), 1);

    crm.assets.delete_asset(asset.id).await?;
    assert_eq!(backend.object_count(DEFAULT_ASSETS_BUCKET), 0);
    assert!(backend.rows("assets").is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_record_insert_removes_the_uploaded_object() -> Result<()> {
    let backend = MockBackend::start().await;
    // The stored row comes back malformed, so recording the asset fails.
    backend.set_defaults("assets", json!({ "created_at": "yesterday" }));
    let crm = backend.crm();
    let result = crm
        .assets
        .upload(None, "broken.bin", "application/octet-stream", vec![1, 2, 3], None)
        .await;
    assert!(result.is_err());
    assert_eq!(backend.object_count(DEFAULT_ASSETS_BUCKET), 0);
    Ok(())
}

#[tokio::test]
async fn delete_folder_removes_files_and_rows() -> Result<()> {
    let backend = MockBackend::start().await;
    let crm = backend.crm();
    let doomed = crm.assets.create_folder("Old campaign", None).await?;
    let kept = crm.assets.create_folder("Current", None).await?;
    for name in ["a.png", "b.png"] {
        crm.assets
            .upload(Some(doomed.id), name, "image/png", vec![0; 16], None)
            .await?;
    }
    let survivor = crm
        .assets
        .upload(Some(kept.id), "c.png", "image/png", vec![0; 16], None)
        .await?;

    let deleted = crm.assets.delete_folder(doomed.id).await?;
    assert_eq!(deleted.id, doomed.id);
    assert_eq!(backend.object_count(DEFAULT_ASSETS_BUCKET), 1);
    assert!(backend.object(DEFAULT_ASSETS_BUCKET, &survivor.storage_path).is_some());
    assert_eq!(backend.rows("assets").len(), 1);
    let folders = crm.assets.folders(None).await?;
    assert_eq!(folders, vec![kept]);
    Ok(())
}

#[tokio::test]
async fn folder_with_subfolders_is_not_deleted() -> Result<()> {
    let backend = MockBackend::start().await;
    let crm = backend.crm();
    let parent = crm.assets.create_folder("Events", None).await?;
    let child = crm.assets.create_folder("2026", Some(parent.id)).await?;
    crm.assets
        .upload(Some(parent.id), "poster.pdf", "application/pdf", vec![7; 8], None)
        .await?;

    let err = crm.assets.delete_folder(parent.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(ref msg) if msg.contains("subfolder")));
    assert_eq!(backend.object_count(DEFAULT_ASSETS_BUCKET), 1);
    assert_eq!(crm.assets.folders(Some(parent.id)).await?, vec![child]);

    let missing = crm.assets.delete_folder(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, ApiError::NotFound));
    Ok(())
}

#[tokio::test]
async fn contact_attachments_upload_and_remove() -> Result<()> {
    let backend = MockBackend::start().await;
    let crm = backend.crm();
    let contact_id = Uuid::new_v4();

    let attachment = crm
        .attachments
        .upload(contact_id, "contract.pdf", "application/pdf", vec![9; 1024], None)
        .await?;
    assert!(attachment.storage_path.starts_with(&contact_id.to_string()));
    assert_eq!(crm.attachments.list(contact_id).await?, vec![attachment.clone()]);
    assert!(crm.attachments.list(Uuid::new_v4()).await?.is_empty());

    let bucket = products_crm::DEFAULT_ATTACHMENTS_BUCKET;
    assert!(backend.object(bucket, &attachment.storage_path).is_some());

    crm.attachments.remove(attachment.id).await?;
    assert_eq!(backend.object_count(bucket), 0);
    assert!(crm.attachments.list(contact_id).await?.is_empty());
    Ok(())
}
