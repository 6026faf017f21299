use entity::{
    Validate,
    asset::{self, Folder, FolderDraft},
};
use platform_api::{ApiError, ApiResult};
use platform_client::{BackendClient, Bucket, Direction, ProgressCallback, UploadOptions};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::service::CrudService;

const ROOT_PREFIX: &str = "root";

/// Media library: folders and file records in tables, bytes in a bucket.
#[derive(Clone)]
pub struct AssetLibrary {
    bucket: Bucket,
    folders: CrudService<Folder>,
    assets: CrudService<asset::Model>,
}

impl AssetLibrary {
    pub fn new(client: BackendClient, bucket: &str) -> Self {
        Self {
            bucket: client.storage(bucket),
            folders: CrudService::new(client.clone()),
            assets: CrudService::new(client),
        }
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<Uuid>) -> ApiResult<Folder> {
        let draft = FolderDraft {
            name: name.to_string(),
            parent_id,
        };
        self.folders.create(&draft).await
    }

    /// Direct children of `parent_id`, or top-level folders for `None`.
    pub async fn folders(&self, parent_id: Option<Uuid>) -> ApiResult<Vec<Folder>> {
        let query = match parent_id {
            Some(parent) => self.folders.query().eq("parent_id", parent),
            None => self.folders.query().is_null("parent_id"),
        };
        query.order("name", Direction::Asc).select().await
    }

    pub async fn assets_in(&self, folder_id: Option<Uuid>) -> ApiResult<Vec<asset::Model>> {
        let query = match folder_id {
            Some(folder) => self.assets.query().eq("folder_id", folder),
            None => self.assets.query().is_null("folder_id"),
        };
        query.order("created_at", Direction::Desc).select().await
    }

    #[instrument(name = "crm.assets.upload", skip(self, bytes, progress), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        folder_id: Option<Uuid>,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        progress: Option<ProgressCallback>,
    ) -> ApiResult<asset::Model> {
        let prefix = folder_id.map_or_else(|| ROOT_PREFIX.to_string(), |id| id.to_string());
        let draft = asset::Draft {
            folder_id,
            file_name: file_name.to_string(),
            storage_path: format!("{prefix}/{}-{file_name}", Uuid::new_v4()),
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as u64,
        };
        draft.validate()?;

        let mut options = UploadOptions::new(content_type);
        options.progress = progress;
        let stored = self.bucket.upload(&draft.storage_path, bytes, options).await?;

        match self.assets.create(&draft).await {
            Ok(record) => Ok(record),
            Err(err) => {
                if let Err(cleanup) = self.bucket.remove(&[stored.path.clone()]).await {
                    warn!(path = %stored.path, error = %cleanup, "failed to remove orphaned asset");
                }
                Err(err)
            }
        }
    }

    pub fn public_url(&self, asset: &asset::Model) -> ApiResult<String> {
        Ok(self.bucket.public_url(&asset.storage_path)?.to_string())
    }

    pub async fn delete_asset(&self, asset_id: Uuid) -> ApiResult<asset::Model> {
        let record = self.assets.get(asset_id).await?;
        self.bucket.remove(&[record.storage_path.clone()]).await?;
        self.assets.delete(asset_id).await
    }

    /// Deletes a folder with its files. Folders that still contain
    /// subfolders are refused.
    #[instrument(name = "crm.assets.delete_folder", skip(self))]
    pub async fn delete_folder(&self, folder_id: Uuid) -> ApiResult<Folder> {
        let folder = self.folders.get(folder_id).await?;
        let children = self.folders(Some(folder_id)).await?;
        if !children.is_empty() {
            return Err(ApiError::Conflict(format!(
                "folder {} still has {} subfolder(s)",
                folder.name,
                children.len()
            )));
        }

        let contained = self.assets_in(Some(folder_id)).await?;
        if !contained.is_empty() {
            let paths: Vec<String> = contained.iter().map(|a| a.storage_path.clone()).collect();
            self.bucket.remove(&paths).await?;
            let _removed: Vec<asset::Model> = self
                .assets
                .query()
                .eq("folder_id", folder_id)
                .delete()
                .await?;
        }

        let deleted = self.folders.delete(folder_id).await?;
        info!(files = contained.len(), "asset folder deleted");
        Ok(deleted)
    }
}
