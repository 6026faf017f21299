use entity::contact::{self, Attachment, AttachmentDraft};
use platform_api::{ApiError, ApiResult};
use platform_client::{BackendClient, Bucket, Direction, ProgressCallback, UploadOptions};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

pub type ContactService = CrudService<contact::Model>;

const SEARCH_COLUMNS: [&str; 4] = ["first_name", "last_name", "email", "company_name"];

impl CrudService<contact::Model> {
    /// Case-insensitive match on name, email or company.
    #[instrument(name = "crm.contacts.search", skip(self))]
    pub async fn search(&self, term: &str, params: ListParams) -> ApiResult<Vec<contact::Model>> {
        let cleaned = sanitize_term(term)?;
        let pattern = format!("%{cleaned}%");
        params
            .apply(self.query().any_ilike(&SEARCH_COLUMNS, &pattern))
            .select()
            .await
    }

    pub async fn with_tag(&self, tag: &str, params: ListParams) -> ApiResult<Vec<contact::Model>> {
        params
            .apply(self.query().contains("tags", &[tag]))
            .select()
            .await
    }

    /// Contacts for the given ids; unknown ids are skipped.
    pub async fn by_ids(&self, ids: &[Uuid]) -> ApiResult<Vec<contact::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query()
            .is_in("id", ids)
            .order("created_at", Direction::Asc)
            .select()
            .await
    }
}

fn sanitize_term(term: &str) -> ApiResult<String> {
    let cleaned: String = term
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '%' | '*'))
        .collect();
    if cleaned.is_empty() {
        return Err(ApiError::invalid("search term cannot be empty"));
    }
    Ok(cleaned)
}

/// Files attached to contacts: bytes in a storage bucket, metadata in a table.
#[derive(Clone)]
pub struct ContactAttachments {
    bucket: Bucket,
    records: CrudService<Attachment>,
}

impl ContactAttachments {
    pub fn new(client: BackendClient, bucket: &str) -> Self {
        Self {
            bucket: client.storage(bucket),
            records: CrudService::new(client),
        }
    }

    pub async fn list(&self, contact_id: Uuid) -> ApiResult<Vec<Attachment>> {
        self.records
            .query()
            .eq("contact_id", contact_id)
            .order("created_at", Direction::Desc)
            .select()
            .await
    }

    /// Uploads the file and records it. A failed insert removes the object
    /// again so no orphaned bytes stay behind.
    #[instrument(name = "crm.contacts.attach", skip(self, bytes, progress), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        contact_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        progress: Option<ProgressCallback>,
    ) -> ApiResult<Attachment> {
        let draft = AttachmentDraft {
            contact_id,
            file_name: file_name.to_string(),
            storage_path: format!("{contact_id}/{}-{}", Uuid::new_v4(), file_name),
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as u64,
        };
        entity::Validate::validate(&draft)?;

        let mut options = UploadOptions::new(content_type);
        options.progress = progress;
        let stored = self.bucket.upload(&draft.storage_path, bytes, options).await?;

        match self.records.create(&draft).await {
            Ok(record) => Ok(record),
            Err(err) => {
                if let Err(cleanup) = self.bucket.remove(&[stored.path.clone()]).await {
                    warn!(path = %stored.path, error = %cleanup, "failed to remove orphaned attachment");
                }
                Err(err)
            }
        }
    }

    pub async fn remove(&self, attachment_id: Uuid) -> ApiResult<Attachment> {
        let record = self.records.get(attachment_id).await?;
        self.bucket.remove(&[record.storage_path.clone()]).await?;
        self.records.delete(attachment_id).await
    }

    pub fn public_url(&self, attachment: &Attachment) -> ApiResult<String> {
        Ok(self.bucket.public_url(&attachment.storage_path)?.to_string())
    }
}
