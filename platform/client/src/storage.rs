use std::sync::Arc;

use futures::stream;
use platform_api::{ApiError, ApiResult};
use reqwest::{
    Body, Method,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::client::{BackendClient, expect_success};

pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Completed share in `[0.0, 1.0]`; an empty upload counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.sent as f64 / self.total as f64
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Clone)]
pub struct UploadOptions {
    pub content_type: String,
    pub upsert: bool,
    pub progress: Option<ProgressCallback>,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            upsert: false,
            progress: None,
        }
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("content_type", &self.content_type)
            .field("upsert", &self.upsert)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Serialize)]
struct RemoveBody<'a> {
    prefixes: &'a [String],
}

/// One object storage bucket.
#[derive(Clone, Debug)]
pub struct Bucket {
    client: BackendClient,
    name: String,
}

impl Bucket {
    pub(crate) fn new(client: BackendClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Streams `bytes` to `path`, reporting progress after every chunk.
    #[instrument(name = "storage.upload", skip(self, bytes, options), fields(bucket = %self.name, size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> ApiResult<StoredObject> {
        let segments = object_segments(path)?;
        let url = self.object_url(&[], &segments);
        let total = bytes.len() as u64;
        let progress = options.progress.clone();
        if total == 0 {
            if let Some(callback) = &progress {
                callback(UploadProgress { sent: 0, total: 0 });
            }
        }

        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let body = Body::wrap_stream(stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(callback) = &progress {
                callback(UploadProgress { sent, total });
            }
            Ok::<_, std::io::Error>(chunk)
        })));

        debug!(%url, "uploading object");
        let response = self
            .client
            .request(Method::POST, url)
            .header(CONTENT_TYPE, options.content_type.as_str())
            .header(CONTENT_LENGTH, total)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(body)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(StoredObject {
            bucket: self.name.clone(),
            path: segments.join("/"),
            size_bytes: total,
        })
    }

    /// Removes the given object paths from the bucket.
    #[instrument(name = "storage.remove", skip(self, paths), fields(bucket = %self.name, count = paths.len()))]
    pub async fn remove(&self, paths: &[String]) -> ApiResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.object_url(&[], &[]);
        let response = self
            .client
            .request(Method::DELETE, url)
            .json(&RemoveBody { prefixes: paths })
            .send()
            .await?;
        expect_success(response).await
    }

    /// Public address of an object. Does not check that the object exists.
    pub fn public_url(&self, path: &str) -> ApiResult<Url> {
        let segments = object_segments(path)?;
        Ok(self.object_url(&["public"], &segments))
    }

    fn object_url(&self, prefix: &[&str], path: &[&str]) -> Url {
        let mut segments = vec!["storage", "v1", "object"];
        segments.extend_from_slice(prefix);
        segments.push(&self.name);
        segments.extend_from_slice(path);
        self.client.endpoint(&segments)
    }
}

fn object_segments(path: &str) -> ApiResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(ApiError::invalid("object path is empty"));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(ApiError::invalid("object path must not contain relative segments"));
    }
    Ok(segments)
}
