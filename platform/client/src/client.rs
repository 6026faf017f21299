use std::sync::Arc;

use platform_api::{ApiError, ApiResult};
use reqwest::{
    Method, RequestBuilder, Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};
use url::Url;

use crate::{settings::BackendSettings, storage::Bucket, table::TableQuery};

/// Handle to the hosted backend. Cheap to clone; clones share one connection
/// pool and one set of settings.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    settings: Arc<BackendSettings>,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", sensitive_header(settings.api_key())?);
        headers.insert(
            AUTHORIZATION,
            sensitive_header(&format!("Bearer {}", settings.bearer()))?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .user_agent(concat!("suite-crm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Starts a query against one table.
    pub fn table(&self, name: &str) -> TableQuery {
        TableQuery::new(self.clone(), name)
    }

    pub fn storage(&self, bucket: &str) -> Bucket {
        Bucket::new(self.clone(), bucket)
    }

    /// Invokes a named remote function with a JSON body.
    #[instrument(name = "backend.invoke", skip(self, body), fields(function = name))]
    pub async fn invoke<B, T>(&self, name: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(&["functions", "v1", name]);
        debug!(%url, "invoking function");
        let response = self.request(Method::POST, url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_function(name, status.as_u16(), &text));
        }
        Ok(response.json::<T>().await?)
    }

    /// Base url extended with the given path segments, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.settings.url().clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }
}

/// Decodes a successful response body or maps the failure status.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &text));
    }
    Ok(response.json::<T>().await?)
}

pub(crate) async fn expect_success(response: Response) -> ApiResult<()> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &text));
    }
    Ok(())
}

fn sensitive_header(value: &str) -> ApiResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| ApiError::invalid("credential contains characters not allowed in headers"))?;
    header.set_sensitive(true);
    Ok(header)
}
