use platform_api::{ApiError, ApiResult};
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::client::{BackendClient, decode};

const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Builder for one table request. Filters combine with AND.
#[derive(Debug)]
pub struct TableQuery {
    client: BackendClient,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    error: Option<ApiError>,
}

impl TableQuery {
    pub(crate) fn new(client: BackendClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            columns: "*".into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            error: None,
        }
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl Serialize) -> Self {
        self.operator(column, "lte", value)
    }

    /// Case-insensitive pattern match; `%` matches any run of characters.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("ilike.{pattern}")));
        self
    }

    /// Matches rows where any of `columns` is ilike `pattern`. The pattern
    /// must not contain `,` `(` or `)`.
    pub fn any_ilike(mut self, columns: &[&str], pattern: &str) -> Self {
        if pattern.contains([',', '(', ')']) {
            self.error = Some(ApiError::invalid(
                "search pattern must not contain ',', '(' or ')'",
            ));
            return self;
        }
        let clauses: Vec<String> = columns
            .iter()
            .map(|column| format!("{column}.ilike.{pattern}"))
            .collect();
        self.filters
            .push(("or".into(), format!("({})", clauses.join(","))));
        self
    }

    /// Column value is one of `values`.
    pub fn is_in<V: Serialize>(mut self, column: &str, values: &[V]) -> Self {
        match encode_list(values) {
            Ok(list) => self.filters.push((column.to_string(), format!("in.({list})"))),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Array column contains every one of `values`.
    pub fn contains<V: Serialize>(mut self, column: &str, values: &[V]) -> Self {
        match encode_list(values) {
            Ok(list) => self.filters.push((column.to_string(), format!("cs.{{{list}}}"))),
            Err(err) => self.error = Some(err),
        }
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.null".into()));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(format!("{column}.{}", direction.as_str()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn operator(mut self, column: &str, op: &str, value: impl Serialize) -> Self {
        match encode_scalar(&value) {
            Ok(encoded) => self
                .filters
                .push((column.to_string(), format!("{op}.{encoded}"))),
            Err(err) => self.error = Some(err),
        }
        self
    }

    #[instrument(name = "backend.select", skip(self), fields(table = %self.table))]
    pub async fn select<T: DeserializeOwned>(self) -> ApiResult<Vec<T>> {
        let url = self.url(true)?;
        debug!(%url, "select");
        let response = self.client.request(Method::GET, url).send().await?;
        decode(response).await
    }

    /// First matching row or `NotFound`.
    pub async fn single<T: DeserializeOwned>(self) -> ApiResult<T> {
        self.maybe_single().await?.ok_or(ApiError::NotFound)
    }

    pub async fn maybe_single<T: DeserializeOwned>(self) -> ApiResult<Option<T>> {
        let rows: Vec<T> = self.limit(1).select().await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one object or an array of objects, returning the stored rows.
    #[instrument(name = "backend.insert", skip(self, body), fields(table = %self.table))]
    pub async fn insert<B, T>(self, body: &B) -> ApiResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(false)?;
        debug!(%url, "insert");
        let response = self
            .client
            .request(Method::POST, url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// Applies `patch` to every row matching the filters.
    #[instrument(name = "backend.update", skip(self, patch), fields(table = %self.table))]
    pub async fn update<B, T>(self, patch: &B) -> ApiResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filters("update")?;
        let url = self.url(true)?;
        debug!(%url, "update");
        let response = self
            .client
            .request(Method::PATCH, url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    /// Deletes every row matching the filters, returning them.
    #[instrument(name = "backend.delete", skip(self), fields(table = %self.table))]
    pub async fn delete<T: DeserializeOwned>(self) -> ApiResult<Vec<T>> {
        self.require_filters("delete")?;
        let url = self.url(true)?;
        debug!(%url, "delete");
        let response = self
            .client
            .request(Method::DELETE, url)
            .header("Prefer", PREFER_REPRESENTATION)
            .send()
            .await?;
        decode(response).await
    }

    fn require_filters(&self, action: &str) -> ApiResult<()> {
        if self.filters.is_empty() {
            return Err(ApiError::invalid(format!(
                "refusing to {action} {} without a filter",
                self.table
            )));
        }
        Ok(())
    }

    /// Renders the request url; `with_filters` is false for inserts.
    pub fn url(&self, with_filters: bool) -> ApiResult<Url> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let mut url = self.client.endpoint(&["rest", "v1", &self.table]);
        if with_filters {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &self.columns);
            for (column, filter) in &self.filters {
                pairs.append_pair(column, filter);
            }
            if !self.order.is_empty() {
                pairs.append_pair("order", &self.order.join(","));
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = self.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        Ok(url)
    }
}

fn encode_scalar(value: &impl Serialize) -> ApiResult<String> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok("null".into()),
        Value::Array(_) | Value::Object(_) => Err(ApiError::invalid(
            "filter values must be scalars; use is_in or contains for lists",
        )),
        other => Ok(other.to_string()),
    }
}

fn encode_list<V: Serialize>(values: &[V]) -> ApiResult<String> {
    let mut encoded = Vec::with_capacity(values.len());
    for value in values {
        let raw = encode_scalar(value)?;
        encoded.push(format!(
            "\"{}\"",
            raw.replace('\\', "\\\\").replace('"', "\\\"")
        ));
    }
    Ok(encoded.join(","))
}
