use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing env {0}")]
    MissingVar(&'static str),
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid timeout {0:?}; expected whole seconds")]
    InvalidTimeout(String),
}

/// Connection settings for the hosted backend.
#[derive(Clone, Debug)]
pub struct BackendSettings {
    url: Url,
    api_key: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl BackendSettings {
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, SettingsError> {
        Ok(Self {
            url: parse_base_url(url)?,
            api_key: api_key.into(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `BACKEND_URL`, `BACKEND_API_KEY`, `BACKEND_ACCESS_TOKEN` and
    /// `BACKEND_TIMEOUT_SECS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let url = lookup("BACKEND_URL").ok_or(SettingsError::MissingVar("BACKEND_URL"))?;
        let api_key =
            lookup("BACKEND_API_KEY").ok_or(SettingsError::MissingVar("BACKEND_API_KEY"))?;
        let mut settings = Self::new(&url, api_key)?;
        if let Some(token) = lookup("BACKEND_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            settings = settings.with_access_token(token);
        }
        if let Some(raw) = lookup("BACKEND_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| SettingsError::InvalidTimeout(raw.clone()))?;
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        Ok(settings)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Token presented as the bearer credential; falls back to the api key.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_base_url(raw: &str) -> Result<Url, SettingsError> {
    let url = Url::parse(raw.trim()).map_err(|err| SettingsError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(SettingsError::InvalidUrl {
            url: raw.to_string(),
            reason: "expected an http(s) base url".into(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn lookup_requires_url_and_key() {
        let err = BackendSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::MissingVar("BACKEND_URL")));
        let err =
            BackendSettings::from_lookup(lookup(&[("BACKEND_URL", "https://x.example.test")]))
                .unwrap_err();
        assert!(matches!(err, SettingsError::MissingVar("BACKEND_API_KEY")));
    }

    #[test]
    fn bearer_prefers_access_token() {
        let settings = BackendSettings::from_lookup(lookup(&[
            ("BACKEND_URL", "https://x.example.test"),
            ("BACKEND_API_KEY", "anon"),
            ("BACKEND_ACCESS_TOKEN", "user-jwt"),
            ("BACKEND_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.bearer(), "user-jwt");
        assert_eq!(settings.api_key(), "anon");
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(BackendSettings::new("ftp://x.example.test", "k").is_err());
        assert!(BackendSettings::new("not a url", "k").is_err());
    }
}
