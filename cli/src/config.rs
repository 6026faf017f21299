use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use platform_client::BackendSettings;
use products_crm::{Buckets, DEFAULT_ASSETS_BUCKET, DEFAULT_ATTACHMENTS_BUCKET};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub buckets: Buckets,
    pub log_poll_interval: Duration,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // A missing .env file is fine; the process environment still applies.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend =
            BackendSettings::from_lookup(&lookup).context("invalid backend configuration")?;

        let buckets = Buckets {
            assets: non_empty(&lookup, "ASSETS_BUCKET")
                .unwrap_or_else(|| DEFAULT_ASSETS_BUCKET.into()),
            attachments: non_empty(&lookup, "ATTACHMENTS_BUCKET")
                .unwrap_or_else(|| DEFAULT_ATTACHMENTS_BUCKET.into()),
        };

        let poll_ms = match non_empty(&lookup, "LOG_POLL_INTERVAL_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow!("LOG_POLL_INTERVAL_MS must be a whole number, got {raw}"))?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_ms == 0 {
            return Err(anyhow!("LOG_POLL_INTERVAL_MS must be greater than zero"));
        }

        Ok(Self {
            backend,
            buckets,
            log_poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(move |key| map.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [
        ("BACKEND_URL", "https://project.example.test"),
        ("BACKEND_API_KEY", "anon"),
    ];

    #[test]
    fn defaults_apply() {
        let config = config(&BASE).unwrap();
        assert_eq!(config.buckets.assets, "assets");
        assert_eq!(config.buckets.attachments, "contact-attachments");
        assert_eq!(config.log_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn overrides_are_read() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("ASSETS_BUCKET", "media"),
            ("ATTACHMENTS_BUCKET", " "),
            ("LOG_POLL_INTERVAL_MS", "250"),
        ]);
        let config = config(&pairs).unwrap();
        assert_eq!(config.buckets.assets, "media");
        assert_eq!(config.buckets.attachments, "contact-attachments");
        assert_eq!(config.log_poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[]).is_err());
        let mut pairs = BASE.to_vec();
        pairs.push(("LOG_POLL_INTERVAL_MS", "0"));
        assert!(config(&pairs).is_err());
        pairs.pop();
        pairs.push(("LOG_POLL_INTERVAL_MS", "soon"));
        assert!(config(&pairs).is_err());
    }
}
