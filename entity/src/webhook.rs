use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate::http_url("url", &self.url)?;
        validate_events(&self.events)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.url.as_deref(), |v| validate::http_url("url", v))?;
        validate::optional(self.events.as_deref(), validate_events)
    }
}

fn validate_events(events: &[String]) -> ValidationResult {
    if events.is_empty() {
        return Err(ValidationError::new("events", "at least one event is required"));
    }
    for event in events {
        let valid = !event.is_empty()
            && event
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '.' || c == '_');
        if !valid {
            return Err(ValidationError::new(
                "events",
                format!("invalid event name {event:?}"),
            ));
        }
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "webhooks";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Result reported by the backend after delivering a test event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDelivery {
    pub success: bool,
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    pub duration_ms: Option<u64>,
}
