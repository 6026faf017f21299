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
    pub domain: Option<String>,
    pub published: bool,
    pub tracking_script: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_script: Option<String>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate::optional(self.domain.as_deref(), validate_domain)?;
        validate::optional(self.tracking_script.as_deref(), validate_tracking_script)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_script: Option<String>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))?;
        validate::optional(self.domain.as_deref(), validate_domain)?;
        validate::optional(self.tracking_script.as_deref(), validate_tracking_script)
    }
}

fn validate_domain(domain: &str) -> ValidationResult {
    let valid = domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(ValidationError::new("domain", "must be a bare host name"));
    }
    Ok(())
}

/// Tracking snippets must be a single script element.
pub fn validate_tracking_script(script: &str) -> ValidationResult {
    let trimmed = script.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if !lowered.starts_with("<script") || !lowered.ends_with("</script>") {
        return Err(ValidationError::new(
            "tracking_script",
            "must be wrapped in a <script> element",
        ));
    }
    if lowered.matches("<script").count() != 1 {
        return Err(ValidationError::new(
            "tracking_script",
            "must contain exactly one <script> element",
        ));
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "sites";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelStep {
    pub id: Uuid,
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funnel {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<FunnelStep>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunnelDraft {
    pub site_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<FunnelStep>,
}

impl Validate for FunnelDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate_steps(&self.steps)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FunnelChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<FunnelStep>>,
}

impl Validate for FunnelChanges {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))?;
        validate::optional(self.steps.as_deref(), validate_steps)
    }
}

fn validate_steps(steps: &[FunnelStep]) -> ValidationResult {
    for (idx, step) in steps.iter().enumerate() {
        validate::required("steps.name", &step.name)?;
        if !step.path.starts_with('/') {
            return Err(ValidationError::new("steps.path", "must start with '/'"));
        }
        if steps[..idx].iter().any(|other| other.path == step.path) {
            return Err(ValidationError::new(
                "steps.path",
                format!("duplicate path {}", step.path),
            ));
        }
    }
    Ok(())
}

impl Resource for Funnel {
    const TABLE: &'static str = "funnels";
    type Draft = FunnelDraft;
    type Changes = FunnelChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}
