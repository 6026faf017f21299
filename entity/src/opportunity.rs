use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::New,
        Stage::Qualified,
        Stage::Proposal,
        Stage::Negotiation,
        Stage::Won,
        Stage::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Qualified => "qualified",
            Stage::Proposal => "proposal",
            Stage::Negotiation => "negotiation",
            Stage::Won => "won",
            Stage::Lost => "lost",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    pub contact_id: Option<Uuid>,
    pub pipeline_id: Option<Uuid>,
    pub stage: Stage,
    pub value_cents: i64,
    pub currency: String,
    pub expected_close: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<Uuid>,
    pub stage: Stage,
    pub value_cents: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close: Option<NaiveDate>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("title", &self.title)?;
        validate::max_length("title", &self.title, 256)?;
        validate_value(self.value_cents)?;
        validate_currency(&self.currency)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close: Option<NaiveDate>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.title.as_deref(), |v| validate::required("title", v))?;
        validate::optional(self.value_cents.as_ref(), |v| validate_value(*v))?;
        validate::optional(self.currency.as_deref(), validate_currency)
    }
}

fn validate_value(cents: i64) -> ValidationResult {
    if cents < 0 {
        return Err(ValidationError::new("value_cents", "must not be negative"));
    }
    Ok(())
}

fn validate_currency(code: &str) -> ValidationResult {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "must be a three letter ISO code",
        ));
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "opportunities";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}
