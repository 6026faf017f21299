use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Draft,
    Scheduled,
    Sending,
    Sent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub channel: Channel,
    pub status: Status,
    pub subject: Option<String>,
    pub content: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub channel: Channel,
    #[serde(default)]
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate::required("content", &self.content)?;
        if self.channel == Channel::Email {
            match self.subject.as_deref() {
                Some(subject) => validate::required("subject", subject)?,
                None => return Err(ValidationError::new("subject", "is required for email")),
            }
        }
        if self.channel == Channel::Sms && self.content.chars().count() > 1_600 {
            return Err(ValidationError::new(
                "content",
                "sms content must be at most 1600 characters",
            ));
        }
        if self.status == Status::Scheduled && self.scheduled_at.is_none() {
            return Err(ValidationError::new(
                "scheduled_at",
                "is required for scheduled campaigns",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))?;
        validate::optional(self.content.as_deref(), |v| {
            validate::required("content", v)
        })
    }
}

impl Resource for Model {
    const TABLE: &'static str = "campaigns";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_campaign_needs_subject() {
        let draft = Draft {
            name: "Spring promo".into(),
            channel: Channel::Email,
            status: Status::Draft,
            subject: None,
            content: "Hello".into(),
            scheduled_at: None,
        };
        assert_eq!(draft.validate().unwrap_err().field, "subject");
    }

    #[test]
    fn scheduled_campaign_needs_time() {
        let draft = Draft {
            name: "Reminder".into(),
            channel: Channel::Sms,
            status: Status::Scheduled,
            subject: None,
            content: "See you soon".into(),
            scheduled_at: None,
        };
        assert_eq!(draft.validate().unwrap_err().field, "scheduled_at");
    }
}
