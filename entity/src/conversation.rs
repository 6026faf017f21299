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
    Sms,
    Email,
    Chat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub channel: Channel,
    pub unread_count: u32,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub contact_id: Uuid,
    pub channel: Channel,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        Ok(())
    }
}

impl Resource for Model {
    const TABLE: &'static str = "conversations";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub direction: Direction,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageDraft {
    pub conversation_id: Uuid,
    pub direction: Direction,
    pub body: String,
}

impl Validate for MessageDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("body", &self.body)?;
        validate::max_length("body", &self.body, 10_000)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Validate for MessageChanges {
    fn validate(&self) -> ValidationResult {
        match self.body.as_deref() {
            Some(body) if body.trim().is_empty() => {
                Err(ValidationError::new("body", "is required"))
            }
            _ => Ok(()),
        }
    }
}

impl Resource for Message {
    const TABLE: &'static str = "messages";
    type Draft = MessageDraft;
    type Changes = MessageChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}
