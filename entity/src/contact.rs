use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationResult},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Draft {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("first_name", &self.first_name)?;
        validate::max_length("first_name", &self.first_name, 128)?;
        validate::optional(self.last_name.as_deref(), |v| {
            validate::max_length("last_name", v, 128)
        })?;
        validate::optional(self.email.as_deref(), |v| validate::email("email", v))?;
        validate::optional(self.phone.as_deref(), |v| validate::phone("phone", v))?;
        validate_tags(&self.tags)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.first_name.as_deref(), |v| {
            validate::required("first_name", v)
        })?;
        validate::optional(self.email.as_deref(), |v| validate::email("email", v))?;
        validate::optional(self.phone.as_deref(), |v| validate::phone("phone", v))?;
        validate::optional(self.tags.as_deref(), validate_tags)
    }
}

fn validate_tags(tags: &[String]) -> ValidationResult {
    for tag in tags {
        validate::required("tags", tag)?;
        validate::max_length("tags", tag, 64)?;
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "contacts";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// File attached to a contact; the bytes live in object storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentDraft {
    pub contact_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl Validate for AttachmentDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("file_name", &self.file_name)?;
        validate::max_length("file_name", &self.file_name, 255)?;
        validate::required("storage_path", &self.storage_path)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AttachmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Validate for AttachmentChanges {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.file_name.as_deref(), |v| {
            validate::required("file_name", v)
        })
    }
}

impl Resource for Attachment {
    const TABLE: &'static str = "contact_attachments";
    type Draft = AttachmentDraft;
    type Changes = AttachmentChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}
