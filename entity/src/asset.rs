use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FolderDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl Validate for FolderDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate_name_segment(&self.name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FolderChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl Validate for FolderChanges {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| {
            validate::required("name", v)?;
            validate_name_segment(v)
        })
    }
}

impl Resource for Folder {
    const TABLE: &'static str = "asset_folders";
    type Draft = FolderDraft;
    type Changes = FolderChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub folder_id: Option<Uuid>,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("file_name", &self.file_name)?;
        validate_name_segment(&self.file_name)?;
        validate::required("storage_path", &self.storage_path)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.file_name.as_deref(), validate_name_segment)
    }
}

fn validate_name_segment(name: &str) -> ValidationResult {
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ValidationError::new("name", "must be a single path segment"));
    }
    validate::max_length("name", name, 255)
}

impl Resource for Model {
    const TABLE: &'static str = "assets";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}
