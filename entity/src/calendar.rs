use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Active,
    Error,
    Syncing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub provider: Option<String>,
    pub sync_status: SyncStatus,
    pub slot_minutes: u32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    pub slot_minutes: u32,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate::required("timezone", &self.timezone)?;
        validate_slot(self.slot_minutes)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))?;
        validate::optional(self.slot_minutes.as_ref(), |v| validate_slot(*v))
    }
}

fn validate_slot(minutes: u32) -> ValidationResult {
    if minutes == 0 || minutes > 24 * 60 {
        return Err(ValidationError::new(
            "slot_minutes",
            "must be between 1 and 1440",
        ));
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "calendars";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// RFC 5545 RRULE value, without the `RRULE:` prefix.
    pub recurrence: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingDraft {
    pub calendar_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Validate for BookingDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("title", &self.title)?;
        if self.ends_at <= self.starts_at {
            return Err(ValidationError::new("ends_at", "must be after starts_at"));
        }
        validate::optional(self.recurrence.as_deref(), |v| {
            validate::required("recurrence", v)
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BookingChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
}

impl Validate for BookingChanges {
    fn validate(&self) -> ValidationResult {
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end <= start {
                return Err(ValidationError::new("ends_at", "must be after starts_at"));
            }
        }
        Ok(())
    }
}

impl Resource for Booking {
    const TABLE: &'static str = "bookings";
    type Draft = BookingDraft;
    type Changes = BookingChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn booking_must_end_after_start() {
        let start = Utc::now();
        let mut draft = BookingDraft {
            calendar_id: Uuid::new_v4(),
            contact_id: None,
            title: "Intro call".into(),
            starts_at: start,
            ends_at: start,
            recurrence: None,
            status: BookingStatus::Confirmed,
        };
        assert_eq!(draft.validate().unwrap_err().field, "ends_at");
        draft.ends_at = start + Duration::minutes(30);
        draft.validate().unwrap();
    }

    #[test]
    fn sync_status_wire_names() {
        let json = serde_json::to_string(&SyncStatus::Syncing).unwrap();
        assert_eq!(json, "\"syncing\"");
    }
}
