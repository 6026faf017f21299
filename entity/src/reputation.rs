use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Google,
    Facebook,
    Yelp,
    Trustpilot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub platform: Platform,
    pub author: String,
    pub rating: u8,
    pub body: Option<String>,
    pub reply: Option<String>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub platform: Platform,
    pub author: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub posted_at: DateTime<Utc>,
}

impl Validate for ReviewDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("author", &self.author)?;
        validate_rating(self.rating)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReviewChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl Validate for ReviewChanges {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.reply.as_deref(), |v| {
            validate::required("reply", v)?;
            validate::max_length("reply", v, 4_096)
        })
    }
}

fn validate_rating(rating: u8) -> ValidationResult {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::new("rating", "must be between 1 and 5"));
    }
    Ok(())
}

impl Resource for Review {
    const TABLE: &'static str = "reviews";
    type Draft = ReviewDraft;
    type Changes = ReviewChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Average star rating, `None` when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(sum) / reviews.len() as f64)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConnection {
    pub id: Uuid,
    pub platform: Platform,
    pub account_name: String,
    pub external_id: String,
    pub connected_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionDraft {
    pub platform: Platform,
    pub account_name: String,
    pub external_id: String,
}

impl Validate for ConnectionDraft {
    fn validate(&self) -> ValidationResult {
        validate::required("account_name", &self.account_name)?;
        validate::required("external_id", &self.external_id)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConnectionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

impl Validate for ConnectionChanges {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.account_name.as_deref(), |v| {
            validate::required("account_name", v)
        })
    }
}

impl Resource for PlatformConnection {
    const TABLE: &'static str = "platform_connections";
    type Draft = ConnectionDraft;
    type Changes = ConnectionChanges;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        let mut draft = ReviewDraft {
            platform: Platform::Google,
            author: "Grace".into(),
            rating: 0,
            body: None,
            posted_at: Utc::now(),
        };
        assert!(draft.validate().is_err());
        draft.rating = 5;
        assert!(draft.validate().is_ok());
        draft.rating = 6;
        assert!(draft.validate().is_err());
    }

    #[test]
    fn average_of_empty_is_none() {
        assert_eq!(average_rating(&[]), None);
    }
}
