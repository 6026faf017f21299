use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

pub const MIN_VARIANTS: usize = 2;
pub const MAX_VARIANTS: usize = 5;
pub const MIN_SPLIT: u8 = 1;
pub const MAX_SPLIT: u8 = 99;
pub const TOTAL_SPLIT: u32 = 100;

/// One arm of an A/B test and its share of traffic in whole percent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub traffic_split: u8,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Running,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub status: Status,
    pub variants: Vec<Variant>,
    pub winner_variant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn winner(&self) -> Option<&Variant> {
        let winner = self.winner_variant_id?;
        self.variants.iter().find(|v| v.id == winner)
    }
}

/// Test configuration submitted to the backend when a test is started.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub campaign_id: Uuid,
    pub name: String,
    pub variants: Vec<Variant>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate_variants(&self.variants)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))
    }
}

/// Variant count in bounds, each split in bounds, splits summing to 100.
pub fn validate_variants(variants: &[Variant]) -> ValidationResult {
    if !(MIN_VARIANTS..=MAX_VARIANTS).contains(&variants.len()) {
        return Err(ValidationError::new(
            "variants",
            format!("between {MIN_VARIANTS} and {MAX_VARIANTS} variants are required"),
        ));
    }
    for variant in variants {
        validate::required("variants.name", &variant.name)?;
        if !(MIN_SPLIT..=MAX_SPLIT).contains(&variant.traffic_split) {
            return Err(ValidationError::new(
                "variants.traffic_split",
                format!("must be between {MIN_SPLIT} and {MAX_SPLIT}"),
            ));
        }
    }
    let total: u32 = variants.iter().map(|v| u32::from(v.traffic_split)).sum();
    if total != TOTAL_SPLIT {
        return Err(ValidationError::new(
            "variants.traffic_split",
            format!("splits must sum to {TOTAL_SPLIT}, got {total}"),
        ));
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "ab_tests";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, split: u8) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            name: name.into(),
            content: format!("{name} body"),
            subject: None,
            traffic_split: split,
        }
    }

    #[test]
    fn splits_must_sum_to_hundred() {
        assert!(validate_variants(&[variant("A", 50), variant("B", 50)]).is_ok());
        let err = validate_variants(&[variant("A", 50), variant("B", 49)]).unwrap_err();
        assert_eq!(err.field, "variants.traffic_split");
    }

    #[test]
    fn variant_count_bounds() {
        assert!(validate_variants(&[variant("A", 99)]).is_err());
        let six: Vec<_> = (0..6).map(|i| variant(&format!("V{i}"), 16)).collect();
        assert_eq!(validate_variants(&six).unwrap_err().field, "variants");
    }

    #[test]
    fn subject_is_omitted_when_absent() {
        let json = serde_json::to_value(variant("A", 50)).unwrap();
        assert!(json.get("subject").is_none());
        assert_eq!(json["traffic_split"], 50);
    }
}
