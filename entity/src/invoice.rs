use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Void,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn amount_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Sums line items and applies a tax rate given in basis points, rounding the
/// tax half-up to the cent.
pub fn compute_totals(items: &[LineItem], tax_rate_bps: u32) -> Totals {
    let subtotal_cents: i64 = items.iter().map(LineItem::amount_cents).sum();
    let scaled = subtotal_cents * i64::from(tax_rate_bps);
    let tax_cents = if scaled >= 0 {
        (scaled + 5_000) / 10_000
    } else {
        (scaled - 5_000) / 10_000
    };
    Totals {
        subtotal_cents,
        tax_cents,
        total_cents: subtotal_cents + tax_cents,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub number: String,
    pub contact_id: Uuid,
    pub status: Status,
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: u32,
    pub total_cents: i64,
    pub issued_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn totals(&self) -> Totals {
        compute_totals(&self.line_items, self.tax_rate_bps)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, Status::Sent | Status::Overdue)
            && self.due_on.is_some_and(|due| due < today)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub number: String,
    pub contact_id: Uuid,
    #[serde(default)]
    pub status: Status,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: u32,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
}

impl Draft {
    /// Builds a draft whose stored total matches its line items.
    pub fn new(
        number: impl Into<String>,
        contact_id: Uuid,
        currency: impl Into<String>,
        line_items: Vec<LineItem>,
        tax_rate_bps: u32,
    ) -> Self {
        let totals = compute_totals(&line_items, tax_rate_bps);
        Self {
            number: number.into(),
            contact_id,
            status: Status::Draft,
            currency: currency.into(),
            line_items,
            tax_rate_bps,
            total_cents: totals.total_cents,
            issued_on: None,
            due_on: None,
        }
    }
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("number", &self.number)?;
        if self.line_items.is_empty() {
            return Err(ValidationError::new("line_items", "at least one item is required"));
        }
        validate_items(&self.line_items)?;
        if self.tax_rate_bps > 10_000 {
            return Err(ValidationError::new("tax_rate_bps", "must be at most 100%"));
        }
        let expected = compute_totals(&self.line_items, self.tax_rate_bps).total_cents;
        if expected != self.total_cents {
            return Err(ValidationError::new(
                "total_cents",
                format!("expected {expected} from line items"),
            ));
        }
        if let (Some(issued), Some(due)) = (self.issued_on, self.due_on) {
            if due < issued {
                return Err(ValidationError::new("due_on", "must not precede issued_on"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate_bps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.line_items.as_deref(), validate_items)?;
        if self.line_items.is_some() != self.total_cents.is_some() {
            return Err(ValidationError::new(
                "total_cents",
                "line items and total must change together",
            ));
        }
        Ok(())
    }
}

fn validate_items(items: &[LineItem]) -> ValidationResult {
    for item in items {
        validate::required("line_items.description", &item.description)?;
        if item.quantity == 0 {
            return Err(ValidationError::new("line_items.quantity", "must be positive"));
        }
        if item.unit_price_cents < 0 {
            return Err(ValidationError::new(
                "line_items.unit_price_cents",
                "must not be negative",
            ));
        }
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "invoices";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, unit_price_cents: i64) -> LineItem {
        LineItem {
            description: "Consulting".into(),
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn totals_round_tax_half_up() {
        // 1999 * 8.25% = 164.9175 -> 165
        let totals = compute_totals(&[item(1, 1_999)], 825);
        assert_eq!(totals.subtotal_cents, 1_999);
        assert_eq!(totals.tax_cents, 165);
        assert_eq!(totals.total_cents, 2_164);
    }

    #[test]
    fn draft_total_must_match_items() {
        let mut draft = Draft::new("INV-001", Uuid::new_v4(), "USD", vec![item(2, 5_000)], 0);
        draft.validate().unwrap();
        draft.total_cents += 1;
        assert_eq!(draft.validate().unwrap_err().field, "total_cents");
    }

    #[test]
    fn overdue_only_for_unpaid_past_due() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut invoice = Model {
            id: Uuid::new_v4(),
            number: "INV-9".into(),
            contact_id: Uuid::new_v4(),
            status: Status::Sent,
            currency: "USD".into(),
            line_items: vec![item(1, 100)],
            tax_rate_bps: 0,
            total_cents: 100,
            issued_on: None,
            due_on: NaiveDate::from_ymd_opt(2025, 3, 1),
            paid_at: None,
            created_at: Utc::now(),
        };
        assert!(invoice.is_overdue(today));
        invoice.status = Status::Paid;
        assert!(!invoice.is_overdue(today));
    }
}
