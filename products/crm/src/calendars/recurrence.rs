//! Booking recurrence as RFC 5545 RRULE values, parsed, rendered and expanded
//! by the `rrule` crate.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rrule::{NWeekday, RRule, RRuleError, Tz, Unvalidated, Validated};
use thiserror::Error;

pub use rrule::{Frequency, Weekday};

const PREFIX: &str = "RRULE:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("{0}")]
    Invalid(String),
    #[error("interval must be at least 1")]
    ZeroInterval,
    #[error("count must be at least 1")]
    ZeroCount,
    #[error("COUNT and UNTIL cannot both be set")]
    ConflictingEnd,
}

impl From<RRuleError> for RecurrenceError {
    fn from(err: RRuleError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// An RRULE that has not been anchored to a start time yet.
///
/// Builder methods that could produce an unparseable rule are fallible, so
/// every value renders to a string that parses back.
#[derive(Clone, Debug)]
pub struct RecurrenceRule {
    rule: RRule<Unvalidated>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            rule: RRule::new(frequency),
        }
    }

    pub fn every(self, interval: u16) -> Result<Self, RecurrenceError> {
        if interval == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        Ok(Self {
            rule: self.rule.interval(interval),
        })
    }

    /// Adds weekdays, keeping first-seen order and dropping repeats.
    pub fn on(self, days: &[Weekday]) -> Self {
        let days = days.iter().map(|day| NWeekday::Every(*day));
        self.with_weekdays(days)
    }

    /// Adds an ordinal weekday: `nth(2, Mon)` is the second Monday, `nth(-1, Fri)`
    /// the last Friday of the period.
    pub fn nth(self, n: i16, day: Weekday) -> Self {
        self.with_weekdays([NWeekday::Nth(n, day)])
    }

    pub fn on_month_days(self, days: &[i8]) -> Self {
        let mut merged = self.rule.get_by_month_day().to_vec();
        for day in days {
            if !merged.contains(day) {
                merged.push(*day);
            }
        }
        Self {
            rule: self.rule.by_month_day(merged),
        }
    }

    pub fn count(self, count: u32) -> Result<Self, RecurrenceError> {
        if count == 0 {
            return Err(RecurrenceError::ZeroCount);
        }
        if self.rule.get_until().is_some() {
            return Err(RecurrenceError::ConflictingEnd);
        }
        Ok(Self {
            rule: self.rule.count(count),
        })
    }

    pub fn until(self, until: DateTime<Utc>) -> Result<Self, RecurrenceError> {
        if self.rule.get_count().is_some() {
            return Err(RecurrenceError::ConflictingEnd);
        }
        Ok(Self {
            rule: self.rule.until(until.with_timezone(&Tz::UTC)),
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.rule.get_freq()
    }

    pub fn interval(&self) -> u16 {
        self.rule.get_interval()
    }

    pub fn weekdays(&self) -> &[NWeekday] {
        self.rule.get_by_weekday()
    }

    pub fn month_days(&self) -> &[i8] {
        self.rule.get_by_month_day()
    }

    pub fn end_count(&self) -> Option<u32> {
        self.rule.get_count()
    }

    /// Anchors the rule at `starts_at`, which runs the full RFC 5545 checks
    /// such as day-of-month ranges.
    pub fn validate(self, starts_at: DateTime<Utc>) -> Result<RRule<Validated>, RecurrenceError> {
        Ok(self.rule.validate(starts_at.with_timezone(&Tz::UTC))?)
    }

    /// The first `limit` occurrences starting at `starts_at`.
    pub fn occurrences(
        self,
        starts_at: DateTime<Utc>,
        limit: u16,
    ) -> Result<Vec<DateTime<Utc>>, RecurrenceError> {
        let set = self.rule.build(starts_at.with_timezone(&Tz::UTC))?;
        Ok(set
            .all(limit)
            .dates
            .into_iter()
            .map(|at| at.with_timezone(&Utc))
            .collect())
    }

    fn with_weekdays(self, days: impl IntoIterator<Item = NWeekday>) -> Self {
        let mut merged = self.rule.get_by_weekday().to_vec();
        for day in days {
            if !merged.contains(&day) {
                merged.push(day);
            }
        }
        Self {
            rule: self.rule.by_weekday(merged),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.rule.to_string();
        f.write_str(rendered.strip_prefix(PREFIX).unwrap_or(&rendered))
    }
}

/// Parses an RRULE value, with or without the `RRULE:` prefix.
impl FromStr for RecurrenceRule {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_prefix(s);
        let rule: RRule<Unvalidated> = body.parse()?;
        if rule.get_interval() == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        match (rule.get_count(), rule.get_until()) {
            (Some(0), _) => Err(RecurrenceError::ZeroCount),
            (Some(_), Some(_)) => Err(RecurrenceError::ConflictingEnd),
            _ => Ok(Self { rule }),
        }
    }
}

/// Trims the value and removes a leading `RRULE:` if present.
pub fn strip_prefix(value: &str) -> &str {
    let body = value.trim();
    match body.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &body[PREFIX.len()..],
        _ => body,
    }
}
