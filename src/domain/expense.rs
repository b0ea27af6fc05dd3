//! Expense/allocation ledger entries and their target encoding.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// Where an allocation entry points. Plain entries carry a category label;
/// mirrored entries reference an account or debt by stable id so renames
/// cannot break the linkage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AllocationTarget {
    Category(String),
    AccountDeposit(Uuid),
    DebtPayment(Uuid),
}

impl AllocationTarget {
    /// True for targets that trigger a mirrored balance update.
    pub fn is_mirrored(&self) -> bool {
        !matches!(self, AllocationTarget::Category(_))
    }

    /// The plain category label, when this is not a mirrored target.
    pub fn category_name(&self) -> Option<&str> {
        match self {
            AllocationTarget::Category(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for AllocationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationTarget::Category(name) => f.write_str(name),
            AllocationTarget::AccountDeposit(id) => write!(f, "Account: {id}"),
            AllocationTarget::DebtPayment(id) => write!(f, "Debt: {id}"),
        }
    }
}

/// Prefixes of the legacy string-encoded mirrored categories.
pub const ACCOUNT_PREFIX: &str = "Account: ";
pub const DEBT_PREFIX: &str = "Debt: ";

/// The legacy category string split into its tag and payload, before any
/// name resolution has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLabel<'a> {
    Category(&'a str),
    Account(&'a str),
    Debt(&'a str),
}

/// Splits a legacy category label such as `Account: Checking` into its
/// reserved-prefix form. Plain labels pass through unchanged.
pub fn parse_label(label: &str) -> ParsedLabel<'_> {
    if let Some(name) = label.strip_prefix(ACCOUNT_PREFIX) {
        ParsedLabel::Account(name)
    } else if let Some(name) = label.strip_prefix(DEBT_PREFIX) {
        ParsedLabel::Debt(name)
    } else {
        ParsedLabel::Category(label)
    }
}

/// A single expense or allocation entry in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub target: AllocationTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(name: impl Into<String>, amount: f64, target: AllocationTarget) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            target,
            notes: None,
            date: now,
            created_at: now,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Expense {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!("{} ({:.2})", self.name, self.amount)
    }
}

/// Entry dates arrive in several historical shapes: RFC 3339 timestamps,
/// date-only strings, integer epoch seconds, or a `{seconds, nanoseconds}`
/// wrapper. All normalize to UTC on the way in and serialize as RFC 3339.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Epoch(i64),
        Stamp {
            seconds: i64,
            #[serde(default)]
            nanoseconds: u32,
        },
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_text(&text)
                .ok_or_else(|| de::Error::custom(format!("unrecognized date `{text}`"))),
            Raw::Epoch(seconds) => from_epoch(seconds, 0).map_err(de::Error::custom),
            Raw::Stamp {
                seconds,
                nanoseconds,
            } => from_epoch(seconds, nanoseconds).map_err(de::Error::custom),
        }
    }

    pub(crate) fn parse_text(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    fn from_epoch(seconds: i64, nanoseconds: u32) -> Result<DateTime<Utc>, String> {
        Utc.timestamp_opt(seconds, nanoseconds)
            .single()
            .ok_or_else(|| format!("epoch timestamp {seconds} out of range"))
    }
}
