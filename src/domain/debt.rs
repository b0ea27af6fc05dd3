use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A debt the user owes (`is_debt`) or a loan owed to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Debt {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    pub is_debt: bool,
    pub status: DebtStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Debt {
    pub fn new(name: impl Into<String>, amount: f64, is_debt: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: None,
            amount,
            person: None,
            is_debt,
            status: DebtStatus::Active,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Read-time lateness check; never mutates `status`.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.amount > 0.0 && self.due_date.is_some_and(|due| due < today)
    }
}

impl Identifiable for Debt {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Debt {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Debt {
    fn display_label(&self) -> String {
        let direction = if self.is_debt { "owed" } else { "loaned" };
        format!("{} ({}, {})", self.name, direction, self.status)
    }
}

/// Lifecycle states for a debt. Only `Active` and `PaidOff` are managed
/// automatically by the allocation ledger; the rest are user-set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DebtStatus {
    Active,
    #[serde(rename = "Paid Off")]
    PaidOff,
    Overdue,
    #[serde(rename = "In Collections")]
    InCollections,
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DebtStatus::Active => "Active",
            DebtStatus::PaidOff => "Paid Off",
            DebtStatus::Overdue => "Overdue",
            DebtStatus::InCollections => "In Collections",
        };
        f.write_str(label)
    }
}

impl DebtStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(DebtStatus::Active),
            "paid off" | "paid-off" | "paidoff" => Some(DebtStatus::PaidOff),
            "overdue" => Some(DebtStatus::Overdue),
            "in collections" | "collections" => Some(DebtStatus::InCollections),
            _ => None,
        }
    }
}
