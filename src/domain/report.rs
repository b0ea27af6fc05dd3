//! Immutable point-in-time financial report snapshots.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;
use crate::domain::debt::DebtStatus;

/// A frozen copy of account and debt state plus computed totals. Never
/// mutated after creation; removed only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialReport {
    pub id: Uuid,
    /// Month key in `YYYY-MM` form, derived from the snapshot date.
    pub month: String,
    pub kind: ReportKind,
    pub name: String,
    pub accounts: Vec<AccountSnapshot>,
    pub debts: Vec<DebtSnapshot>,
    pub expenses_by_category: BTreeMap<String, f64>,
    pub totals: ReportTotals,
    pub metadata: ReportMetadata,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for FinancialReport {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// The account fields that survive into a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub balance: f64,
}

/// The debt fields that survive into a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebtSnapshot {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub is_debt: bool,
    pub status: DebtStatus,
}

/// Aggregate totals computed at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportTotals {
    pub total_assets: f64,
    pub total_debts: f64,
    pub total_loans: f64,
    pub net_worth: f64,
    pub monthly_expenses: f64,
}

/// Collection counts recorded for audit and debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportMetadata {
    pub account_count: usize,
    pub debt_count: usize,
    pub expense_count: usize,
    pub category_count: usize,
}

/// Cadence or origin of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Monthly,
    Quarterly,
    Annual,
    Custom,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportKind::Monthly => "Monthly",
            ReportKind::Quarterly => "Quarterly",
            ReportKind::Annual => "Annual",
            ReportKind::Custom => "Custom",
        };
        f.write_str(label)
    }
}

impl ReportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(ReportKind::Monthly),
            "quarterly" => Some(ReportKind::Quarterly),
            "annual" | "yearly" => Some(ReportKind::Annual),
            "custom" => Some(ReportKind::Custom),
            _ => None,
        }
    }
}
