use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;

/// A planned amount for an account in a given month. Planning only; carries
/// no consistency obligation with the account balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAllocation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: f64,
    /// Month key in `YYYY-MM` form.
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BudgetAllocation {
    pub fn new(account_id: Uuid, amount: f64, month: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            month: month.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Identifiable for BudgetAllocation {
    fn id(&self) -> Uuid {
        self.id
    }
}
