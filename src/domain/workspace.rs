use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account, budget::BudgetAllocation, category::Category, debt::Debt, expense::Expense,
    expense::AllocationTarget, report::FinancialReport, transfer::Transfer,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// The per-user document holding every tracked collection. Persisted and
/// replaced wholesale; views receive full snapshots, never diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    /// Opaque user identifier supplied by the session layer.
    pub owner: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    #[serde(default)]
    pub budget_allocations: Vec<BudgetAllocation>,
    #[serde(default)]
    pub reports: Vec<FinancialReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Workspace::schema_version_default")]
    pub schema_version: u8,
}

impl Workspace {
    pub fn new(owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            accounts: Vec::new(),
            debts: Vec::new(),
            categories: Vec::new(),
            expenses: Vec::new(),
            transfers: Vec::new(),
            budget_allocations: Vec::new(),
            reports: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn add_debt(&mut self, debt: Debt) -> Uuid {
        let id = debt.id;
        self.debts.push(debt);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_expense(&mut self, expense: Expense) -> Uuid {
        let id = expense.id;
        self.expenses.push(expense);
        self.touch();
        id
    }

    pub fn add_transfer(&mut self, transfer: Transfer) -> Uuid {
        let id = transfer.id;
        self.transfers.push(transfer);
        self.touch();
        id
    }

    pub fn add_budget_allocation(&mut self, allocation: BudgetAllocation) -> Uuid {
        let id = allocation.id;
        self.budget_allocations.push(allocation);
        self.touch();
        id
    }

    pub fn add_report(&mut self, report: FinancialReport) -> Uuid {
        let id = report.id;
        self.reports.push(report);
        self.touch();
        id
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    /// Exact name match, as the legacy category encoding requires.
    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.name == name)
    }

    pub fn debt(&self, id: Uuid) -> Option<&Debt> {
        self.debts.iter().find(|debt| debt.id == id)
    }

    pub fn debt_mut(&mut self, id: Uuid) -> Option<&mut Debt> {
        self.debts.iter_mut().find(|debt| debt.id == id)
    }

    pub fn debt_by_name(&self, name: &str) -> Option<&Debt> {
        self.debts.iter().find(|debt| debt.name == name)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: Uuid) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn expense(&self, id: Uuid) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub fn expense_mut(&mut self, id: Uuid) -> Option<&mut Expense> {
        self.expenses.iter_mut().find(|expense| expense.id == id)
    }

    pub fn remove_expense(&mut self, id: Uuid) -> Option<Expense> {
        let index = self.expenses.iter().position(|expense| expense.id == id)?;
        let removed = self.expenses.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn transfer(&self, id: Uuid) -> Option<&Transfer> {
        self.transfers.iter().find(|transfer| transfer.id == id)
    }

    pub fn remove_transfer(&mut self, id: Uuid) -> Option<Transfer> {
        let index = self
            .transfers
            .iter()
            .position(|transfer| transfer.id == id)?;
        let removed = self.transfers.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn budget_allocation(&self, id: Uuid) -> Option<&BudgetAllocation> {
        self.budget_allocations
            .iter()
            .find(|allocation| allocation.id == id)
    }

    pub fn budget_allocation_mut(&mut self, id: Uuid) -> Option<&mut BudgetAllocation> {
        self.budget_allocations
            .iter_mut()
            .find(|allocation| allocation.id == id)
    }

    pub fn remove_budget_allocation(&mut self, id: Uuid) -> Option<BudgetAllocation> {
        let index = self
            .budget_allocations
            .iter()
            .position(|allocation| allocation.id == id)?;
        let removed = self.budget_allocations.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn report(&self, id: Uuid) -> Option<&FinancialReport> {
        self.reports.iter().find(|report| report.id == id)
    }

    pub fn remove_report(&mut self, id: Uuid) -> Option<FinancialReport> {
        let index = self.reports.iter().position(|report| report.id == id)?;
        let removed = self.reports.remove(index);
        self.touch();
        Some(removed)
    }

    /// Display label for an allocation target, resolving mirrored ids back
    /// to the reserved `Account: <name>` / `Debt: <name>` form. Unresolvable
    /// ids fall back to the raw id so the label never fails.
    pub fn target_label(&self, target: &AllocationTarget) -> String {
        match target {
            AllocationTarget::Category(name) => name.clone(),
            AllocationTarget::AccountDeposit(id) => match self.account(*id) {
                Some(account) => format!("Account: {}", account.name),
                None => format!("Account: {id}"),
            },
            AllocationTarget::DebtPayment(id) => match self.debt(*id) {
                Some(debt) => format!("Debt: {}", debt.name),
                None => format!("Debt: {id}"),
            },
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
