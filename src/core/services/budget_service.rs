use uuid::Uuid;

use crate::domain::common::parse_month_key;
use crate::domain::{BudgetAllocation, Workspace};

use super::{ServiceError, ServiceResult};

/// CRUD over monthly budget allocations. These are planning records only;
/// they never touch account balances.
pub struct BudgetService;

impl BudgetService {
    pub fn create(
        workspace: &mut Workspace,
        account_id: Uuid,
        amount: f64,
        month: &str,
        description: Option<String>,
    ) -> ServiceResult<Uuid> {
        Self::validate_month(month)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::Invalid(
                "Allocation amount must be greater than zero".into(),
            ));
        }
        if workspace.account(account_id).is_none() {
            return Err(ServiceError::Invalid("Account not found".into()));
        }
        let mut allocation = BudgetAllocation::new(account_id, amount, month);
        allocation.description = description;
        Ok(workspace.add_budget_allocation(allocation))
    }

    pub fn update(
        workspace: &mut Workspace,
        id: Uuid,
        amount: f64,
        month: &str,
        description: Option<String>,
    ) -> ServiceResult<()> {
        Self::validate_month(month)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::Invalid(
                "Allocation amount must be greater than zero".into(),
            ));
        }
        let allocation = workspace
            .budget_allocation_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Budget allocation not found".into()))?;
        allocation.amount = amount;
        allocation.month = month.to_string();
        allocation.description = description;
        workspace.touch();
        Ok(())
    }

    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<BudgetAllocation> {
        workspace
            .remove_budget_allocation(id)
            .ok_or_else(|| ServiceError::Invalid("Budget allocation not found".into()))
    }

    /// Allocations for `month`, or all of them, newest month first.
    pub fn list<'a>(workspace: &'a Workspace, month: Option<&str>) -> Vec<&'a BudgetAllocation> {
        let mut allocations: Vec<&BudgetAllocation> = workspace
            .budget_allocations
            .iter()
            .filter(|allocation| month.map_or(true, |m| allocation.month == m))
            .collect();
        allocations.sort_by(|a, b| b.month.cmp(&a.month).then(b.created_at.cmp(&a.created_at)));
        allocations
    }

    /// Total planned for an account in a month.
    pub fn allocated_for(workspace: &Workspace, account_id: Uuid, month: &str) -> f64 {
        workspace
            .budget_allocations
            .iter()
            .filter(|allocation| allocation.account_id == account_id && allocation.month == month)
            .map(|allocation| allocation.amount)
            .sum()
    }

    fn validate_month(month: &str) -> ServiceResult<()> {
        if parse_month_key(month).is_none() {
            return Err(ServiceError::Invalid(format!(
                "'{month}' is not a valid YYYY-MM month"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountKind};

    fn workspace_with_account() -> (Workspace, Uuid) {
        let mut workspace = Workspace::new("tests");
        let id = workspace.add_account(Account::new("Checking", AccountKind::Checking, 0.0));
        (workspace, id)
    }

    #[test]
    fn create_validates_the_month_key() {
        let (mut workspace, account_id) = workspace_with_account();
        for bad in ["2024", "2024-13", "05-2024", "next month"] {
            let err = BudgetService::create(&mut workspace, account_id, 100.0, bad, None)
                .expect_err("bad month must fail");
            assert!(matches!(err, ServiceError::Invalid(_)), "accepted {bad}");
        }
        BudgetService::create(&mut workspace, account_id, 100.0, "2024-05", None).unwrap();
    }

    #[test]
    fn create_requires_an_existing_account() {
        let (mut workspace, _) = workspace_with_account();
        let err = BudgetService::create(&mut workspace, Uuid::new_v4(), 100.0, "2024-05", None)
            .expect_err("unknown account must fail");
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[test]
    fn list_filters_by_month() {
        let (mut workspace, account_id) = workspace_with_account();
        BudgetService::create(&mut workspace, account_id, 100.0, "2024-05", None).unwrap();
        BudgetService::create(&mut workspace, account_id, 200.0, "2024-06", None).unwrap();

        let may = BudgetService::list(&workspace, Some("2024-05"));
        assert_eq!(may.len(), 1);
        assert_eq!(may[0].amount, 100.0);

        let all = BudgetService::list(&workspace, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].month, "2024-06", "newest month first");
    }

    #[test]
    fn allocated_for_sums_per_account_and_month() {
        let (mut workspace, account_id) = workspace_with_account();
        let other = workspace.add_account(Account::new("Savings", AccountKind::Savings, 0.0));
        BudgetService::create(&mut workspace, account_id, 100.0, "2024-05", None).unwrap();
        BudgetService::create(&mut workspace, account_id, 50.0, "2024-05", None).unwrap();
        BudgetService::create(&mut workspace, other, 999.0, "2024-05", None).unwrap();

        assert_eq!(
            BudgetService::allocated_for(&workspace, account_id, "2024-05"),
            150.0
        );
        assert_eq!(
            BudgetService::allocated_for(&workspace, account_id, "2024-06"),
            0.0
        );
    }

    #[test]
    fn update_replaces_all_fields() {
        let (mut workspace, account_id) = workspace_with_account();
        let id =
            BudgetService::create(&mut workspace, account_id, 100.0, "2024-05", None).unwrap();
        BudgetService::update(&mut workspace, id, 250.0, "2024-06", Some("revised".into()))
            .unwrap();
        let allocation = workspace.budget_allocation(id).unwrap();
        assert_eq!(allocation.amount, 250.0);
        assert_eq!(allocation.month, "2024-06");
        assert_eq!(allocation.description.as_deref(), Some("revised"));
    }
}
