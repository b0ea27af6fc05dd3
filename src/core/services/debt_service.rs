use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Debt, DebtStatus, Workspace};

use super::{ServiceError, ServiceResult};

/// CRUD over debts and loans. Amounts normally move through debt-payment
/// allocation entries; edits here are manual corrections.
pub struct DebtService;

impl DebtService {
    pub fn create(
        workspace: &mut Workspace,
        name: &str,
        amount: f64,
        is_debt: bool,
    ) -> ServiceResult<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Invalid("Debt name must not be empty".into()));
        }
        if workspace.debt_by_name(name).is_some() {
            return Err(ServiceError::Invalid(format!(
                "A debt named '{name}' already exists"
            )));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(ServiceError::Invalid(
                "Debt amount must be zero or positive".into(),
            ));
        }
        Ok(workspace.add_debt(Debt::new(name, amount, is_debt)))
    }

    /// Manual amount override. Status follows the ledger rule so the two
    /// fields cannot disagree: zero means paid off, above zero reactivates
    /// a paid-off debt but leaves user-set states alone.
    pub fn set_amount(workspace: &mut Workspace, id: Uuid, amount: f64) -> ServiceResult<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ServiceError::Invalid(
                "Debt amount must be zero or positive".into(),
            ));
        }
        let debt = workspace
            .debt_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Debt not found".into()))?;
        debt.amount = amount;
        if amount == 0.0 {
            debt.status = DebtStatus::PaidOff;
        } else if debt.status == DebtStatus::PaidOff {
            debt.status = DebtStatus::Active;
        }
        workspace.touch();
        Ok(())
    }

    pub fn set_status(workspace: &mut Workspace, id: Uuid, status: DebtStatus) -> ServiceResult<()> {
        let debt = workspace
            .debt_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Debt not found".into()))?;
        debt.status = status;
        workspace.touch();
        Ok(())
    }

    pub fn set_due_date(
        workspace: &mut Workspace,
        id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> ServiceResult<()> {
        let debt = workspace
            .debt_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Debt not found".into()))?;
        debt.due_date = due_date;
        workspace.touch();
        Ok(())
    }

    pub fn set_person(
        workspace: &mut Workspace,
        id: Uuid,
        person: Option<String>,
    ) -> ServiceResult<()> {
        let debt = workspace
            .debt_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Debt not found".into()))?;
        debt.person = person;
        workspace.touch();
        Ok(())
    }

    /// Removes a debt. Payment entries that still reference it become
    /// orphans reported by the integrity scan.
    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<Debt> {
        let index = workspace
            .debts
            .iter()
            .position(|debt| debt.id == id)
            .ok_or_else(|| ServiceError::Invalid("Debt not found".into()))?;
        let removed = workspace.debts.remove(index);
        workspace.touch();
        Ok(removed)
    }

    /// Debts in name order for display.
    pub fn list(workspace: &Workspace) -> Vec<&Debt> {
        let mut debts: Vec<&Debt> = workspace.debts.iter().collect();
        debts.sort_by(|a, b| a.name.cmp(&b.name));
        debts
    }

    /// Debts whose due date has passed while a balance remains.
    pub fn past_due(workspace: &Workspace, today: NaiveDate) -> Vec<&Debt> {
        workspace
            .debts
            .iter()
            .filter(|debt| debt.is_past_due(today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_negative_amounts() {
        let mut workspace = Workspace::new("tests");
        let err = DebtService::create(&mut workspace, "Loan", -5.0, true)
            .expect_err("negative amount must fail");
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[test]
    fn set_amount_zero_marks_paid_off() {
        let mut workspace = Workspace::new("tests");
        let id = DebtService::create(&mut workspace, "Card", 300.0, true).unwrap();
        DebtService::set_amount(&mut workspace, id, 0.0).unwrap();
        assert_eq!(workspace.debt(id).unwrap().status, DebtStatus::PaidOff);

        DebtService::set_amount(&mut workspace, id, 50.0).unwrap();
        assert_eq!(workspace.debt(id).unwrap().status, DebtStatus::Active);
    }

    #[test]
    fn set_amount_keeps_user_set_status() {
        let mut workspace = Workspace::new("tests");
        let id = DebtService::create(&mut workspace, "Card", 300.0, true).unwrap();
        DebtService::set_status(&mut workspace, id, DebtStatus::InCollections).unwrap();
        DebtService::set_amount(&mut workspace, id, 250.0).unwrap();
        assert_eq!(
            workspace.debt(id).unwrap().status,
            DebtStatus::InCollections
        );
    }

    #[test]
    fn past_due_requires_remaining_balance() {
        let mut workspace = Workspace::new("tests");
        let overdue = DebtService::create(&mut workspace, "Overdue", 100.0, true).unwrap();
        let settled = DebtService::create(&mut workspace, "Settled", 0.0, true).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DebtService::set_due_date(&mut workspace, overdue, Some(due)).unwrap();
        DebtService::set_due_date(&mut workspace, settled, Some(due)).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let late = DebtService::past_due(&workspace, today);
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].name, "Overdue");
    }
}
