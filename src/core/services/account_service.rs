use uuid::Uuid;

use crate::domain::{Account, AccountKind, Workspace};

use super::{ServiceError, ServiceResult};

/// CRUD over accounts. Balances normally move only through allocation
/// entries and transfers; `set_balance` is the manual correction path.
pub struct AccountService;

impl AccountService {
    pub fn create(
        workspace: &mut Workspace,
        name: &str,
        kind: AccountKind,
        balance: f64,
    ) -> ServiceResult<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Invalid(
                "Account name must not be empty".into(),
            ));
        }
        if workspace.account_by_name(name).is_some() {
            return Err(ServiceError::Invalid(format!(
                "An account named '{name}' already exists"
            )));
        }
        Ok(workspace.add_account(Account::new(name, kind, balance)))
    }

    pub fn rename(workspace: &mut Workspace, id: Uuid, new_name: &str) -> ServiceResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ServiceError::Invalid(
                "Account name must not be empty".into(),
            ));
        }
        if workspace
            .account_by_name(new_name)
            .is_some_and(|existing| existing.id != id)
        {
            return Err(ServiceError::Invalid(format!(
                "An account named '{new_name}' already exists"
            )));
        }
        let account = workspace
            .account_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))?;
        account.name = new_name.to_string();
        workspace.touch();
        Ok(())
    }

    /// Direct balance override, bypassing the mirrored ledger. Logged so a
    /// balance that disagrees with its entry history can be traced back.
    pub fn set_balance(workspace: &mut Workspace, id: Uuid, balance: f64) -> ServiceResult<()> {
        let account = workspace
            .account_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))?;
        tracing::info!(account = %account.name, old = account.balance, new = balance, "manual balance override");
        account.balance = balance;
        workspace.touch();
        Ok(())
    }

    pub fn set_description(
        workspace: &mut Workspace,
        id: Uuid,
        description: Option<String>,
    ) -> ServiceResult<()> {
        let account = workspace
            .account_mut(id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))?;
        account.description = description;
        workspace.touch();
        Ok(())
    }

    /// Removes an account. Entries, transfers, or budget allocations that
    /// still reference it become orphans reported by the integrity scan.
    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<Account> {
        let index = workspace
            .accounts
            .iter()
            .position(|account| account.id == id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))?;
        let removed = workspace.accounts.remove(index);
        workspace.touch();
        Ok(removed)
    }

    /// Accounts in name order for display.
    pub fn list(workspace: &Workspace) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = workspace.accounts.iter().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }
}
