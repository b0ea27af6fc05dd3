use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Transfer, Workspace};

use super::{ServiceError, ServiceResult};

/// Input for recording a transfer between two accounts.
#[derive(Debug, Clone)]
pub struct TransferDraft {
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Moves money between accounts. Recording debits the source and credits
/// the destination; removal reverses both sides.
pub struct TransferService;

impl TransferService {
    pub fn record(workspace: &mut Workspace, draft: TransferDraft) -> ServiceResult<Uuid> {
        if draft.from_account == draft.to_account {
            return Err(ServiceError::Invalid(
                "Source and destination accounts must differ".into(),
            ));
        }
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(ServiceError::Invalid(
                "Transfer amount must be greater than zero".into(),
            ));
        }
        if workspace.account(draft.from_account).is_none() {
            return Err(ServiceError::Invalid("Source account not found".into()));
        }
        if workspace.account(draft.to_account).is_none() {
            return Err(ServiceError::Invalid(
                "Destination account not found".into(),
            ));
        }

        // Both endpoints verified above.
        if let Some(source) = workspace.account_mut(draft.from_account) {
            source.balance -= draft.amount;
        }
        if let Some(destination) = workspace.account_mut(draft.to_account) {
            destination.balance += draft.amount;
        }

        let mut transfer = Transfer::new(
            draft.from_account,
            draft.to_account,
            draft.amount,
            draft.date,
        );
        transfer.description = draft.description;
        Ok(workspace.add_transfer(transfer))
    }

    /// Removes a transfer and reverses the balance movement. A missing
    /// endpoint is logged and skipped; the transfer record still goes away.
    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<Transfer> {
        let transfer = workspace
            .transfer(id)
            .cloned()
            .ok_or_else(|| ServiceError::Invalid("Transfer not found".into()))?;

        match workspace.account_mut(transfer.from_account) {
            Some(source) => source.balance += transfer.amount,
            None => {
                tracing::warn!(transfer = %id, "source account missing, skipping reversal")
            }
        }
        match workspace.account_mut(transfer.to_account) {
            Some(destination) => destination.balance -= transfer.amount,
            None => {
                tracing::warn!(transfer = %id, "destination account missing, skipping reversal")
            }
        }

        workspace.remove_transfer(id);
        Ok(transfer)
    }

    /// Transfers ordered by date descending, newest first.
    pub fn list(workspace: &Workspace) -> Vec<&Transfer> {
        let mut transfers: Vec<&Transfer> = workspace.transfers.iter().collect();
        transfers.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        transfers
    }
}
