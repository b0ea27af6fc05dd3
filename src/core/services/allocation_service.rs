//! The allocation ledger: expense entries plus the mirrored-balance
//! consistency protocol for entries that target an account or a debt.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::expense::{parse_label, ParsedLabel};
use crate::domain::{AllocationTarget, DebtStatus, Expense, Workspace};

use super::{ServiceError, ServiceResult};

/// Input for recording a new allocation entry.
#[derive(Debug, Clone)]
pub struct AllocationDraft {
    pub name: String,
    pub amount: f64,
    pub target: AllocationTarget,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl AllocationDraft {
    pub fn new(name: impl Into<String>, amount: f64, target: AllocationTarget) -> Self {
        Self {
            name: name.into(),
            amount,
            target,
            notes: None,
            date: None,
        }
    }
}

/// Full replacement fields for revising an entry. Entries are never
/// partially patched; the update path carries every editable field.
#[derive(Debug, Clone)]
pub struct AllocationUpdate {
    pub name: String,
    pub amount: f64,
    pub target: AllocationTarget,
    pub notes: Option<String>,
}

/// A mirror step that could not be applied because its target no longer
/// resolves. Non-fatal: the entry operation itself still succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorWarning {
    pub entry_id: Uuid,
    pub target: AllocationTarget,
}

impl fmt::Display for MirrorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocation {} could not update its linked target ({})",
            self.entry_id, self.target
        )
    }
}

/// Optional constraints for listing entries. Date bounds are inclusive
/// and compare against the entry's calendar date.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub target: Option<AllocationTarget>,
}

/// What a ledger mutation did, including any skipped mirror steps the
/// caller must surface. Silent failure is never acceptable here.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub entry_id: Uuid,
    pub warnings: Vec<MirrorWarning>,
}

/// Maintains the expense collection and keeps mirrored account balances
/// and debt amounts consistent under create, revise, and retract.
pub struct AllocationService;

impl AllocationService {
    /// Records a new entry and applies its mirror effect. A mirrored
    /// target that fails to resolve is reported, not fatal: the entry is
    /// still inserted.
    pub fn record(
        workspace: &mut Workspace,
        draft: AllocationDraft,
    ) -> ServiceResult<AllocationOutcome> {
        Self::validate(&draft.name, draft.amount)?;

        let mut expense = Expense::new(draft.name, draft.amount, draft.target.clone());
        if let Some(date) = draft.date {
            expense = expense.with_date(date);
        }
        if let Some(notes) = draft.notes {
            expense = expense.with_notes(notes);
        }
        let entry_id = expense.id;

        let mut warnings = Vec::new();
        if let Some(warning) = Self::apply_forward(workspace, entry_id, &draft.target, draft.amount)
        {
            warnings.push(warning);
        }
        workspace.add_expense(expense);
        Ok(AllocationOutcome { entry_id, warnings })
    }

    /// Revises an entry. With an unchanged target the signed amount
    /// difference is applied to the linked entity; a changed target is
    /// treated as retract-old plus record-new (reverse the old target in
    /// full, apply the new target in full) rather than as a difference
    /// against a single entity.
    pub fn revise(
        workspace: &mut Workspace,
        id: Uuid,
        update: AllocationUpdate,
    ) -> ServiceResult<AllocationOutcome> {
        Self::validate(&update.name, update.amount)?;
        let original = workspace
            .expense(id)
            .cloned()
            .ok_or_else(|| ServiceError::Invalid("Allocation entry not found".into()))?;

        let mut warnings = Vec::new();
        if original.target == update.target {
            let difference = update.amount - original.amount;
            if difference != 0.0 {
                if let Some(warning) =
                    Self::apply_difference(workspace, id, &update.target, difference)
                {
                    warnings.push(warning);
                }
            }
        } else {
            if let Some(warning) =
                Self::apply_reverse(workspace, id, &original.target, original.amount)
            {
                warnings.push(warning);
            }
            if let Some(warning) = Self::apply_forward(workspace, id, &update.target, update.amount)
            {
                warnings.push(warning);
            }
        }

        // Lookup cannot fail here; existence was checked above.
        if let Some(entry) = workspace.expense_mut(id) {
            entry.name = update.name;
            entry.amount = update.amount;
            entry.target = update.target;
            entry.notes = update.notes;
        }
        workspace.touch();
        Ok(AllocationOutcome {
            entry_id: id,
            warnings,
        })
    }

    /// Removes an entry after reversing its mirror effect.
    pub fn retract(workspace: &mut Workspace, id: Uuid) -> ServiceResult<AllocationOutcome> {
        let entry = workspace
            .expense(id)
            .cloned()
            .ok_or_else(|| ServiceError::Invalid("Allocation entry not found".into()))?;

        let mut warnings = Vec::new();
        if let Some(warning) = Self::apply_reverse(workspace, id, &entry.target, entry.amount) {
            warnings.push(warning);
        }
        workspace.remove_expense(id);
        Ok(AllocationOutcome {
            entry_id: id,
            warnings,
        })
    }

    /// Entries ordered by date descending, newest first. Ties fall back to
    /// creation time so equal-dated output stays deterministic.
    pub fn list(workspace: &Workspace) -> Vec<&Expense> {
        Self::list_filtered(workspace, &EntryFilter::default())
    }

    /// Like [`list`](Self::list), constrained by an inclusive date range
    /// and/or an exact target match.
    pub fn list_filtered<'a>(workspace: &'a Workspace, filter: &EntryFilter) -> Vec<&'a Expense> {
        let mut entries: Vec<&Expense> = workspace
            .expenses
            .iter()
            .filter(|entry| {
                let date = entry.date.date_naive();
                filter.from.map_or(true, |from| date >= from)
                    && filter.to.map_or(true, |to| date <= to)
                    && filter
                        .target
                        .as_ref()
                        .map_or(true, |target| entry.target == *target)
            })
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        entries
    }

    /// Resolves a legacy category label (`Account: <name>` / `Debt: <name>`
    /// or a plain category) to a typed target. Unresolvable mirrored names
    /// stay as plain categories so the entry can still be recorded; the
    /// mirror step will then report its warning.
    pub fn target_from_label(workspace: &Workspace, label: &str) -> AllocationTarget {
        match parse_label(label) {
            ParsedLabel::Account(name) => match workspace.account_by_name(name) {
                Some(account) => AllocationTarget::AccountDeposit(account.id),
                None => {
                    tracing::warn!(label, "account name did not resolve, keeping plain label");
                    AllocationTarget::Category(label.to_string())
                }
            },
            ParsedLabel::Debt(name) => match workspace.debt_by_name(name) {
                Some(debt) => AllocationTarget::DebtPayment(debt.id),
                None => {
                    tracing::warn!(label, "debt name did not resolve, keeping plain label");
                    AllocationTarget::Category(label.to_string())
                }
            },
            ParsedLabel::Category(_) => AllocationTarget::Category(label.to_string()),
        }
    }

    fn validate(name: &str, amount: f64) -> ServiceResult<()> {
        if name.trim().is_empty() {
            return Err(ServiceError::Invalid("Entry name must not be empty".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::Invalid(
                "Entry amount must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Applies the create-direction mirror effect: deposit into an
    /// account, or payment against a debt with the zero clamp.
    fn apply_forward(
        workspace: &mut Workspace,
        entry_id: Uuid,
        target: &AllocationTarget,
        amount: f64,
    ) -> Option<MirrorWarning> {
        match target {
            AllocationTarget::Category(label) => Self::reserved_label_warning(entry_id, label),
            AllocationTarget::AccountDeposit(account_id) => {
                match workspace.account_mut(*account_id) {
                    Some(account) => {
                        account.balance += amount;
                        tracing::debug!(%entry_id, account = %account.name, amount, "applied account deposit");
                        None
                    }
                    None => Self::warn(entry_id, target),
                }
            }
            AllocationTarget::DebtPayment(debt_id) => match workspace.debt_mut(*debt_id) {
                Some(debt) => {
                    debt.amount = (debt.amount - amount).max(0.0);
                    if debt.amount == 0.0 {
                        debt.status = DebtStatus::PaidOff;
                    }
                    tracing::debug!(%entry_id, debt = %debt.name, amount, "applied debt payment");
                    None
                }
                None => Self::warn(entry_id, target),
            },
        }
    }

    /// Applies the delete-direction inverse: withdraw the deposit, or add
    /// the payment back onto the debt, reactivating it when it rises
    /// above zero.
    fn apply_reverse(
        workspace: &mut Workspace,
        entry_id: Uuid,
        target: &AllocationTarget,
        amount: f64,
    ) -> Option<MirrorWarning> {
        match target {
            AllocationTarget::Category(label) => Self::reserved_label_warning(entry_id, label),
            AllocationTarget::AccountDeposit(account_id) => {
                match workspace.account_mut(*account_id) {
                    Some(account) => {
                        account.balance -= amount;
                        tracing::debug!(%entry_id, account = %account.name, amount, "reversed account deposit");
                        None
                    }
                    None => Self::warn(entry_id, target),
                }
            }
            AllocationTarget::DebtPayment(debt_id) => match workspace.debt_mut(*debt_id) {
                Some(debt) => {
                    debt.amount += amount;
                    if debt.amount > 0.0 {
                        debt.status = DebtStatus::Active;
                    }
                    tracing::debug!(%entry_id, debt = %debt.name, amount, "reversed debt payment");
                    None
                }
                None => Self::warn(entry_id, target),
            },
        }
    }

    /// Applies a signed amount difference for a same-target revision.
    /// Debt status follows the create rule: only an exact zero flips the
    /// status to paid off.
    fn apply_difference(
        workspace: &mut Workspace,
        entry_id: Uuid,
        target: &AllocationTarget,
        difference: f64,
    ) -> Option<MirrorWarning> {
        match target {
            AllocationTarget::Category(label) => Self::reserved_label_warning(entry_id, label),
            AllocationTarget::AccountDeposit(account_id) => {
                match workspace.account_mut(*account_id) {
                    Some(account) => {
                        account.balance += difference;
                        None
                    }
                    None => Self::warn(entry_id, target),
                }
            }
            AllocationTarget::DebtPayment(debt_id) => match workspace.debt_mut(*debt_id) {
                Some(debt) => {
                    debt.amount = (debt.amount - difference).max(0.0);
                    if debt.amount == 0.0 {
                        debt.status = DebtStatus::PaidOff;
                    }
                    None
                }
                None => Self::warn(entry_id, target),
            },
        }
    }

    /// A plain label that still carries a reserved prefix means an earlier
    /// name resolution failed. The entry stays plain, but the skipped
    /// mirror step is surfaced instead of passing silently.
    fn reserved_label_warning(entry_id: Uuid, label: &str) -> Option<MirrorWarning> {
        match parse_label(label) {
            ParsedLabel::Category(_) => None,
            ParsedLabel::Account(_) | ParsedLabel::Debt(_) => {
                Self::warn(entry_id, &AllocationTarget::Category(label.to_string()))
            }
        }
    }

    fn warn(entry_id: Uuid, target: &AllocationTarget) -> Option<MirrorWarning> {
        let warning = MirrorWarning {
            entry_id,
            target: target.clone(),
        };
        tracing::warn!(%warning, "skipped mirror update");
        Some(warning)
    }
}
