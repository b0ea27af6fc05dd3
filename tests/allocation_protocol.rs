//! End-to-end checks for the mirrored-balance consistency protocol.

use chrono::{TimeZone, Utc};
use fintrack_core::{
    core::services::{AllocationDraft, AllocationService, AllocationUpdate},
    domain::{Account, AccountKind, AllocationTarget, Debt, DebtStatus, Workspace},
};

fn deposit_draft(workspace: &Workspace, account_name: &str, amount: f64) -> AllocationDraft {
    let account = workspace.account_by_name(account_name).expect("account");
    AllocationDraft::new(
        format!("Deposit to {account_name}"),
        amount,
        AllocationTarget::AccountDeposit(account.id),
    )
}

fn payment_draft(workspace: &Workspace, debt_name: &str, amount: f64) -> AllocationDraft {
    let debt = workspace.debt_by_name(debt_name).expect("debt");
    AllocationDraft::new(
        format!("Payment on {debt_name}"),
        amount,
        AllocationTarget::DebtPayment(debt.id),
    )
}

#[test]
fn account_deposit_round_trip_restores_the_starting_balance() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_account(Account::new("Checking", AccountKind::Checking, 500.0));

    let draft = deposit_draft(&workspace, "Checking", 100.0);
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    assert_eq!(
        workspace.account_by_name("Checking").unwrap().balance,
        600.0
    );

    AllocationService::retract(&mut workspace, outcome.entry_id).unwrap();
    assert_eq!(
        workspace.account_by_name("Checking").unwrap().balance,
        500.0
    );
}

#[test]
fn full_payoff_flips_status_and_delete_restores_it() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_debt(Debt::new("Car Loan", 1000.0, true));

    let draft = payment_draft(&workspace, "Car Loan", 1000.0);
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    {
        let debt = workspace.debt_by_name("Car Loan").unwrap();
        assert_eq!(debt.amount, 0.0);
        assert_eq!(debt.status, DebtStatus::PaidOff);
    }

    AllocationService::retract(&mut workspace, outcome.entry_id).unwrap();
    let debt = workspace.debt_by_name("Car Loan").unwrap();
    assert_eq!(debt.amount, 1000.0);
    assert_eq!(debt.status, DebtStatus::Active);
}

#[test]
fn same_target_revision_moves_exactly_the_difference() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_debt(Debt::new("Card", 800.0, true));
    let debt_id = workspace.debt_by_name("Card").unwrap().id;

    let draft = payment_draft(&workspace, "Card", 300.0);
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    assert_eq!(workspace.debt(debt_id).unwrap().amount, 500.0);

    AllocationService::revise(
        &mut workspace,
        outcome.entry_id,
        AllocationUpdate {
            name: "Payment on Card".into(),
            amount: 100.0,
            target: AllocationTarget::DebtPayment(debt_id),
            notes: None,
        },
    )
    .unwrap();
    // Paying 200 less restores 200 onto the debt.
    assert_eq!(workspace.debt(debt_id).unwrap().amount, 700.0);
    assert_eq!(workspace.debt(debt_id).unwrap().status, DebtStatus::Active);
}

#[test]
fn target_change_revision_reverses_old_and_applies_new() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_account(Account::new("Checking", AccountKind::Checking, 500.0));
    workspace.add_debt(Debt::new("Card", 800.0, true));
    let account_id = workspace.account_by_name("Checking").unwrap().id;
    let debt_id = workspace.debt_by_name("Card").unwrap().id;

    let draft = deposit_draft(&workspace, "Checking", 150.0);
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    assert_eq!(workspace.account(account_id).unwrap().balance, 650.0);

    AllocationService::revise(
        &mut workspace,
        outcome.entry_id,
        AllocationUpdate {
            name: "Reallocated".into(),
            amount: 150.0,
            target: AllocationTarget::DebtPayment(debt_id),
            notes: None,
        },
    )
    .unwrap();

    assert_eq!(workspace.account(account_id).unwrap().balance, 500.0);
    assert_eq!(workspace.debt(debt_id).unwrap().amount, 650.0);
}

#[test]
fn overpayment_clamps_and_retract_restores_the_full_amount() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_debt(Debt::new("Small", 100.0, true));
    let debt_id = workspace.debt_by_name("Small").unwrap().id;

    let draft = payment_draft(&workspace, "Small", 250.0);
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    assert_eq!(workspace.debt(debt_id).unwrap().amount, 0.0);
    assert_eq!(workspace.debt(debt_id).unwrap().status, DebtStatus::PaidOff);

    // Delete adds back the full recorded amount, not the clamped delta.
    AllocationService::retract(&mut workspace, outcome.entry_id).unwrap();
    assert_eq!(workspace.debt(debt_id).unwrap().amount, 250.0);
    assert_eq!(workspace.debt(debt_id).unwrap().status, DebtStatus::Active);
}

#[test]
fn plain_category_entries_have_no_mirror_effect() {
    let mut workspace = Workspace::new("protocol");
    workspace.add_account(Account::new("Checking", AccountKind::Checking, 500.0));
    workspace.add_debt(Debt::new("Card", 800.0, true));

    let mut draft = AllocationDraft::new("Lunch", 12.0, AllocationTarget::Category("Food".into()));
    draft.date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let outcome = AllocationService::record(&mut workspace, draft).unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(
        workspace.account_by_name("Checking").unwrap().balance,
        500.0
    );
    assert_eq!(workspace.debt_by_name("Card").unwrap().amount, 800.0);
}
