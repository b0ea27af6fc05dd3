//! Pure aggregate computations over entity snapshots.
//!
//! Every function here is deterministic and side-effect free: derived
//! totals are recomputed from the collections each time instead of being
//! cached as separately mutable state that could drift.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::common::{month_key, shift_month_start};
use crate::domain::{Account, AllocationTarget, Debt, Expense};

/// Budget left after subtracting every entry amount from the total.
pub fn remaining_balance(total_budget: f64, entries: &[Expense]) -> f64 {
    total_budget - entries.iter().map(|entry| entry.amount).sum::<f64>()
}

/// Sum of the entries recorded under a plain category label. Mirrored
/// entries never match; group them via [`expenses_by_category`] instead.
pub fn category_total(entries: &[Expense], label: &str) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.target.category_name() == Some(label))
        .map(|entry| entry.amount)
        .sum()
}

/// Asset, debt, and loan totals with the resulting net worth.
#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthBreakdown {
    pub total_assets: f64,
    pub total_debts: f64,
    pub total_loans: f64,
    pub net_worth: f64,
}

/// Computes net worth: balances, minus what the user owes, plus what is
/// owed to the user. Invariant under reordering of either collection.
pub fn net_worth_breakdown(accounts: &[Account], debts: &[Debt]) -> NetWorthBreakdown {
    let total_assets: f64 = accounts.iter().map(|account| account.balance).sum();
    let total_debts: f64 = debts
        .iter()
        .filter(|debt| debt.is_debt)
        .map(|debt| debt.amount)
        .sum();
    let total_loans: f64 = debts
        .iter()
        .filter(|debt| !debt.is_debt)
        .map(|debt| debt.amount)
        .sum();
    NetWorthBreakdown {
        total_assets,
        total_debts,
        total_loans,
        net_worth: total_assets - total_debts + total_loans,
    }
}

pub fn net_worth(accounts: &[Account], debts: &[Debt]) -> f64 {
    net_worth_breakdown(accounts, debts).net_worth
}

/// One calendar month of aggregated entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    /// Month key in `YYYY-MM` form.
    pub month: String,
    pub total: f64,
    pub count: usize,
}

/// Buckets entries by the calendar month of their date over the trailing
/// window ending at `reference`, oldest first, zero-filling empty months.
pub fn monthly_rollup(entries: &[Expense], months_back: usize, reference: NaiveDate) -> Vec<MonthlyBucket> {
    let mut buckets = Vec::with_capacity(months_back);
    for offset in (0..months_back as i32).rev() {
        let start = shift_month_start(reference, -offset);
        let key = month_key(start);
        let mut total = 0.0;
        let mut count = 0;
        for entry in entries {
            if month_key(entry.date.date_naive()) == key {
                total += entry.amount;
                count += 1;
            }
        }
        buckets.push(MonthlyBucket {
            month: key,
            total,
            count,
        });
    }
    buckets
}

/// Per-label totals for entries dated in `month` (a `YYYY-MM` key). Labels
/// are produced by the caller-provided resolver so mirrored targets can be
/// rendered through whatever naming the view requires; the BTreeMap keeps
/// the grouping order stable for equal inputs.
pub fn expenses_by_category<F>(entries: &[Expense], month: &str, label_of: F) -> BTreeMap<String, f64>
where
    F: Fn(&AllocationTarget) -> String,
{
    let mut totals = BTreeMap::new();
    for entry in entries {
        if month_key(entry.date.date_naive()) != month {
            continue;
        }
        *totals.entry(label_of(&entry.target)).or_insert(0.0) += entry.amount;
    }
    totals
}

/// Total of entries dated in `month`.
pub fn monthly_expenses(entries: &[Expense], month: &str) -> f64 {
    entries
        .iter()
        .filter(|entry| month_key(entry.date.date_naive()) == month)
        .map(|entry| entry.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountKind;
    use chrono::{TimeZone, Utc};

    fn entry(label: &str, amount: f64) -> Expense {
        Expense::new("entry", amount, AllocationTarget::Category(label.into()))
    }

    fn entry_dated(label: &str, amount: f64, year: i32, month: u32) -> Expense {
        entry(label, amount).with_date(Utc.with_ymd_and_hms(year, month, 10, 12, 0, 0).unwrap())
    }

    #[test]
    fn remaining_balance_subtracts_entry_amounts() {
        let entries = vec![entry("Food", 200.0), entry("Bills", 150.0)];
        assert_eq!(remaining_balance(1000.0, &entries), 650.0);
    }

    #[test]
    fn category_total_sums_matching_labels() {
        let entries = vec![entry("Food", 50.0), entry("Food", 30.0), entry("Bills", 10.0)];
        assert_eq!(category_total(&entries, "Food"), 80.0);
        assert_eq!(category_total(&entries, "Travel"), 0.0);
    }

    #[test]
    fn category_total_ignores_mirrored_entries() {
        let mut entries = vec![entry("Food", 50.0)];
        entries.push(Expense::new(
            "deposit",
            100.0,
            AllocationTarget::AccountDeposit(uuid::Uuid::new_v4()),
        ));
        assert_eq!(category_total(&entries, "Food"), 50.0);
    }

    #[test]
    fn net_worth_is_order_invariant() {
        let accounts = vec![
            Account::new("Checking", AccountKind::Checking, 500.0),
            Account::new("Savings", AccountKind::Savings, 1500.0),
        ];
        let mut debts = vec![
            Debt::new("Car Loan", 1000.0, true),
            Debt::new("Lent to Sam", 250.0, false),
        ];
        let forward = net_worth(&accounts, &debts);
        debts.reverse();
        let reversed_accounts: Vec<_> = accounts.iter().rev().cloned().collect();
        assert_eq!(forward, net_worth(&reversed_accounts, &debts));
        assert_eq!(forward, 500.0 + 1500.0 - 1000.0 + 250.0);
    }

    #[test]
    fn net_worth_breakdown_separates_debts_and_loans() {
        let debts = vec![
            Debt::new("Card", 300.0, true),
            Debt::new("Loaned out", 120.0, false),
        ];
        let breakdown = net_worth_breakdown(&[], &debts);
        assert_eq!(breakdown.total_debts, 300.0);
        assert_eq!(breakdown.total_loans, 120.0);
        assert_eq!(breakdown.net_worth, -180.0);
    }

    #[test]
    fn monthly_rollup_zero_fills_and_orders_oldest_first() {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let entries = vec![
            entry_dated("Food", 40.0, 2024, 1),
            entry_dated("Food", 60.0, 2024, 3),
            entry_dated("Bills", 25.0, 2024, 3),
            entry_dated("Food", 10.0, 2024, 6),
        ];
        let buckets = monthly_rollup(&entries, 6, reference);
        assert_eq!(buckets.len(), 6);
        let months: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"]
        );
        assert_eq!(buckets[0].total, 40.0);
        assert_eq!(buckets[1].total, 0.0);
        assert_eq!(buckets[2].total, 85.0);
        assert_eq!(buckets[2].count, 2);
        assert_eq!(buckets[3].total, 0.0);
        assert_eq!(buckets[4].total, 0.0);
        assert_eq!(buckets[5].total, 10.0);
    }

    #[test]
    fn monthly_rollup_excludes_entries_outside_the_window() {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let entries = vec![entry_dated("Food", 99.0, 2023, 12)];
        let buckets = monthly_rollup(&entries, 6, reference);
        assert!(buckets.iter().all(|bucket| bucket.total == 0.0));
    }

    #[test]
    fn expenses_by_category_groups_one_month_deterministically() {
        let entries = vec![
            entry_dated("Food", 50.0, 2024, 5),
            entry_dated("Bills", 20.0, 2024, 5),
            entry_dated("Food", 5.0, 2024, 5),
            entry_dated("Food", 99.0, 2024, 4),
        ];
        let totals = expenses_by_category(&entries, "2024-05", |target| target.to_string());
        let flattened: Vec<(String, f64)> = totals.into_iter().collect();
        assert_eq!(
            flattened,
            vec![("Bills".to_string(), 20.0), ("Food".to_string(), 55.0)]
        );
    }

    #[test]
    fn monthly_expenses_totals_one_month() {
        let entries = vec![
            entry_dated("Food", 50.0, 2024, 5),
            entry_dated("Food", 99.0, 2024, 4),
        ];
        assert_eq!(monthly_expenses(&entries, "2024-05"), 50.0);
    }
}
