use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::aggregates;
use crate::domain::common::{month_key, parse_month_key};
use crate::domain::report::{AccountSnapshot, DebtSnapshot, ReportMetadata, ReportTotals};
use crate::domain::{FinancialReport, ReportKind, Workspace};

use super::{ServiceError, ServiceResult};

/// Month-range and kind filters for listing reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub start_month: Option<String>,
    pub end_month: Option<String>,
    pub kind: Option<ReportKind>,
}

/// Creates and manages immutable financial report snapshots. A report
/// freezes account and debt state plus the aggregate totals at the moment
/// it is taken; later edits to the live data never touch it.
pub struct ReportService;

impl ReportService {
    /// Takes a snapshot dated now.
    pub fn create(
        workspace: &mut Workspace,
        kind: ReportKind,
        name: Option<String>,
    ) -> ServiceResult<Uuid> {
        Self::create_at(workspace, kind, name, Utc::now())
    }

    /// Takes a snapshot as of `moment`. The report month and the expense
    /// aggregates both derive from that date.
    pub fn create_at(
        workspace: &mut Workspace,
        kind: ReportKind,
        name: Option<String>,
        moment: DateTime<Utc>,
    ) -> ServiceResult<Uuid> {
        let month = month_key(moment.date_naive());
        let name = match name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("{} Report - {}", kind, moment.format("%Y-%m-%d")),
        };

        let accounts: Vec<AccountSnapshot> = workspace
            .accounts
            .iter()
            .map(|account| AccountSnapshot {
                id: account.id,
                name: account.name.clone(),
                kind: account.kind.to_string(),
                balance: account.balance,
            })
            .collect();
        let debts: Vec<DebtSnapshot> = workspace
            .debts
            .iter()
            .map(|debt| DebtSnapshot {
                id: debt.id,
                name: debt.name.clone(),
                amount: debt.amount,
                is_debt: debt.is_debt,
                status: debt.status.clone(),
            })
            .collect();

        let breakdown = aggregates::net_worth_breakdown(&workspace.accounts, &workspace.debts);
        let monthly = aggregates::monthly_expenses(&workspace.expenses, &month);
        let expenses_by_category =
            aggregates::expenses_by_category(&workspace.expenses, &month, |target| {
                workspace.target_label(target)
            });

        let report = FinancialReport {
            id: Uuid::new_v4(),
            month,
            kind,
            name,
            metadata: ReportMetadata {
                account_count: accounts.len(),
                debt_count: debts.len(),
                expense_count: workspace.expenses.len(),
                category_count: workspace.categories.len(),
            },
            accounts,
            debts,
            expenses_by_category,
            totals: ReportTotals {
                total_assets: breakdown.total_assets,
                total_debts: breakdown.total_debts,
                total_loans: breakdown.total_loans,
                net_worth: breakdown.net_worth,
                monthly_expenses: monthly,
            },
            created_at: moment,
        };
        tracing::info!(report = %report.name, month = %report.month, "created report snapshot");
        Ok(workspace.add_report(report))
    }

    pub fn load(workspace: &Workspace, id: Uuid) -> ServiceResult<&FinancialReport> {
        workspace
            .report(id)
            .ok_or_else(|| ServiceError::Invalid("Report not found".into()))
    }

    pub fn remove(workspace: &mut Workspace, id: Uuid) -> ServiceResult<FinancialReport> {
        workspace
            .remove_report(id)
            .ok_or_else(|| ServiceError::Invalid("Report not found".into()))
    }

    /// Reports matching the filter, newest month first. Bounds are
    /// inclusive and compare lexicographically, which is exact for
    /// zero-padded `YYYY-MM` keys.
    pub fn list<'a>(
        workspace: &'a Workspace,
        filter: &ReportFilter,
    ) -> ServiceResult<Vec<&'a FinancialReport>> {
        for bound in [&filter.start_month, &filter.end_month].into_iter().flatten() {
            if parse_month_key(bound).is_none() {
                return Err(ServiceError::Invalid(format!(
                    "'{bound}' is not a valid YYYY-MM month"
                )));
            }
        }
        let mut reports: Vec<&FinancialReport> = workspace
            .reports
            .iter()
            .filter(|report| {
                filter
                    .start_month
                    .as_ref()
                    .map_or(true, |start| report.month >= *start)
                    && filter
                        .end_month
                        .as_ref()
                        .map_or(true, |end| report.month <= *end)
                    && filter.kind.map_or(true, |kind| report.kind == kind)
            })
            .collect();
        reports.sort_by(|a, b| b.month.cmp(&a.month).then(b.created_at.cmp(&a.created_at)));
        Ok(reports)
    }

    /// The most recent report, if any.
    pub fn latest(workspace: &Workspace) -> Option<&FinancialReport> {
        workspace
            .reports
            .iter()
            .max_by(|a, b| a.month.cmp(&b.month).then(a.created_at.cmp(&b.created_at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountKind, AllocationTarget, Debt, Expense};
    use chrono::TimeZone;

    fn moment(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn seeded_workspace() -> Workspace {
        let mut workspace = Workspace::new("tests");
        workspace.add_account(Account::new("Checking", AccountKind::Checking, 500.0));
        workspace.add_account(Account::new("Savings", AccountKind::Savings, 1500.0));
        workspace.add_debt(Debt::new("Car Loan", 1000.0, true));
        workspace.add_debt(Debt::new("Lent to Sam", 250.0, false));
        workspace.add_expense(
            Expense::new("Lunch", 40.0, AllocationTarget::Category("Food".into()))
                .with_date(moment(2024, 5, 3)),
        );
        workspace.add_expense(
            Expense::new("Old bill", 99.0, AllocationTarget::Category("Bills".into()))
                .with_date(moment(2024, 4, 3)),
        );
        workspace
    }

    #[test]
    fn snapshot_freezes_totals_and_counts() {
        let mut workspace = seeded_workspace();
        let id = ReportService::create_at(
            &mut workspace,
            ReportKind::Monthly,
            None,
            moment(2024, 5, 31),
        )
        .unwrap();

        let report = ReportService::load(&workspace, id).unwrap();
        assert_eq!(report.month, "2024-05");
        assert_eq!(report.name, "Monthly Report - 2024-05-31");
        assert_eq!(report.totals.total_assets, 2000.0);
        assert_eq!(report.totals.total_debts, 1000.0);
        assert_eq!(report.totals.total_loans, 250.0);
        assert_eq!(report.totals.net_worth, 1250.0);
        assert_eq!(report.totals.monthly_expenses, 40.0);
        assert_eq!(report.metadata.account_count, 2);
        assert_eq!(report.metadata.debt_count, 2);
        assert_eq!(report.metadata.expense_count, 2);
        assert_eq!(report.expenses_by_category.get("Food"), Some(&40.0));
        assert!(report.expenses_by_category.get("Bills").is_none());
    }

    #[test]
    fn later_edits_never_touch_an_existing_snapshot() {
        let mut workspace = seeded_workspace();
        let id = ReportService::create_at(
            &mut workspace,
            ReportKind::Monthly,
            None,
            moment(2024, 5, 31),
        )
        .unwrap();

        workspace.accounts[0].balance = 9999.0;
        let report = ReportService::load(&workspace, id).unwrap();
        assert_eq!(report.totals.total_assets, 2000.0);
        assert_eq!(report.accounts[0].balance, 500.0);
    }

    #[test]
    fn custom_name_is_kept() {
        let mut workspace = seeded_workspace();
        let id = ReportService::create_at(
            &mut workspace,
            ReportKind::Custom,
            Some("Year end close".into()),
            moment(2024, 12, 31),
        )
        .unwrap();
        assert_eq!(
            ReportService::load(&workspace, id).unwrap().name,
            "Year end close"
        );
    }

    #[test]
    fn list_filters_by_month_range_and_kind() {
        let mut workspace = seeded_workspace();
        ReportService::create_at(&mut workspace, ReportKind::Monthly, None, moment(2024, 3, 31))
            .unwrap();
        ReportService::create_at(&mut workspace, ReportKind::Monthly, None, moment(2024, 4, 30))
            .unwrap();
        ReportService::create_at(&mut workspace, ReportKind::Annual, None, moment(2024, 12, 31))
            .unwrap();

        let all = ReportService::list(&workspace, &ReportFilter::default()).unwrap();
        let months: Vec<&str> = all.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-12", "2024-04", "2024-03"]);

        let spring = ReportService::list(
            &workspace,
            &ReportFilter {
                start_month: Some("2024-04".into()),
                end_month: Some("2024-06".into()),
                kind: None,
            },
        )
        .unwrap();
        assert_eq!(spring.len(), 1);
        assert_eq!(spring[0].month, "2024-04");

        let annual = ReportService::list(
            &workspace,
            &ReportFilter {
                kind: Some(ReportKind::Annual),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(annual.len(), 1);
    }

    #[test]
    fn list_rejects_malformed_bounds() {
        let workspace = seeded_workspace();
        let err = ReportService::list(
            &workspace,
            &ReportFilter {
                start_month: Some("spring".into()),
                ..Default::default()
            },
        )
        .expect_err("bad bound must fail");
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[test]
    fn latest_returns_the_newest_report() {
        let mut workspace = seeded_workspace();
        assert!(ReportService::latest(&workspace).is_none());
        ReportService::create_at(&mut workspace, ReportKind::Monthly, None, moment(2024, 3, 31))
            .unwrap();
        let id = ReportService::create_at(
            &mut workspace,
            ReportKind::Monthly,
            None,
            moment(2024, 6, 30),
        )
        .unwrap();
        assert_eq!(ReportService::latest(&workspace).unwrap().id, id);
    }
}
