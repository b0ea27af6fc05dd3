pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod debt;
pub mod expense;
pub mod report;
pub mod transfer;
pub mod workspace;

pub use account::{Account, AccountKind};
pub use budget::BudgetAllocation;
pub use category::Category;
pub use debt::{Debt, DebtStatus};
pub use expense::{AllocationTarget, Expense};
pub use report::{FinancialReport, ReportKind, ReportMetadata, ReportTotals};
pub use transfer::Transfer;
pub use workspace::Workspace;
