pub mod account_service;
pub mod allocation_service;
pub mod budget_service;
pub mod category_service;
pub mod debt_service;
pub mod report_service;
pub mod transfer_service;

pub use account_service::AccountService;
pub use allocation_service::{
    AllocationDraft, AllocationOutcome, AllocationService, AllocationUpdate, EntryFilter,
    MirrorWarning,
};
pub use budget_service::BudgetService;
pub use category_service::{CategoryRemoval, CategoryService};
pub use debt_service::DebtService;
pub use report_service::{ReportFilter, ReportService};
pub use transfer_service::{TransferDraft, TransferService};

use crate::errors::TrackerError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("{0}")]
    Invalid(String),
}
