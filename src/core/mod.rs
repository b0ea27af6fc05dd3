pub mod aggregates;
pub mod notify;
pub mod services;
pub mod utils;
pub mod workspace_manager;

pub use notify::{ChangeHub, Collection, SubscriptionId};
pub use workspace_manager::WorkspaceManager;
