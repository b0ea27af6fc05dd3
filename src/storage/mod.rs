pub mod json_backend;

use std::path::Path;

use crate::{domain::Workspace, errors::TrackerError};

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Abstraction over persistence backends capable of storing per-user
/// workspaces and their backups. Implementations must treat `save` as a
/// single document write: the workspace replaces the stored copy wholesale.
pub trait StorageBackend: Send + Sync {
    fn save(&self, workspace: &Workspace, owner: &str) -> Result<()>;
    fn load(&self, owner: &str) -> Result<Workspace>;
    fn exists(&self, owner: &str) -> bool;
    fn list_backups(&self, owner: &str) -> Result<Vec<String>>;
    fn backup(&self, workspace: &Workspace, owner: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, owner: &str, backup_name: &str) -> Result<Workspace>;
    fn last_owner(&self) -> Result<Option<String>>;
    fn record_last_owner(&self, owner: Option<&str>) -> Result<()>;

    /// Optional helpers for ad-hoc file operations. Default implementations
    /// forward to the JSON file format when not overridden.
    fn save_to_path(&self, workspace: &Workspace, path: &Path) -> Result<()> {
        json_backend::save_workspace_to_path(workspace, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<Workspace> {
        json_backend::load_workspace_from_path(path)
    }
}

pub use json_backend::{workspace_warnings, JsonStorage};
