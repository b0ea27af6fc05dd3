use crate::core::notify::{ChangeHub, Collection};
use crate::domain::workspace::{Workspace, CURRENT_SCHEMA_VERSION};
use crate::errors::TrackerError;
use crate::storage::StorageBackend;

/// Facade that coordinates the current workspace, persistence, backups,
/// and change notifications. `commit` is the write path: the in-memory
/// workspace (entry and mirror updates included) is persisted as a single
/// document write, then observers are pushed the full new state.
pub struct WorkspaceManager {
    pub current: Option<Workspace>,
    current_owner: Option<String>,
    storage: Box<dyn StorageBackend>,
    hub: ChangeHub,
}

impl WorkspaceManager {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            current: None,
            current_owner: None,
            storage,
            hub: ChangeHub::new(),
        }
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// Loads the workspace for `owner` and announces it to all observers.
    pub fn open(&mut self, owner: &str) -> Result<(), TrackerError> {
        let workspace = self.storage.load(owner)?;
        self.ensure_schema_support(workspace.schema_version)?;
        self.current = Some(workspace);
        self.current_owner = Some(owner.to_string());
        self.storage.record_last_owner(Some(owner))?;
        if let Some(workspace) = self.current.as_ref() {
            self.hub.notify_all(workspace);
        }
        Ok(())
    }

    /// Creates and persists an empty workspace for `owner`.
    pub fn create(&mut self, owner: &str) -> Result<(), TrackerError> {
        let workspace = Workspace::new(owner);
        self.storage.save(&workspace, owner)?;
        self.storage.record_last_owner(Some(owner))?;
        self.hub.notify_all(&workspace);
        self.current = Some(workspace);
        self.current_owner = Some(owner.to_string());
        Ok(())
    }

    /// Opens the owner's workspace, creating it first when absent.
    pub fn open_or_create(&mut self, owner: &str) -> Result<(), TrackerError> {
        if self.storage.exists(owner) {
            self.open(owner)
        } else {
            tracing::info!(owner, "no stored workspace, creating a fresh one");
            self.create(owner)
        }
    }

    /// Persists the current workspace without notifying observers.
    pub fn save(&mut self) -> Result<(), TrackerError> {
        let owner = self
            .current_owner
            .clone()
            .ok_or_else(|| TrackerError::Storage("no workspace loaded".into()))?;
        let workspace = self
            .current
            .as_ref()
            .ok_or_else(|| TrackerError::Storage("no workspace loaded".into()))?;
        self.storage.save(workspace, &owner)
    }

    /// Persists the current workspace and pushes the full new state to the
    /// observers of each changed collection.
    pub fn commit(&mut self, changed: &[Collection]) -> Result<(), TrackerError> {
        self.save()?;
        if let Some(workspace) = self.current.as_ref() {
            for collection in changed {
                self.hub.notify(*collection, workspace);
            }
        }
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> Result<(), TrackerError> {
        let owner = self
            .current_owner
            .as_deref()
            .ok_or_else(|| TrackerError::Storage("no workspace loaded".into()))?;
        let workspace = self
            .current
            .as_ref()
            .ok_or_else(|| TrackerError::Storage("no workspace loaded".into()))?;
        self.storage.backup(workspace, owner, note)
    }

    pub fn list_backups(&self, owner: &str) -> Result<Vec<String>, TrackerError> {
        self.storage.list_backups(owner)
    }

    pub fn restore_backup(&mut self, owner: &str, backup_name: &str) -> Result<(), TrackerError> {
        let workspace = self.storage.restore(owner, backup_name)?;
        self.ensure_schema_support(workspace.schema_version)?;
        self.hub.notify_all(&workspace);
        self.current = Some(workspace);
        self.current_owner = Some(owner.to_string());
        Ok(())
    }

    pub fn last_opened(&self) -> Result<Option<String>, TrackerError> {
        self.storage.last_owner()
    }

    pub fn current_owner(&self) -> Option<&str> {
        self.current_owner.as_deref()
    }

    pub fn set_current(&mut self, workspace: Workspace, owner: Option<String>) {
        self.current = Some(workspace);
        self.current_owner = owner;
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.current_owner = None;
    }

    fn ensure_schema_support(&self, schema_version: u8) -> Result<(), TrackerError> {
        if schema_version > CURRENT_SCHEMA_VERSION {
            return Err(TrackerError::Storage(format!(
                "workspace schema v{} is newer than supported v{}",
                schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountKind};
    use crate::storage::JsonStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn manager_with_temp_dir() -> (WorkspaceManager, tempfile::TempDir) {
        let temp = tempdir().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("json storage");
        (WorkspaceManager::new(Box::new(storage)), temp)
    }

    #[test]
    fn create_save_open_roundtrip() {
        let (mut manager, _guard) = manager_with_temp_dir();
        manager.create("user-7").expect("create workspace");
        manager
            .current
            .as_mut()
            .expect("workspace present")
            .add_account(Account::new("Checking", AccountKind::Checking, 500.0));
        manager.save().expect("save workspace");

        manager.clear();
        manager.open("user-7").expect("open workspace");
        let workspace = manager.current.as_ref().expect("workspace present");
        assert_eq!(workspace.owner, "user-7");
        assert_eq!(workspace.accounts.len(), 1);
        assert_eq!(manager.last_opened().unwrap().as_deref(), Some("user-7"));
    }

    #[test]
    fn commit_notifies_only_changed_collections() {
        let (mut manager, _guard) = manager_with_temp_dir();
        manager.create("user-1").expect("create workspace");

        let account_events = Arc::new(AtomicUsize::new(0));
        let debt_events = Arc::new(AtomicUsize::new(0));
        let account_clone = Arc::clone(&account_events);
        let debt_clone = Arc::clone(&debt_events);
        manager.hub().subscribe(Collection::Accounts, move |_| {
            account_clone.fetch_add(1, Ordering::SeqCst);
        });
        manager.hub().subscribe(Collection::Debts, move |_| {
            debt_clone.fetch_add(1, Ordering::SeqCst);
        });

        manager
            .current
            .as_mut()
            .expect("workspace present")
            .add_account(Account::new("Savings", AccountKind::Savings, 0.0));
        manager
            .commit(&[Collection::Accounts])
            .expect("commit workspace");

        assert_eq!(account_events.load(Ordering::SeqCst), 1);
        assert_eq!(debt_events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn open_rejects_future_schema_versions() {
        let (mut manager, guard) = manager_with_temp_dir();
        manager.create("user-2").expect("create workspace");
        let mut workspace = manager.current.clone().expect("workspace present");
        workspace.schema_version = CURRENT_SCHEMA_VERSION + 5;
        let path = crate::core::utils::workspaces_dir_in(guard.path()).join("user_2.json");
        std::fs::write(&path, serde_json::to_string(&workspace).unwrap()).unwrap();

        manager.clear();
        let err = manager
            .open("user-2")
            .expect_err("future schema must be rejected");
        match err {
            TrackerError::Storage(message) => {
                assert!(message.contains("newer"), "unexpected error: {message}")
            }
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[test]
    fn open_or_create_builds_missing_workspace() {
        let (mut manager, _guard) = manager_with_temp_dir();
        manager.open_or_create("fresh-user").expect("open or create");
        assert!(manager.current.is_some());
        assert_eq!(manager.current_owner(), Some("fresh-user"));
    }
}
