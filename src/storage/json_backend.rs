use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{self, ensure_dir},
    domain::{AllocationTarget, Workspace},
    errors::TrackerError,
};

use super::{Result, StorageBackend};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// JSON-file document store: one file per owner, replaced atomically on
/// every save, with timestamped retention-pruned backups alongside.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    workspaces_dir: PathBuf,
    backups_dir: PathBuf,
    state_file: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = root.unwrap_or_else(utils::app_data_dir);
        ensure_dir(&app_root)?;
        let workspaces_dir = utils::workspaces_dir_in(&app_root);
        let backups_dir = utils::backups_root_in(&app_root);
        ensure_dir(&workspaces_dir)?;
        ensure_dir(&backups_dir)?;
        let state_file = utils::state_file_in(&app_root);
        Ok(Self {
            root: app_root,
            workspaces_dir,
            backups_dir,
            state_file,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn workspace_path(&self, owner: &str) -> PathBuf {
        self.workspaces_dir
            .join(format!("{}.json", canonical_name(owner)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    fn backup_dir(&self, owner: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(owner))
    }

    pub fn backup_path(&self, owner: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(owner).join(backup_name)
    }

    fn read_state(&self) -> Result<StoreState> {
        if self.state_file.exists() {
            let data = fs::read_to_string(&self.state_file)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(StoreState::default())
        }
    }

    fn write_backup_file(
        &self,
        workspace: &Workspace,
        owner: &str,
        note: Option<&str>,
    ) -> Result<()> {
        let dir = self.backup_dir(owner);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut file_stem = format!("{}_{}", canonical_name(owner), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            file_stem.push('_');
            file_stem.push_str(&label);
        }
        let path = dir.join(format!("{}.{}", file_stem, BACKUP_EXTENSION));
        let json = serde_json::to_string_pretty(workspace)?;
        write_atomic(&path, &json)?;
        self.prune_backups(owner)?;
        Ok(())
    }

    fn prune_backups(&self, owner: &str) -> Result<()> {
        let backups = self.list_backups(owner)?;
        if backups.len() <= self.retention {
            return Ok(());
        }
        for entry in backups.iter().skip(self.retention) {
            let path = self.backup_path(owner, entry);
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, workspace: &Workspace, owner: &str) -> Result<()> {
        let path = self.workspace_path(owner);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(workspace)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, owner: &str) -> Result<Workspace> {
        let path = self.workspace_path(owner);
        load_workspace_from_path(&path)
    }

    fn exists(&self, owner: &str) -> bool {
        self.workspace_path(owner).exists()
    }

    fn list_backups(&self, owner: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(owner);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let file_name = match path.file_name().and_then(|stem| stem.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            entries.push(file_name);
        }
        entries.sort_by(|a, b| parse_backup_timestamp(b).cmp(&parse_backup_timestamp(a)));
        Ok(entries)
    }

    fn backup(&self, workspace: &Workspace, owner: &str, note: Option<&str>) -> Result<()> {
        self.write_backup_file(workspace, owner, note)
    }

    fn restore(&self, owner: &str, backup_name: &str) -> Result<Workspace> {
        let backup_path = self.backup_path(owner, backup_name);
        if !backup_path.exists() {
            return Err(TrackerError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let target = self.workspace_path(owner);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&backup_path, &target)?;
        load_workspace_from_path(&target)
    }

    fn last_owner(&self) -> Result<Option<String>> {
        let state = self.read_state()?;
        Ok(state.last_owner)
    }

    fn record_last_owner(&self, owner: Option<&str>) -> Result<()> {
        let mut state = self.read_state()?;
        state.last_owner = owner.map(str::to_string);
        let data = serde_json::to_string_pretty(&state)?;
        write_atomic(&self.state_file, &data)?;
        Ok(())
    }
}

pub fn save_workspace_to_path(workspace: &Workspace, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(workspace)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_workspace_from_path(path: &Path) -> Result<Workspace> {
    let data = fs::read_to_string(path)?;
    let workspace: Workspace = serde_json::from_str(&data)?;
    Ok(workspace)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    last_owner: Option<String>,
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "workspace".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if ch.is_whitespace() || matches!(ch, '-' | '.') {
            if !sanitized.is_empty() && !last_dash {
                sanitized.push('-');
                last_dash = true;
            }
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    // `<owner>_<YYYYMMDD>_<HHMM>[_<note>].json`; the note is optional, so
    // scan for the adjacent date and time segments instead of anchoring on
    // the end of the name.
    let stem = name.strip_suffix(".json").unwrap_or(name);
    let parts: Vec<&str> = stem.split('_').collect();
    for window in parts.windows(2) {
        if is_digits(window[0], 8) && is_digits(window[1], 4) {
            let raw = format!("{}{}", window[0], window[1]);
            return NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M")
                .ok()
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Integrity scan surfacing soft inconsistencies left behind by deleted
/// accounts or debts: mirrored targets, transfer endpoints, and budget
/// allocations that no longer resolve. Read-time reconciliation hook; the
/// records themselves are left untouched.
pub fn workspace_warnings(workspace: &Workspace) -> Vec<String> {
    let account_ids: HashSet<_> = workspace.accounts.iter().map(|a| a.id).collect();
    let debt_ids: HashSet<_> = workspace.debts.iter().map(|d| d.id).collect();
    let mut warnings = Vec::new();

    for expense in &workspace.expenses {
        match expense.target {
            AllocationTarget::AccountDeposit(id) if !account_ids.contains(&id) => {
                warnings.push(format!(
                    "allocation {} references unknown account {}",
                    expense.id, id
                ));
            }
            AllocationTarget::DebtPayment(id) if !debt_ids.contains(&id) => {
                warnings.push(format!(
                    "allocation {} references unknown debt {}",
                    expense.id, id
                ));
            }
            _ => {}
        }
    }

    for transfer in &workspace.transfers {
        if !account_ids.contains(&transfer.from_account) {
            warnings.push(format!(
                "transfer {} references unknown from_account {}",
                transfer.id, transfer.from_account
            ));
        }
        if !account_ids.contains(&transfer.to_account) {
            warnings.push(format!(
                "transfer {} references unknown to_account {}",
                transfer.id, transfer.to_account
            ));
        }
    }

    for allocation in &workspace.budget_allocations {
        if !account_ids.contains(&allocation.account_id) {
            warnings.push(format!(
                "budget allocation {} references unknown account {}",
                allocation.id, allocation.account_id
            ));
        }
    }

    warnings
}
