use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::core::utils::{app_data_dir, config_file_in, ensure_dir};
use crate::errors::TrackerError;

const TMP_SUFFIX: &str = "tmp";

/// User-level tracker settings. Workspace data lives elsewhere; this file
/// only carries presentation and storage preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub currency_symbol: String,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "€".into(),
            backup_retention: 5,
            storage_root: None,
        }
    }
}

/// Loads and saves the configuration file under the application data dir.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self, TrackerError> {
        Self::with_base(app_data_dir())
    }

    pub fn with_base(base: PathBuf) -> Result<Self, TrackerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Missing file yields the defaults; a malformed file is an error so a
    /// typo never silently resets the settings.
    pub fn load(&self) -> Result<TrackerConfig, TrackerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(TrackerConfig::default())
        }
    }

    pub fn save(&self, config: &TrackerConfig) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), TrackerError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::with_base(temp.path().to_path_buf()).unwrap();
        let config = store.load().unwrap();
        assert_eq!(config.currency_symbol, "€");
        assert_eq!(config.backup_retention, 5);
        assert!(config.storage_root.is_none());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::with_base(temp.path().to_path_buf()).unwrap();
        let config = TrackerConfig {
            currency_symbol: "$".into(),
            backup_retention: 9,
            storage_root: Some(temp.path().join("data")),
        };
        store.save(&config).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.currency_symbol, "$");
        assert_eq!(loaded.backup_retention, 9);
        assert_eq!(loaded.storage_root, Some(temp.path().join("data")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::with_base(temp.path().to_path_buf()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
