//! Local persistence overlay for the account configuration.
//!
//! Edits made in the app are saved locally and override the published
//! account config until the journal itself is regenerated.

use super::AccountConfig;
use crate::error::Result;
use std::path::PathBuf;

/// File-backed store for locally edited account configuration.
pub struct LocalAccountStore {
    path: PathBuf,
}

impl LocalAccountStore {
    /// Create a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the locally saved config, if any.
    pub fn load(&self) -> Result<Option<AccountConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    /// Save a config, stamping its `last_updated` field.
    pub fn save(&self, config: &AccountConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut stamped = config.clone();
        stamped.last_updated = Some(chrono::Utc::now());
        std::fs::write(&self.path, serde_json::to_vec_pretty(&stamped)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_save_load_round_trip_stamps_last_updated() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAccountStore::new(dir.path().join("state").join("account.json"));

        assert!(store.load().unwrap().is_none());

        let config = AccountConfig {
            starting_balance: Some(dec!(1500)),
            ..AccountConfig::default()
        };
        store.save(&config).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.starting_balance, Some(dec!(1500)));
        assert!(loaded.last_updated.is_some());
    }
}
