use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::{
    error::{Error, Result},
    store::validate_collection_name,
};

const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

pub const MODEL_NAME_KEY: &str = "model_name";
pub const THROUGHPUT_KEY: &str = "throughput_tps";
pub const COLLECTION_KEY: &str = "collection";

pub const DEFAULT_COLLECTION: &str = "styled_templates";

/// Persistent user settings.
pub struct ConfigDb {
    db: Database,
}

impl ConfigDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            result.push((k.value().to_string(), v.value().to_string()));
        }
        Ok(result)
    }

    /// Last calibrated generation throughput, if any.
    pub fn throughput(&self) -> Result<Option<f64>> {
        let Some(raw) = self.get_setting(THROUGHPUT_KEY)? else {
            return Ok(None);
        };
        raw.parse().map(Some).map_err(|_| {
            Error::Config(format!("invalid {THROUGHPUT_KEY} setting '{raw}'"))
        })
    }

    pub fn set_throughput(&self, tokens_per_second: f64) -> Result<()> {
        if !tokens_per_second.is_finite() || tokens_per_second <= 0.0 {
            return Err(Error::Config(format!(
                "throughput must be a positive number, got {tokens_per_second}"
            )));
        }
        self.set_setting(THROUGHPUT_KEY, &tokens_per_second.to_string())
    }

    /// Collection used when none is given on the command line.
    pub fn default_collection(&self) -> Result<String> {
        self.get_setting_or(COLLECTION_KEY, DEFAULT_COLLECTION)
    }

    pub fn set_default_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        self.set_setting(COLLECTION_KEY, name)
    }
}

impl std::fmt::Debug for ConfigDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDb").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, ConfigDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = ConfigDb::open(&tmp.path().join("config.redb")).unwrap();
        (tmp, db)
    }

    #[test]
    fn settings_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get_setting(MODEL_NAME_KEY).unwrap(), None);
        assert_eq!(
            db.get_setting_or(MODEL_NAME_KEY, "default-model").unwrap(),
            "default-model"
        );

        db.set_setting(MODEL_NAME_KEY, "custom-model").unwrap();
        assert_eq!(
            db.get_setting(MODEL_NAME_KEY).unwrap(),
            Some("custom-model".to_string())
        );
        assert_eq!(db.list_settings().unwrap().len(), 1);

        assert!(db.remove_setting(MODEL_NAME_KEY).unwrap());
        assert!(!db.remove_setting(MODEL_NAME_KEY).unwrap());
    }

    #[test]
    fn throughput_roundtrip_and_validation() {
        let (_tmp, db) = test_db();
        assert_eq!(db.throughput().unwrap(), None);

        db.set_throughput(22.5).unwrap();
        assert_eq!(db.throughput().unwrap(), Some(22.5));

        assert!(matches!(db.set_throughput(0.0), Err(Error::Config(_))));
        assert!(matches!(db.set_throughput(f64::NAN), Err(Error::Config(_))));

        db.set_setting(THROUGHPUT_KEY, "fast").unwrap();
        assert!(matches!(db.throughput(), Err(Error::Config(_))));
    }

    #[test]
    fn default_collection_falls_back() {
        let (_tmp, db) = test_db();
        assert_eq!(db.default_collection().unwrap(), DEFAULT_COLLECTION);

        db.set_default_collection("legal").unwrap();
        assert_eq!(db.default_collection().unwrap(), "legal");

        assert!(matches!(
            db.set_default_collection("two words"),
            Err(Error::Config(_))
        ));
        assert_eq!(db.default_collection().unwrap(), "legal");

        assert!(db.remove_setting(COLLECTION_KEY).unwrap());
        assert_eq!(db.default_collection().unwrap(), DEFAULT_COLLECTION);
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.redb");

        {
            let db = ConfigDb::open(&path).unwrap();
            db.set_setting(COLLECTION_KEY, "letters").unwrap();
        }

        let db = ConfigDb::open(&path).unwrap();
        assert_eq!(
            db.get_setting(COLLECTION_KEY).unwrap(),
            Some("letters".to_string())
        );
    }
}
