//! On-disk home of a docstyle installation.
//!
//! ```text
//! <root>/
//!   config.redb   settings (model, default collection, throughput)
//!   store.redb    paragraph entries and embeddings for every collection
//!   media/        extracted images, named by content hash
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DATA_DIR_ENV_VAR: &str = "DOCSTYLE_DATA_DIR";

const XDG_PREFIX: &str = "docstyle";
const CONFIG_DB_FILE: &str = "config.redb";
const STORE_DB_FILE: &str = "store.redb";
const MEDIA_DIR: &str = "media";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Pick the root from `--data-dir`, else `DOCSTYLE_DATA_DIR`, else
    /// `$XDG_DATA_HOME/docstyle`, and make sure it exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = match explicit {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(DATA_DIR_ENV_VAR) {
                Some(val) => PathBuf::from(val),
                None => xdg_root()?,
            },
        };
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_db(&self) -> PathBuf {
        self.root.join(CONFIG_DB_FILE)
    }

    /// Shared by all collections; each one owns its own tables.
    pub fn store_db(&self) -> PathBuf {
        self.root.join(STORE_DB_FILE)
    }

    /// Image directory, created on first use.
    pub fn media_dir(&self) -> Result<PathBuf> {
        let path = self.root.join(MEDIA_DIR);
        ensure_dir(&path)?;
        Ok(path)
    }
}

fn xdg_root() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix(XDG_PREFIX)
        .get_data_home()
        .ok_or_else(|| Error::Config("no XDG data home for docstyle".into()))
}

fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|_| Error::DataDir(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_explicit_root() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.config_db(), tmp.path().join("config.redb"));
        assert_eq!(dir.store_db(), tmp.path().join("store.redb"));
        assert!(!tmp.path().join("media").exists());
    }

    #[test]
    fn missing_root_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("templates/office");
        let dir = DataDir::resolve(Some(&nested)).unwrap();
        assert!(dir.root().is_dir());
    }

    #[test]
    fn media_dir_is_created_on_demand() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let media = dir.media_dir().unwrap();

        assert!(media.is_dir());
        assert_eq!(media, tmp.path().join("media"));
        assert_eq!(dir.media_dir().unwrap(), media);
    }

    #[test]
    fn root_blocked_by_a_file_is_a_data_dir_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("occupied");
        std::fs::write(&blocker, b"file").unwrap();

        let err = DataDir::resolve(Some(&blocker.join("inner"))).unwrap_err();
        assert!(matches!(err, Error::DataDir(_)));
    }
}
