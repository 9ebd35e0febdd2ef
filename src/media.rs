use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::error::Result;

/// Content-addressed image storage.
///
/// Each image is written once under `{md5-hex}.{ext}`; writing the same
/// bytes again is a no-op that returns the same name.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Use (and create if needed) `root` as the media directory.
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name an image would be stored under.
    pub fn file_name(data: &[u8], extension: &str) -> String {
        format!("{:x}.{extension}", Md5::digest(data))
    }

    /// Persist an image and return its file name.
    pub fn persist(&self, data: &[u8], extension: &str) -> Result<String> {
        let name = Self::file_name(data, extension);
        let path = self.root.join(&name);
        if !path.exists() {
            std::fs::write(&path, data)?;
        }
        Ok(name)
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}
