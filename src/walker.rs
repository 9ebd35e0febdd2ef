use std::path::{Path, PathBuf};

use crate::error::Result;

/// A discovered document file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the directory that was walked.
    pub relative_path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

impl DiscoveredFile {
    /// Name the document is stored under: its relative path with `/`
    /// separators.
    pub fn document_name(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

const SUPPORTED_EXTENSIONS: &[&str] = &["docx"];

/// Discover documents under `path`.
///
/// A file path yields just that file (relative to its parent). A directory
/// is walked recursively, skipping hidden entries and Word lock files
/// (`~$name.docx`). Results are sorted by relative path.
pub fn discover_files(path: &Path) -> Result<Vec<DiscoveredFile>> {
    let canonical = path.canonicalize()?;

    if canonical.is_file() {
        let relative_path = canonical
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| canonical.clone());
        return Ok(vec![DiscoveredFile {
            relative_path,
            absolute_path: canonical,
        }]);
    }

    let mut results = Vec::new();
    walk_dir(&canonical, &canonical, &mut results)?;
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') || name.starts_with("~$") {
            continue;
        }

        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk_dir(root, &entry.path(), results)?;
        } else if file_type.is_symlink() {
            let resolved = match entry.path().canonicalize() {
                Ok(p) => p,
                Err(_) => continue, // Skip broken symlinks
            };
            // Directory links back into the root would loop forever.
            if resolved.starts_with(root) && resolved.is_dir() {
                continue;
            }
            if resolved.is_file() && is_supported(&resolved) {
                results.push(discovered(root, &entry.path(), resolved));
            }
        } else if file_type.is_file() && is_supported(&entry.path()) {
            let abs = entry.path().canonicalize()?;
            results.push(discovered(root, &entry.path(), abs));
        }
    }

    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

fn discovered(
    root: &Path,
    original_path: &Path,
    absolute_path: PathBuf,
) -> DiscoveredFile {
    DiscoveredFile {
        relative_path: original_path
            .strip_prefix(root)
            .unwrap_or(original_path)
            .to_path_buf(),
        absolute_path,
    }
}
