//! Gathers the files of a site folder for upload.

use std::path::Path;

use crate::error::{Result, RolloutError};

const IGNORED_EXTENSIONS: &[&str] = &["log", "tmp", "temp", "cache"];
const IGNORED_FILES: &[&str] = &["Thumbs.db", "DS_Store"];
const IGNORED_DIRS: &[&str] = &["node_modules"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Path below the site root, `/`-separated
    pub relative_path: String,
    pub content: Vec<u8>,
    pub size_bytes: u64,
}

/// Editor droppings and build artifacts never worth uploading
pub fn is_ignored_file(name: &str) -> bool {
    if IGNORED_FILES.contains(&name) {
        return true;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IGNORED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Walk `root` and read every deployable file, sorted by relative path.
pub fn collect_files(root: &Path) -> Result<Vec<CollectedFile>> {
    let mut files = Vec::new();
    scan_directory(root, "", &mut files)?;
    // Per-directory order is not path order: `a-b.txt` sorts before `a/x`
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    tracing::debug!("Collected {} files from {:?}", files.len(), root);
    Ok(files)
}

fn scan_directory(dir: &Path, prefix: &str, files: &mut Vec<CollectedFile>) -> Result<()> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| RolloutError::Io { path, source }
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err(dir))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err(dir))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            tracing::warn!("Skipping non UTF-8 path {:?}", path);
            continue;
        };
        if is_hidden(&name) {
            continue;
        }

        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };

        // Follows symlinks, like a plain stat
        let metadata = std::fs::metadata(&path).map_err(io_err(&path))?;
        if metadata.is_dir() {
            if !IGNORED_DIRS.contains(&name.as_str()) {
                scan_directory(&path, &relative, files)?;
            }
        } else if !is_ignored_file(&name) {
            let content = std::fs::read(&path).map_err(io_err(&path))?;
            files.push(CollectedFile {
                relative_path: relative,
                size_bytes: content.len() as u64,
                content,
            });
        }
    }

    Ok(())
}

pub fn total_size(files: &[CollectedFile]) -> u64 {
    files.iter().map(|f| f.size_bytes).sum()
}
