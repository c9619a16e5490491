//! Directory walking

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// List files under `root` accepted by `predicate`, depth-first.
///
/// Entries are visited in file-name order so the result is deterministic for
/// a given file system state. A `root` that is itself a file is tested
/// directly.
pub fn list_matching_files<P>(root: &Path, predicate: P) -> Result<Vec<PathBuf>>
where
    P: Fn(&Path) -> bool,
{
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_file() && predicate(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Predicate accepting files whose extension is one of `extensions`
pub fn has_extension<'a>(extensions: &'a [String]) -> impl Fn(&Path) -> bool + 'a {
    move |path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}
