//! Collision log discovery.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use tracing::debug;

use super::IngestError;

/// Every file in `dir` whose name matches `pattern`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn find_logs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, IngestError> {
    let pattern = Pattern::new(pattern)?;
    if !dir.is_dir() {
        debug!("Log directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }

    let mut logs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| pattern.matches(n)) {
            logs.push(entry.path());
        }
    }
    logs.sort();
    Ok(logs)
}

/// The most recently modified matching log, if any.
///
/// Equal modification times are broken by file name, later name wins.
pub fn latest_log(dir: &Path, pattern: &str) -> Result<Option<PathBuf>, IngestError> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for path in find_logs(dir, pattern)? {
        let modified = fs::metadata(&path)?.modified()?;
        let newer = match &latest {
            Some((best, best_path)) => (modified, &path) >= (*best, best_path),
            None => true,
        };
        if newer {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
