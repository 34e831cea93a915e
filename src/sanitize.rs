//! Mapping remote file names onto safe local paths.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Runs of characters outside the portable filename set.
static UNSAFE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]+").expect("Invalid filename regex"));

/// Replace every run of characters outside `[A-Za-z0-9._-]` with a single `_`.
///
/// An empty name becomes `_`, so the result is never empty.
///
/// # Examples
///
/// ```
/// use drive_sync::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("B (1).dat"), "B_1_.dat");
/// assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    UNSAFE_RUN_REGEX.replace_all(name, "_").into_owned()
}

/// Local path for a remote file name inside `target_dir`.
pub fn local_path(target_dir: &Path, remote_name: &str) -> PathBuf {
    target_dir.join(sanitize_filename(remote_name))
}

/// True only for an existing regular file; directories do not count.
pub fn is_synced(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
