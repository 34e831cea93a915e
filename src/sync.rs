//! Downloading listed files into the target directory.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use filetime::FileTime;
use futures::StreamExt;
use reqwest::Response;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::DriveClient;
use crate::error::Result;
use crate::models::{format_size, FileMetadata};
use crate::sanitize::{is_synced, local_path};

/// What happened to a single listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A regular file already existed at the local path.
    Skipped,
    /// Content written and modification time applied.
    Downloaded { bytes: u64 },
    /// Content written, but the local timestamps were left as they are.
    TimestampWarning { bytes: u64, reason: String },
    /// The content request could not be made or was rejected.
    DownloadFailed(String),
    /// The local file could not be created.
    CreateFailed(String),
    /// The body stream or the disk write broke off; the partial file is removed.
    WriteFailed(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed(_) | Self::CreateFailed(_) | Self::WriteFailed(_)
        )
    }

    /// Whether file content was written during this run.
    pub fn is_download(&self) -> bool {
        matches!(self, Self::Downloaded { .. } | Self::TimestampWarning { .. })
    }
}

/// Outcome for one remote entry.
#[derive(Debug, Clone)]
pub struct EntryResult {
    pub file_id: String,
    pub name: String,
    pub path: PathBuf,
    pub outcome: SyncOutcome,
}

/// Outcomes for a whole run, in listing order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub entries: Vec<EntryResult>,
}

impl SyncReport {
    pub fn downloaded(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_download()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == SyncOutcome::Skipped)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failure()).count()
    }
}

/// Download every entry that is not present locally yet.
///
/// Entries are processed one at a time in the given order. A failure on one
/// entry is recorded and the next entry is attempted, except for
/// authentication errors (see [`DriveError::is_fatal`]), which end the run.
///
/// [`DriveError::is_fatal`]: crate::DriveError::is_fatal
pub async fn sync_entries(
    client: &DriveClient,
    entries: &[FileMetadata],
    target_dir: &Path,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for entry in entries {
        info!(
            "Found file {} {} {}",
            entry.name,
            entry.id,
            entry.created_time.as_deref().unwrap_or("-")
        );
        debug!("{}", entry);

        let path = local_path(target_dir, &entry.name);
        let outcome = sync_entry(client, entry, &path).await?;

        report.entries.push(EntryResult {
            file_id: entry.id.clone(),
            name: entry.name.clone(),
            path,
            outcome,
        });
    }

    Ok(report)
}

async fn sync_entry(
    client: &DriveClient,
    entry: &FileMetadata,
    path: &Path,
) -> Result<SyncOutcome> {
    if is_synced(path) {
        info!("File already exists {}", path.display());
        return Ok(SyncOutcome::Skipped);
    }

    if entry.is_google_native() {
        let reason = format!(
            "{} has no downloadable content ({})",
            entry.name,
            entry.mime_type.as_deref().unwrap_or_default()
        );
        warn!("{}", reason);
        return Ok(SyncOutcome::DownloadFailed(reason));
    }

    info!("Downloading to {}", path.display());

    let response = match client.download(&entry.id).await {
        Ok(response) => response,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Failed to download {}: {}", entry.name, e);
            return Ok(SyncOutcome::DownloadFailed(e.to_string()));
        }
    };

    let mut file = match File::create(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to create {}: {}", path.display(), e);
            return Ok(SyncOutcome::CreateFailed(e.to_string()));
        }
    };

    let copied = write_body(response, &mut file).await;
    drop(file);

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to write {}: {}", path.display(), e);
            if let Err(e) = fs::remove_file(path).await {
                warn!("Failed to remove partial file {}: {}", path.display(), e);
            }
            return Ok(SyncOutcome::WriteFailed(e.to_string()));
        }
    };

    let outcome = match apply_modified_time(path, entry.modified_time.as_deref()) {
        Ok(()) => {
            info!("Stored {} ({})", path.display(), format_size(bytes));
            SyncOutcome::Downloaded { bytes }
        }
        Err(reason) => {
            warn!("{} for {}", reason, path.display());
            SyncOutcome::TimestampWarning { bytes, reason }
        }
    };
    Ok(outcome)
}

/// Stream the response body into `file`, returning the number of bytes written.
async fn write_body(response: Response, file: &mut File) -> Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

/// Set both access and modification time to the remote RFC 3339 timestamp.
fn apply_modified_time(path: &Path, modified: Option<&str>) -> std::result::Result<(), String> {
    let raw = modified.ok_or("remote file has no modification time")?;
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| format!("failed to parse modified time '{}': {}", raw, e))?;

    let time = FileTime::from_unix_time(parsed.timestamp(), parsed.timestamp_subsec_nanos());
    filetime::set_file_times(path, time, time)
        .map_err(|e| format!("failed to change file times: {}", e))
}
