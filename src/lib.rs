//! drive_sync - Mirror one Google Drive folder into a local directory.
//!
//! A run resolves the folder by name, lists its files (newest first) and
//! downloads every file whose sanitized name is not already present as a
//! regular file in the target directory. Downloaded files get the remote
//! modification time.
//!
//! # Example
//!
//! ```no_run
//! use drive_sync::{run, StdinCodeProvider, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = SyncOptions::new("Camera Uploads", "./photos", "client_secret.json");
//!     let report = run(&options, &StdinCodeProvider).await?;
//!     println!("{} downloaded, {} skipped", report.downloaded(), report.skipped());
//!     Ok(())
//! }
//! ```

use std::path::Path;

use tracing::info;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod sanitize;
pub mod sync;
pub mod token_store;

// Re-exports for convenience
pub use auth::{Authenticator, CodeProvider, StdinCodeProvider};
pub use client::DriveClient;
pub use config::{ClientConfig, SyncOptions};
pub use error::{DriveError, Result};
pub use models::{FileMetadata, RemoteFolder};
pub use sanitize::sanitize_filename;
pub use sync::{SyncOutcome, SyncReport};
pub use token_store::{StoredToken, TokenStore};

/// Run a complete sync: authenticate, resolve the folder, list it and download.
///
/// Any error returned here means the run could not proceed at all. Failures
/// on individual files are part of the returned report.
pub async fn run(options: &SyncOptions, codes: &dyn CodeProvider) -> Result<SyncReport> {
    std::fs::create_dir_all(&options.target_dir)?;

    let config = ClientConfig::from_file(&options.credentials_file)?;
    let store = TokenStore::new(&options.token_file);
    let auth = Authenticator::authenticate(&config, store, codes).await?;
    let client = DriveClient::new(auth);

    sync_folder(
        &client,
        &options.folder_name,
        &options.target_dir,
        options.all_pages,
    )
    .await
}

/// Resolve `folder_name`, list its files and sync them into `target_dir`.
///
/// Fails without downloading anything when the folder does not exist or is
/// empty.
pub async fn sync_folder(
    client: &DriveClient,
    folder_name: &str,
    target_dir: &Path,
    all_pages: bool,
) -> Result<SyncReport> {
    let folder = client.find_folder(folder_name).await?;
    info!("Found folder {} {}", folder.name, folder.id);

    let files = client.list_children(&folder.id, all_pages).await?;
    if files.is_empty() {
        return Err(DriveError::EmptyFolder(folder.name));
    }

    sync::sync_entries(client, &files, target_dir).await
}
