//! Client secret parsing and run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DriveError, Result};

/// Google OAuth2 authorization endpoint.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only Google Drive scope.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Default location of the persisted token, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Number of entries fetched per listing page.
pub const LISTING_PAGE_SIZE: u32 = 25;

/// One section of a client secret file as downloaded from the Cloud console.
#[derive(Debug, Deserialize)]
struct SecretSection {
    client_id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SecretFile {
    installed: Option<SecretSection>,
    web: Option<SecretSection>,
}

/// OAuth client identity parsed from a client secret file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
}

impl ClientConfig {
    /// Load a client secret JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a client secret document with an `installed` or `web` section.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretFile = serde_json::from_str(json)?;
        let section = file.installed.or(file.web).ok_or_else(|| {
            DriveError::InvalidClientSecretError(
                "expected an 'installed' or 'web' section".to_string(),
            )
        })?;

        if section.client_id.trim().is_empty() {
            return Err(DriveError::InvalidClientSecretError(
                "client_id is empty".to_string(),
            ));
        }

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            auth_uri: section
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: section
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            redirect_uri: section.redirect_uris.into_iter().next(),
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
        })
    }
}

/// Everything a single sync run needs to know.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Name of the remote folder to mirror.
    pub folder_name: String,
    /// Local directory receiving the files.
    pub target_dir: PathBuf,
    /// Client secret JSON file.
    pub credentials_file: PathBuf,
    /// Where the OAuth token is persisted.
    pub token_file: PathBuf,
    /// Follow `nextPageToken` instead of stopping after the first page.
    pub all_pages: bool,
}

impl SyncOptions {
    pub fn new(
        folder_name: impl Into<String>,
        target_dir: impl Into<PathBuf>,
        credentials_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            folder_name: folder_name.into(),
            target_dir: target_dir.into(),
            credentials_file: credentials_file.into(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            all_pages: false,
        }
    }
}
