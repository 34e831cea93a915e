//! On-disk persistence of the OAuth token.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DriveError, Result};

/// Access token with optional refresh capability.
///
/// The field layout matches what earlier releases wrote to `token.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Whether the access token is expired or about to expire.
    ///
    /// Tokens without an expiry are treated as valid. Older token files store
    /// "no expiry" as `0001-01-01T00:00:00Z`, so any expiry at or before the
    /// Unix epoch counts as unset.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) if expiry.timestamp() <= 0 => false,
            Some(expiry) => expiry <= Utc::now() + Duration::seconds(60),
            None => false,
        }
    }
}

/// Reads and writes a [`StoredToken`] at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token, returning `Ok(None)` if no token file exists.
    pub fn load(&self) -> Result<Option<StoredToken>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let token = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    /// Write the token, creating or truncating the file with owner-only permissions.
    pub fn save(&self, token: &StoredToken) -> Result<()> {
        info!("Saving credential file to: {}", self.path.display());
        self.write(token).map_err(|e| DriveError::TokenPersistError {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write(&self, token: &StoredToken) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(token)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(&json)?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_token() -> StoredToken {
        StoredToken {
            access_token: "ya29.access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let token = sample_token();

        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn test_save_truncates_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "x".repeat(4096)).unwrap();

        let store = TokenStore::new(&path);
        store.save(&sample_token()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&sample_token()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("nope").join("token.json"));
        let err = store.save(&sample_token()).unwrap_err();
        assert!(matches!(err, DriveError::TokenPersistError { .. }));
    }

    #[test]
    fn test_reads_legacy_token_layout() {
        let json = r#"{
            "access_token": "ya29.a0",
            "token_type": "Bearer",
            "refresh_token": "1//0g",
            "expiry": "2023-05-01T12:00:00.123456789+02:00"
        }"#;
        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("1//0g"));
        assert!(token.is_expired());
    }

    #[test]
    fn test_zero_expiry_means_no_expiry() {
        let json = r#"{
            "access_token": "ya29.a0",
            "token_type": "Bearer",
            "expiry": "0001-01-01T00:00:00Z"
        }"#;
        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert!(token.expiry.is_some());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = StoredToken {
            expiry: None,
            ..sample_token()
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_near_expiry_is_expired() {
        let token = StoredToken {
            expiry: Some(Utc::now() + Duration::seconds(30)),
            ..sample_token()
        };
        assert!(token.is_expired());
    }
}
