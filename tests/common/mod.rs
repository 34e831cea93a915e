//! Helpers shared by the integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use drive_sync::auth::InstalledFlow;
use drive_sync::{Authenticator, ClientConfig, CodeProvider, DriveClient, StoredToken, TokenStore};
use serde_json::json;
use std::path::Path;

pub const ACCESS_TOKEN: &str = "ya29.test-access";

/// Client config whose token endpoint lives on the mock server.
pub fn client_config(server_url: &str) -> ClientConfig {
    let secret = json!({
        "installed": {
            "client_id": "client-123.apps.googleusercontent.com",
            "client_secret": "secret-456",
            "auth_uri": format!("{}/auth", server_url),
            "token_uri": format!("{}/token", server_url),
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob"]
        }
    });
    ClientConfig::from_json(&secret.to_string()).unwrap()
}

pub fn valid_token() -> StoredToken {
    StoredToken {
        access_token: ACCESS_TOKEN.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Some(Utc::now() + Duration::hours(1)),
    }
}

/// A DriveClient pointed at the mock server with a valid token already in hand.
pub fn drive_client(server_url: &str, token_dir: &Path) -> DriveClient {
    let flow = InstalledFlow::new(&client_config(server_url)).unwrap();
    let store = TokenStore::new(token_dir.join("token.json"));
    let auth = Authenticator::with_token(flow, store, valid_token());
    DriveClient::with_base_url(auth, server_url)
}

/// Supplies a fixed code and remembers the URL it was shown.
#[derive(Default)]
pub struct FixedCode {
    pub code: String,
    pub seen_url: std::cell::RefCell<Option<String>>,
}

impl FixedCode {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            seen_url: Default::default(),
        }
    }
}

impl CodeProvider for FixedCode {
    fn authorization_code(&self, auth_url: &str) -> drive_sync::Result<String> {
        *self.seen_url.borrow_mut() = Some(auth_url.to_string());
        Ok(self.code.clone())
    }
}

/// Fails the test if the interactive flow is ever started.
pub struct NoInteraction;

impl CodeProvider for NoInteraction {
    fn authorization_code(&self, _auth_url: &str) -> drive_sync::Result<String> {
        panic!("interactive authorization should not be needed");
    }
}
