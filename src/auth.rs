//! OAuth2 installed-application authentication for Google APIs.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{DriveError, Result};
use crate::token_store::{StoredToken, TokenStore};

/// Supplies an authorization code for a given consent URL.
pub trait CodeProvider {
    fn authorization_code(&self, auth_url: &str) -> Result<String>;
}

/// Prints the consent URL and reads the code from standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinCodeProvider;

impl CodeProvider for StdinCodeProvider {
    fn authorization_code(&self, auth_url: &str) -> Result<String> {
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        );
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        let code = line.trim();
        if code.is_empty() {
            return Err(DriveError::AuthenticationError(
                "no authorization code entered".to_string(),
            ));
        }
        Ok(code.to_string())
    }
}

/// The OAuth2 client for the installed-application flow.
#[derive(Debug, Clone)]
pub struct InstalledFlow {
    client: BasicClient,
    scopes: Vec<String>,
}

impl InstalledFlow {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let auth_url = AuthUrl::new(config.auth_uri.clone())
            .map_err(|e| DriveError::InvalidClientSecretError(format!("auth_uri: {}", e)))?;
        let token_url = TokenUrl::new(config.token_uri.clone())
            .map_err(|e| DriveError::InvalidClientSecretError(format!("token_uri: {}", e)))?;

        let mut client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            config.client_secret.clone().map(ClientSecret::new),
            auth_url,
            Some(token_url),
        );

        if let Some(redirect) = &config.redirect_uri {
            let redirect = RedirectUrl::new(redirect.clone())
                .map_err(|e| DriveError::InvalidClientSecretError(format!("redirect_uri: {}", e)))?;
            client = client.set_redirect_uri(redirect);
        }

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    /// Consent URL requesting offline access, so a refresh token is issued.
    pub fn authorization_url(&self) -> String {
        let (url, _csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .url();
        url.to_string()
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                DriveError::AuthenticationError(format!("Unable to retrieve token from web: {}", e))
            })?;

        Ok(to_stored_token(&response, None))
    }

    /// Obtain a fresh access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| DriveError::TokenRefreshError(e.to_string()))?;

        Ok(to_stored_token(&response, Some(refresh_token)))
    }
}

/// Google may omit the refresh token on refresh; the previous one stays valid then.
fn to_stored_token(response: &BasicTokenResponse, previous_refresh: Option<&str>) -> StoredToken {
    let expiry = response
        .expires_in()
        .and_then(|d| Duration::from_std(d).ok())
        .map(|d| Utc::now() + d);

    StoredToken {
        access_token: response.access_token().secret().clone(),
        token_type: "Bearer".to_string(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh.map(str::to_string)),
        expiry,
    }
}

/// Hands out valid access tokens, refreshing and persisting them as needed.
#[derive(Clone)]
pub struct Authenticator {
    flow: Arc<InstalledFlow>,
    store: Arc<TokenStore>,
    token: Arc<RwLock<StoredToken>>,
}

impl Authenticator {
    /// Load the persisted token, or run the interactive flow when there is none.
    ///
    /// A freshly obtained token is saved before this returns; failure to save
    /// is an error.
    pub async fn authenticate(
        config: &ClientConfig,
        store: TokenStore,
        codes: &dyn CodeProvider,
    ) -> Result<Self> {
        let flow = InstalledFlow::new(config)?;

        let token = match store.load() {
            Ok(Some(token)) => {
                debug!("Using token from {}", store.path().display());
                token
            }
            Ok(None) => Self::token_from_web(&flow, &store, codes).await?,
            Err(e) => {
                warn!(
                    "Ignoring unreadable token file {}: {}",
                    store.path().display(),
                    e
                );
                Self::token_from_web(&flow, &store, codes).await?
            }
        };

        Ok(Self::with_token(flow, store, token))
    }

    /// Build an authenticator around an already obtained token.
    pub fn with_token(flow: InstalledFlow, store: TokenStore, token: StoredToken) -> Self {
        Self {
            flow: Arc::new(flow),
            store: Arc::new(store),
            token: Arc::new(RwLock::new(token)),
        }
    }

    async fn token_from_web(
        flow: &InstalledFlow,
        store: &TokenStore,
        codes: &dyn CodeProvider,
    ) -> Result<StoredToken> {
        let code = codes.authorization_code(&flow.authorization_url())?;
        let token = flow.exchange_code(&code).await?;
        store.save(&token)?;
        Ok(token)
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            DriveError::AuthenticationError(format!(
                "access token expired and no refresh token is stored; delete {} to re-authorize",
                self.store.path().display()
            ))
        })?;

        info!("Refreshing expired access token");
        *token = self.flow.refresh(&refresh_token).await?;
        // The new token stays in use even if it cannot be written back.
        self.store.save(&token)?;

        Ok(token.access_token.clone())
    }

    /// Snapshot of the token currently in use.
    pub async fn current_token(&self) -> StoredToken {
        self.token.read().await.clone()
    }
}
