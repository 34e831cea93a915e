//! Google Drive API client for the read-only operations a sync needs.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Authenticator;
use crate::config::LISTING_PAGE_SIZE;
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, FileMetadata, RemoteFolder};
use crate::query::DriveQuery;

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested for each listed file.
const LISTING_FIELDS: &str = "nextPageToken, files(id, name, mimeType, createdTime, modifiedTime, size)";

/// Client for reading folders and file content from Google Drive.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    api_base: String,
}

impl DriveClient {
    /// Create a new DriveClient against the public Drive endpoint.
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a DriveClient against another API base, e.g. a local mock server.
    pub fn with_base_url(auth: Authenticator, api_base: impl Into<String>) -> Self {
        Self {
            auth,
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Find the folder with exactly this name.
    ///
    /// Only one result is requested; if several folders share the name, the
    /// first one the API returns wins.
    pub async fn find_folder(&self, name: &str) -> Result<RemoteFolder> {
        let query = DriveQuery::new().folders_only().name_eq(name).build();
        let page: FileListResponse<RemoteFolder> = self
            .list_page(&[
                ("q", query.as_str()),
                ("pageSize", "1"),
                ("fields", "files(id, name)"),
            ])
            .await?;

        page.files
            .into_iter()
            .next()
            .ok_or_else(|| DriveError::FolderNotFound(name.to_string()))
    }

    /// List files whose parent is `folder_id`, newest first.
    ///
    /// Returns at most one page of entries unless `all_pages` is set, in which
    /// case `nextPageToken` is followed until the listing is exhausted.
    pub async fn list_children(
        &self,
        folder_id: &str,
        all_pages: bool,
    ) -> Result<Vec<FileMetadata>> {
        let query = DriveQuery::new().in_parent(folder_id).build();
        let page_size = LISTING_PAGE_SIZE.to_string();
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("orderBy", "createdTime desc"),
                ("fields", LISTING_FIELDS),
            ];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.as_str()));
            }

            let page: FileListResponse<FileMetadata> = self.list_page(&params).await?;
            debug!("Listing page returned {} file(s)", page.files.len());
            all_files.extend(page.files);

            match page.next_page_token {
                Some(token) if all_pages => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_files)
    }

    /// Start downloading a file's raw content.
    ///
    /// The returned response has a success status; its body is the file.
    pub async fn download(&self, file_id: &str) -> Result<Response> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response)
    }

    async fn list_page<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<FileListResponse<T>> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }
}

/// Turn a failed response into an `ApiError`, preferring Google's error envelope.
async fn api_error(response: Response) -> DriveError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        };
    }
    DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    }
}
