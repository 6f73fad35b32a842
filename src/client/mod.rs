//! HTTP client for the Azure DevOps REST API.
//!
//! The import core never talks to [`DevOpsClient`] directly. It depends on the
//! [`WorkItemLookup`] and [`WorkItemStore`] capabilities so tests can swap in
//! doubles.

mod patch;

pub use patch::*;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::*;

/// Default organization host. The organization itself goes in the path.
pub const DEFAULT_URL: &str = "https://dev.azure.com";

const READ_API_VERSION: &str = "4.1";
const WRITE_API_VERSION: &str = "6.1-preview.3";
const JSON_PATCH: &str = "application/json-patch+json";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: personal access token missing or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// Fetches existing work items while the hierarchy is being built.
#[async_trait]
pub trait WorkItemLookup: Send + Sync {
    async fn fetch_work_item(&self, project: &str, id: WorkItemId) -> Result<WorkItem, ClientError>;
}

/// Creates work items while the tree is being replicated.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// URL other items use to link to `id`.
    fn work_item_url(&self, project: &str, id: WorkItemId) -> String;

    /// Create one item of `kind` and return the identifier it was assigned.
    async fn create_work_item(
        &self,
        project: &str,
        kind: WorkItemKind,
        document: &PatchDocument,
    ) -> Result<WorkItemId, ClientError>;
}

/// HTTP client for one Azure DevOps organization.
#[derive(Debug, Clone)]
pub struct DevOpsClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl DevOpsClient {
    /// Create with explicit configuration. `base_url` is the organization
    /// URL, e.g. `https://dev.azure.com/acme`.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.organization_url()?,
            config.personal_access_token.clone(),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the token as basic auth, if one is configured.
    fn request(&self, method: Method, path: &str, api_version: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, &url)
            .query(&[("api-version", api_version)]);
        if let Some(ref token) = self.token {
            req = req.basic_auth("", Some(token));
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        // An expired token gets a sign-in page with 203 instead of a 401.
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(ClientError::Unauthorized);
        }
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    // ============================================================
    // Projects
    // ============================================================

    /// List the organization's projects.
    pub async fn list_projects(&self) -> Result<Vec<ProjectInfo>, ClientError> {
        let response = self
            .request(Method::GET, "_apis/projects", READ_API_VERSION)
            .send()
            .await?;
        let list: ListResponse<ProjectInfo> = self.handle_response(response).await?;
        Ok(list.value)
    }

    /// List the iterations of a project's default team (`{project} Team`).
    pub async fn list_iterations(&self, project: &str) -> Result<Vec<Iteration>, ClientError> {
        let path = format!("{}/{} Team/_apis/work/teamsettings/iterations", project, project);
        let response = self
            .request(Method::GET, &path, READ_API_VERSION)
            .send()
            .await?;
        let list: ListResponse<Iteration> = self.handle_response(response).await?;
        Ok(list.value)
    }

    // ============================================================
    // Work items
    // ============================================================

    /// Get a work item by id.
    pub async fn get_work_item(
        &self,
        project: &str,
        id: WorkItemId,
    ) -> Result<WorkItem, ClientError> {
        let response = self
            .request(
                Method::GET,
                &format!("{}/_apis/wit/workitems/{}", project, id),
                READ_API_VERSION,
            )
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a work item of `kind` from a patch document.
    pub async fn post_work_item(
        &self,
        project: &str,
        kind: WorkItemKind,
        document: &PatchDocument,
    ) -> Result<WorkItem, ClientError> {
        let body = serde_json::to_vec(document)?;
        let response = self
            .request(
                Method::POST,
                &format!("{}/_apis/wit/workitems/${}", project, kind.type_name()),
                WRITE_API_VERSION,
            )
            .header(CONTENT_TYPE, JSON_PATCH)
            .body(body)
            .send()
            .await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl WorkItemLookup for DevOpsClient {
    async fn fetch_work_item(
        &self,
        project: &str,
        id: WorkItemId,
    ) -> Result<WorkItem, ClientError> {
        self.get_work_item(project, id).await
    }
}

#[async_trait]
impl WorkItemStore for DevOpsClient {
    fn work_item_url(&self, project: &str, id: WorkItemId) -> String {
        format!("{}/{}/_apis/wit/workitems/{}", self.base_url, project, id)
    }

    async fn create_work_item(
        &self,
        project: &str,
        kind: WorkItemKind,
        document: &PatchDocument,
    ) -> Result<WorkItemId, ClientError> {
        let item = self.post_work_item(project, kind, document).await?;
        Ok(item.id)
    }
}
