//! Workspace API implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
    pub name: String,
    pub handle: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceCreate {
    pub name: String,
    pub handle: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Sent as null when unset so a removed description is cleared
    pub description: Option<String>,
}

#[async_trait]
pub trait WorkspacesClient: Send + Sync {
    async fn create(&self, ctx: &Context, payload: &WorkspaceCreate)
        -> Result<Workspace, ApiError>;
    /// Workspaces whose handle is in `handles`; all workspaces when empty
    async fn list(&self, ctx: &Context, handles: &[String]) -> Result<Vec<Workspace>, ApiError>;
    async fn get(&self, ctx: &Context, id: Uuid) -> Result<Workspace, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &WorkspaceUpdate,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError>;
}

pub struct WorkspacesApi {
    client: Client,
    base_url: String,
}

impl WorkspacesApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url_for(&self, id: Uuid) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

#[async_trait]
impl WorkspacesClient for WorkspacesApi {
    async fn create(
        &self,
        ctx: &Context,
        payload: &WorkspaceCreate,
    ) -> Result<Workspace, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn list(&self, ctx: &Context, handles: &[String]) -> Result<Vec<Workspace>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("workspaces", "handle", handles);
        self.client.post(ctx, &url, &body).await
    }

    async fn get(&self, ctx: &Context, id: Uuid) -> Result<Workspace, ApiError> {
        self.client.get(ctx, &self.url_for(id)).await
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &WorkspaceUpdate,
    ) -> Result<(), ApiError> {
        self.client.patch(ctx, &self.url_for(id), payload).await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError> {
        self.client.delete(ctx, &self.url_for(id)).await
    }
}
