use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRole {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub account_id: Option<Uuid>,
    pub inherited_role_id: Option<Uuid>,
}

/// Body shared by create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceRoleUpsert {
    pub name: String,
    pub description: Option<String>,
    pub scopes: Vec<String>,
    pub inherited_role_id: Option<Uuid>,
}

#[async_trait]
pub trait WorkspaceRolesClient: Send + Sync {
    async fn create(
        &self,
        ctx: &Context,
        payload: &WorkspaceRoleUpsert,
    ) -> Result<WorkspaceRole, ApiError>;
    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<WorkspaceRole>, ApiError>;
    async fn get(&self, ctx: &Context, id: Uuid) -> Result<WorkspaceRole, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &WorkspaceRoleUpsert,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError>;
}

pub struct WorkspaceRolesApi {
    client: Client,
    base_url: String,
}

impl WorkspaceRolesApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl WorkspaceRolesClient for WorkspaceRolesApi {
    async fn create(
        &self,
        ctx: &Context,
        payload: &WorkspaceRoleUpsert,
    ) -> Result<WorkspaceRole, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<WorkspaceRole>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("workspace_roles", "name", names);
        self.client.post(ctx, &url, &body).await
    }

    async fn get(&self, ctx: &Context, id: Uuid) -> Result<WorkspaceRole, ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.get(ctx, &url).await
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &WorkspaceRoleUpsert,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.patch(ctx, &url, payload).await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.delete(ctx, &url).await
    }
}
