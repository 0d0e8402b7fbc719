use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRole {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub is_system_role: bool,
}

#[async_trait]
pub trait AccountRolesClient: Send + Sync {
    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<AccountRole>, ApiError>;
    async fn get(&self, ctx: &Context, id: Uuid) -> Result<AccountRole, ApiError>;
}

pub struct AccountRolesApi {
    client: Client,
    base_url: String,
}

impl AccountRolesApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl AccountRolesClient for AccountRolesApi {
    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<AccountRole>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("account_roles", "name", names);
        self.client.post(ctx, &url, &body).await
    }

    async fn get(&self, ctx: &Context, id: Uuid) -> Result<AccountRole, ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.get(ctx, &url).await
    }
}
