//! Account API implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub handle: String,
    pub location: Option<String>,
    pub link: Option<String>,
    pub billing_email: Option<String>,
    #[serde(default)]
    pub settings: AccountSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub allow_public_workspaces: Option<bool>,
}

/// PATCH body for `/accounts/{id}`. Unset name and handle are left alone;
/// the optional contact fields go out as null so removing them clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub billing_email: Option<String>,
}

#[async_trait]
pub trait AccountsClient: Send + Sync {
    async fn get(&self, ctx: &Context) -> Result<Account, ApiError>;
    async fn update(&self, ctx: &Context, payload: &AccountUpdate) -> Result<(), ApiError>;
    async fn update_settings(
        &self,
        ctx: &Context,
        settings: &AccountSettings,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context) -> Result<(), ApiError>;
}

/// Bound to a single account: `{endpoint}/accounts/{id}`
pub struct AccountsApi {
    client: Client,
    base_url: String,
}

impl AccountsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl AccountsClient for AccountsApi {
    async fn get(&self, ctx: &Context) -> Result<Account, ApiError> {
        self.client.get(ctx, &self.base_url).await
    }

    async fn update(&self, ctx: &Context, payload: &AccountUpdate) -> Result<(), ApiError> {
        self.client.patch(ctx, &self.base_url, payload).await
    }

    async fn update_settings(
        &self,
        ctx: &Context,
        settings: &AccountSettings,
    ) -> Result<(), ApiError> {
        let url = format!("{}/settings", self.base_url);
        self.client.patch(ctx, &url, settings).await
    }

    async fn delete(&self, ctx: &Context) -> Result<(), ApiError> {
        self.client.delete(ctx, &self.base_url).await
    }
}
