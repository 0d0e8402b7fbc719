//! Service accounts, called bots by the Prefect Cloud API

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub actor_id: Option<Uuid>,
    pub name: String,
    pub account_id: Option<Uuid>,
    pub account_role_id: Option<Uuid>,
    pub account_role_name: Option<String>,
    pub api_key: Option<ServiceAccountApiKey>,
}

/// `key` is only present in the response to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountApiKey {
    pub id: Uuid,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountCreate {
    pub name: String,
    pub account_role_id: Option<Uuid>,
    pub api_key_expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountUpdate {
    pub name: String,
    pub account_role_id: Option<Uuid>,
}

#[async_trait]
pub trait ServiceAccountsClient: Send + Sync {
    async fn create(
        &self,
        ctx: &Context,
        payload: &ServiceAccountCreate,
    ) -> Result<ServiceAccount, ApiError>;
    async fn list(&self, ctx: &Context, names: &[String])
        -> Result<Vec<ServiceAccount>, ApiError>;
    async fn get(&self, ctx: &Context, id: Uuid) -> Result<ServiceAccount, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &ServiceAccountUpdate,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError>;
}

pub struct ServiceAccountsApi {
    client: Client,
    base_url: String,
}

impl ServiceAccountsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ServiceAccountsClient for ServiceAccountsApi {
    async fn create(
        &self,
        ctx: &Context,
        payload: &ServiceAccountCreate,
    ) -> Result<ServiceAccount, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn list(
        &self,
        ctx: &Context,
        names: &[String],
    ) -> Result<Vec<ServiceAccount>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("bots", "name", names);
        self.client.post(ctx, &url, &body).await
    }

    async fn get(&self, ctx: &Context, id: Uuid) -> Result<ServiceAccount, ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.get(ctx, &url).await
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &ServiceAccountUpdate,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.patch(ctx, &url, payload).await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.delete(ctx, &url).await
    }
}
