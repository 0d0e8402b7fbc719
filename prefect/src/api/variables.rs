use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::path_segment;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    /// Any JSON value
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body shared by create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableUpsert {
    pub name: String,
    pub value: Value,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait VariablesClient: Send + Sync {
    async fn create(&self, ctx: &Context, payload: &VariableUpsert) -> Result<Variable, ApiError>;
    async fn get(&self, ctx: &Context, id: Uuid) -> Result<Variable, ApiError>;
    async fn get_by_name(&self, ctx: &Context, name: &str) -> Result<Variable, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &VariableUpsert,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError>;
}

pub struct VariablesApi {
    client: Client,
    base_url: String,
}

impl VariablesApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl VariablesClient for VariablesApi {
    async fn create(&self, ctx: &Context, payload: &VariableUpsert) -> Result<Variable, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn get(&self, ctx: &Context, id: Uuid) -> Result<Variable, ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.get(ctx, &url).await
    }

    async fn get_by_name(&self, ctx: &Context, name: &str) -> Result<Variable, ApiError> {
        let url = format!("{}/name/{}", self.base_url, path_segment(name));
        self.client.get(ctx, &url).await
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Uuid,
        payload: &VariableUpsert,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.patch(ctx, &url, payload).await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, id);
        self.client.delete(ctx, &url).await
    }
}
