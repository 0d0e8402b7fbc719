//! Work pool API implementation
//!
//! Work pools are addressed by name rather than id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::path_segment;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPool {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: String,
    #[serde(default)]
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub default_queue_id: Option<Uuid>,
    #[serde(default)]
    pub base_job_template: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkPoolCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub base_job_template: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkPoolUpdate {
    pub description: Option<String>,
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub base_job_template: Value,
}

#[async_trait]
pub trait WorkPoolsClient: Send + Sync {
    async fn create(&self, ctx: &Context, payload: &WorkPoolCreate) -> Result<WorkPool, ApiError>;
    async fn list(&self, ctx: &Context) -> Result<Vec<WorkPool>, ApiError>;
    async fn get(&self, ctx: &Context, name: &str) -> Result<WorkPool, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        name: &str,
        payload: &WorkPoolUpdate,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, name: &str) -> Result<(), ApiError>;
}

pub struct WorkPoolsApi {
    client: Client,
    base_url: String,
}

impl WorkPoolsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, path_segment(name))
    }
}

#[async_trait]
impl WorkPoolsClient for WorkPoolsApi {
    async fn create(&self, ctx: &Context, payload: &WorkPoolCreate) -> Result<WorkPool, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<WorkPool>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        self.client.post(ctx, &url, &json!({})).await
    }

    async fn get(&self, ctx: &Context, name: &str) -> Result<WorkPool, ApiError> {
        self.client.get(ctx, &self.url_for(name)).await
    }

    async fn update(
        &self,
        ctx: &Context,
        name: &str,
        payload: &WorkPoolUpdate,
    ) -> Result<(), ApiError> {
        self.client.patch(ctx, &self.url_for(name), payload).await
    }

    async fn delete(&self, ctx: &Context, name: &str) -> Result<(), ApiError> {
        self.client.delete(ctx, &self.url_for(name)).await
    }
}
