use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::path_segment;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkQueue {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub priority: Option<i64>,
    pub work_pool_id: Option<Uuid>,
    pub work_pool_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueueCreate {
    pub name: String,
    pub description: Option<String>,
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueueUpdate {
    pub description: Option<String>,
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Queues inside one work pool
#[async_trait]
pub trait WorkQueuesClient: Send + Sync {
    async fn create(&self, ctx: &Context, payload: &WorkQueueCreate)
        -> Result<WorkQueue, ApiError>;
    async fn list(&self, ctx: &Context) -> Result<Vec<WorkQueue>, ApiError>;
    async fn get(&self, ctx: &Context, name: &str) -> Result<WorkQueue, ApiError>;
    async fn update(
        &self,
        ctx: &Context,
        name: &str,
        payload: &WorkQueueUpdate,
    ) -> Result<(), ApiError>;
    async fn delete(&self, ctx: &Context, name: &str) -> Result<(), ApiError>;
}

pub struct WorkQueuesApi {
    client: Client,
    base_url: String,
}

impl WorkQueuesApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, path_segment(name))
    }
}

#[async_trait]
impl WorkQueuesClient for WorkQueuesApi {
    async fn create(
        &self,
        ctx: &Context,
        payload: &WorkQueueCreate,
    ) -> Result<WorkQueue, ApiError> {
        let url = format!("{}/", self.base_url);
        self.client.post(ctx, &url, payload).await
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<WorkQueue>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        self.client.post(ctx, &url, &json!({})).await
    }

    async fn get(&self, ctx: &Context, name: &str) -> Result<WorkQueue, ApiError> {
        self.client.get(ctx, &self.url_for(name)).await
    }

    async fn update(
        &self,
        ctx: &Context,
        name: &str,
        payload: &WorkQueueUpdate,
    ) -> Result<(), ApiError> {
        self.client.patch(ctx, &self.url_for(name), payload).await
    }

    async fn delete(&self, ctx: &Context, name: &str) -> Result<(), ApiError> {
        self.client.delete(ctx, &self.url_for(name)).await
    }
}
