//! Worker metadata published by Prefect's integration collections

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tfplug::Context;

use super::client::Client;
use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerMetadata {
    #[serde(rename = "type")]
    pub worker_type: String,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub default_base_job_configuration: Value,
}

/// collection name -> worker type -> metadata
pub type WorkerMetadataViews = BTreeMap<String, BTreeMap<String, WorkerMetadata>>;

#[async_trait]
pub trait CollectionsClient: Send + Sync {
    async fn get_worker_metadata_views(&self, ctx: &Context)
        -> Result<WorkerMetadataViews, ApiError>;
}

pub struct CollectionsApi {
    client: Client,
    base_url: String,
}

impl CollectionsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CollectionsClient for CollectionsApi {
    async fn get_worker_metadata_views(
        &self,
        ctx: &Context,
    ) -> Result<WorkerMetadataViews, ApiError> {
        let url = format!("{}/views/aggregate-worker-metadata", self.base_url);
        self.client.get(ctx, &url).await
    }
}
