use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait TeamsClient: Send + Sync {
    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<Team>, ApiError>;
}

pub struct TeamsApi {
    client: Client,
    base_url: String,
}

impl TeamsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl TeamsClient for TeamsApi {
    async fn list(&self, ctx: &Context, names: &[String]) -> Result<Vec<Team>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("teams", "name", names);
        self.client.post(ctx, &url, &body).await
    }
}
