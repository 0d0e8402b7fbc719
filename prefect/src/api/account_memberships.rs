use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::common::any_filter;
use super::error::ApiError;

/// A user's membership in an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMembership {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub handle: String,
    pub email: String,
    pub account_role_id: Option<Uuid>,
    pub account_role_name: Option<String>,
}

#[async_trait]
pub trait AccountMembershipsClient: Send + Sync {
    /// Memberships whose email is in `emails`; all memberships when empty
    async fn list(
        &self,
        ctx: &Context,
        emails: &[String],
    ) -> Result<Vec<AccountMembership>, ApiError>;
}

pub struct AccountMembershipsApi {
    client: Client,
    base_url: String,
}

impl AccountMembershipsApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl AccountMembershipsClient for AccountMembershipsApi {
    async fn list(
        &self,
        ctx: &Context,
        emails: &[String],
    ) -> Result<Vec<AccountMembership>, ApiError> {
        let url = format!("{}/filter", self.base_url);
        let body = any_filter("account_memberships", "email", emails);
        self.client.post(ctx, &url, &body).await
    }
}
