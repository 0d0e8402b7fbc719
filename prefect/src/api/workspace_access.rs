//! Grants of a workspace role to a user, service account or team

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use tfplug::Context;
use uuid::Uuid;

use super::client::Client;
use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorType {
    User,
    ServiceAccount,
    Team,
}

impl AccessorType {
    pub const ALL: [&'static str; 3] = ["USER", "SERVICE_ACCOUNT", "TEAM"];

    fn route(self) -> &'static str {
        match self {
            AccessorType::User => "user_access",
            AccessorType::ServiceAccount => "bot_access",
            AccessorType::Team => "team_access",
        }
    }

    fn id_field(self) -> &'static str {
        match self {
            AccessorType::User => "user_id",
            AccessorType::ServiceAccount => "bot_id",
            AccessorType::Team => "team_id",
        }
    }
}

impl fmt::Display for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessorType::User => "USER",
            AccessorType::ServiceAccount => "SERVICE_ACCOUNT",
            AccessorType::Team => "TEAM",
        };
        f.write_str(name)
    }
}

impl FromStr for AccessorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(AccessorType::User),
            "SERVICE_ACCOUNT" => Ok(AccessorType::ServiceAccount),
            "TEAM" => Ok(AccessorType::Team),
            other => Err(format!(
                "accessor_type must be one of {}, got {:?}",
                AccessorType::ALL.join(", "),
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceAccess {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub workspace_role_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

#[async_trait]
pub trait WorkspaceAccessClient: Send + Sync {
    /// Grant or re-grant `role_id` to the accessor
    async fn upsert(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        accessor_id: Uuid,
        role_id: Uuid,
    ) -> Result<WorkspaceAccess, ApiError>;

    async fn get(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        access_id: Uuid,
    ) -> Result<WorkspaceAccess, ApiError>;

    async fn delete(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        access_id: Uuid,
        accessor_id: Uuid,
    ) -> Result<(), ApiError>;
}

/// Bound to `{endpoint}/accounts/{a}/workspaces/{w}`
pub struct WorkspaceAccessApi {
    client: Client,
    base_url: String,
}

impl WorkspaceAccessApi {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl WorkspaceAccessClient for WorkspaceAccessApi {
    async fn upsert(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        accessor_id: Uuid,
        role_id: Uuid,
    ) -> Result<WorkspaceAccess, ApiError> {
        let url = format!("{}/{}/", self.base_url, accessor_type.route());
        let body = json!({
            "workspace_role_id": role_id,
            (accessor_type.id_field()): accessor_id,
        });
        self.client.put(ctx, &url, &body).await
    }

    async fn get(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        access_id: Uuid,
    ) -> Result<WorkspaceAccess, ApiError> {
        let url = format!("{}/{}/{}", self.base_url, accessor_type.route(), access_id);
        self.client.get(ctx, &url).await
    }

    /// Team grants are addressed by team id, the others by access id
    async fn delete(
        &self,
        ctx: &Context,
        accessor_type: AccessorType,
        access_id: Uuid,
        accessor_id: Uuid,
    ) -> Result<(), ApiError> {
        let target = match accessor_type {
            AccessorType::Team => accessor_id,
            _ => access_id,
        };
        let url = format!("{}/{}/{}", self.base_url, accessor_type.route(), target);
        self.client.delete(ctx, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_type_parses_known_values() {
        assert_eq!("USER".parse::<AccessorType>(), Ok(AccessorType::User));
        assert_eq!(
            "SERVICE_ACCOUNT".parse::<AccessorType>(),
            Ok(AccessorType::ServiceAccount)
        );
        assert_eq!("TEAM".parse::<AccessorType>(), Ok(AccessorType::Team));
        assert_eq!(AccessorType::ServiceAccount.to_string(), "SERVICE_ACCOUNT");
    }

    #[test]
    fn accessor_type_rejects_lowercase() {
        let err = "user".parse::<AccessorType>().unwrap_err();
        assert!(err.contains("USER, SERVICE_ACCOUNT, TEAM"));
    }
}
