use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tfplug::Context;
use uuid::Uuid;

use super::account_memberships::{AccountMembershipsApi, AccountMembershipsClient};
use super::account_roles::{AccountRolesApi, AccountRolesClient};
use super::accounts::{AccountsApi, AccountsClient};
use super::collections::{CollectionsApi, CollectionsClient};
use super::common::{path_segment, ApiErrorResponse};
use super::error::ApiError;
use super::pool::{ConnectionPool, ConnectionPoolConfig, RequestStats};
use super::service_accounts::{ServiceAccountsApi, ServiceAccountsClient};
use super::teams::{TeamsApi, TeamsClient};
use super::variables::{VariablesApi, VariablesClient};
use super::work_pools::{WorkPoolsApi, WorkPoolsClient};
use super::work_queues::{WorkQueuesApi, WorkQueuesClient};
use super::workspace_access::{WorkspaceAccessApi, WorkspaceAccessClient};
use super::workspace_roles::{WorkspaceRolesApi, WorkspaceRolesClient};
use super::workspaces::{WorkspacesApi, WorkspacesClient};
use super::PrefectClient;

/// Settings used to build a [`Client`]
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Base API URL including the `/api` suffix
    pub endpoint: String,
    pub api_key: Option<String>,
    pub basic_auth_key: Option<String>,
    /// Nil when the provider has no default account
    pub default_account_id: Uuid,
    pub default_workspace_id: Uuid,
    pub pool: ConnectionPoolConfig,
}

/// Prefect API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: Option<String>,
    default_account_id: Uuid,
    default_workspace_id: Uuid,
    pool: ConnectionPool,
}

impl Client {
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let base_url = options.endpoint.trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(ApiError::InvalidEndpoint(base_url));
        }

        let auth_header = match (options.api_key, options.basic_auth_key) {
            (Some(key), _) => Some(format!("Bearer {}", key)),
            (None, Some(key)) => Some(format!("Basic {}", BASE64.encode(key.as_bytes()))),
            (None, None) => None,
        };

        let pool = ConnectionPool::new(options.pool);
        let http_client = pool.build_client()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth_header,
                default_account_id: options.default_account_id,
                default_workspace_id: options.default_workspace_id,
                pool,
            }),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, url: &str) -> Result<T, ApiError> {
        tracing::debug!("GET request to: {}", url);
        let request = self.inner.http_client.get(url);
        let text = self.execute(ctx, request).await?;
        parse_json(&text)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!("POST request to: {}", url);
        let request = self.inner.http_client.post(url).json(body);
        let text = self.execute(ctx, request).await?;
        parse_json(&text)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!("PUT request to: {}", url);
        let request = self.inner.http_client.put(url).json(body);
        let text = self.execute(ctx, request).await?;
        parse_json(&text)
    }

    /// PATCH endpoints answer 204, so there is nothing to decode
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        tracing::debug!("PATCH request to: {}", url);
        let request = self.inner.http_client.patch(url).json(body);
        self.execute(ctx, request).await.map(|_| ())
    }

    pub async fn delete(&self, ctx: &Context, url: &str) -> Result<(), ApiError> {
        tracing::debug!("DELETE request to: {}", url);
        let request = self.inner.http_client.delete(url);
        self.execute(ctx, request).await.map(|_| ())
    }

    /// Requests sent through this client and its clones so far
    pub async fn request_stats(&self) -> RequestStats {
        self.inner.pool.stats().await
    }

    async fn record(&self, status: Option<u16>) {
        let stats = self.inner.pool.record(status).await;
        tracing::debug!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Prefect API request finished"
        );
    }

    /// Send a request and return the body of a 2xx response.
    /// The call is abandoned as soon as the context is cancelled.
    async fn execute(
        &self,
        ctx: &Context,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        let request = match &self.inner.auth_header {
            Some(header) => request.header(AUTHORIZATION, header),
            None => request,
        };

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ApiError::Cancelled),
            response = request.send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.record(None).await;
                tracing::error!("Request to Prefect API failed: {}", e);
                return Err(ApiError::RequestError(e));
            }
        };

        let status = response.status();
        let text = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ApiError::Cancelled),
            text = response.text() => text?,
        };

        self.record(Some(status.as_u16())).await;
        if status.is_success() {
            tracing::debug!("API response body: {}", text);
            return Ok(text);
        }

        let message = ApiErrorResponse::message_from(&text);
        tracing::warn!(status = status.as_u16(), "Prefect API error: {}", message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::AuthError(status.as_u16()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            _ => Err(ApiError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    fn resolve_account(&self, account_id: Uuid) -> Option<Uuid> {
        let resolved = if account_id.is_nil() {
            self.inner.default_account_id
        } else {
            account_id
        };
        (!resolved.is_nil()).then_some(resolved)
    }

    fn resolve_workspace(&self, workspace_id: Uuid) -> Option<Uuid> {
        let resolved = if workspace_id.is_nil() {
            self.inner.default_workspace_id
        } else {
            workspace_id
        };
        (!resolved.is_nil()).then_some(resolved)
    }

    /// `{endpoint}/accounts/{account}` for Cloud-only routes
    pub(crate) fn account_url(&self, account_id: Uuid) -> Result<String, ApiError> {
        let account_id = self
            .resolve_account(account_id)
            .ok_or(ApiError::MissingAccountId)?;
        Ok(format!("{}/accounts/{}", self.inner.base_url, account_id))
    }

    /// Workspace routes are account scoped on Cloud and unscoped on a
    /// self-hosted server; half a scope is an error.
    pub(crate) fn workspace_url(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
        route: &str,
    ) -> Result<String, ApiError> {
        match (
            self.resolve_account(account_id),
            self.resolve_workspace(workspace_id),
        ) {
            (Some(account), Some(workspace)) => Ok(format!(
                "{}/accounts/{}/workspaces/{}/{}",
                self.inner.base_url, account, workspace, route
            )),
            (None, None) => Ok(format!("{}/{}", self.inner.base_url, route)),
            (Some(_), None) => Err(ApiError::MissingWorkspaceId),
            (None, Some(_)) => Err(ApiError::MissingAccountId),
        }
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::ParseError(e.to_string())
    })
}

impl PrefectClient for Client {
    fn accounts(&self, account_id: Uuid) -> Result<Box<dyn AccountsClient>, ApiError> {
        let base_url = self.account_url(account_id)?;
        Ok(Box::new(AccountsApi::new(self.clone(), base_url)))
    }

    fn account_memberships(
        &self,
        account_id: Uuid,
    ) -> Result<Box<dyn AccountMembershipsClient>, ApiError> {
        let base_url = format!("{}/account_memberships", self.account_url(account_id)?);
        Ok(Box::new(AccountMembershipsApi::new(self.clone(), base_url)))
    }

    fn account_roles(&self, account_id: Uuid) -> Result<Box<dyn AccountRolesClient>, ApiError> {
        let base_url = format!("{}/account_roles", self.account_url(account_id)?);
        Ok(Box::new(AccountRolesApi::new(self.clone(), base_url)))
    }

    fn collections(&self) -> Result<Box<dyn CollectionsClient>, ApiError> {
        let base_url = format!("{}/collections", self.inner.base_url);
        Ok(Box::new(CollectionsApi::new(self.clone(), base_url)))
    }

    fn teams(&self, account_id: Uuid) -> Result<Box<dyn TeamsClient>, ApiError> {
        let base_url = format!("{}/teams", self.account_url(account_id)?);
        Ok(Box::new(TeamsApi::new(self.clone(), base_url)))
    }

    fn workspaces(&self, account_id: Uuid) -> Result<Box<dyn WorkspacesClient>, ApiError> {
        let base_url = format!("{}/workspaces", self.account_url(account_id)?);
        Ok(Box::new(WorkspacesApi::new(self.clone(), base_url)))
    }

    fn workspace_access(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn WorkspaceAccessClient>, ApiError> {
        let account_url = self.account_url(account_id)?;
        let workspace_id = self
            .resolve_workspace(workspace_id)
            .ok_or(ApiError::MissingWorkspaceId)?;
        let base_url = format!("{}/workspaces/{}", account_url, workspace_id);
        Ok(Box::new(WorkspaceAccessApi::new(self.clone(), base_url)))
    }

    fn workspace_roles(&self, account_id: Uuid) -> Result<Box<dyn WorkspaceRolesClient>, ApiError> {
        let base_url = format!("{}/workspace_roles", self.account_url(account_id)?);
        Ok(Box::new(WorkspaceRolesApi::new(self.clone(), base_url)))
    }

    fn work_pools(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn WorkPoolsClient>, ApiError> {
        let base_url = self.workspace_url(account_id, workspace_id, "work_pools")?;
        Ok(Box::new(WorkPoolsApi::new(self.clone(), base_url)))
    }

    fn work_queues(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
        work_pool_name: &str,
    ) -> Result<Box<dyn WorkQueuesClient>, ApiError> {
        if work_pool_name.is_empty() {
            return Err(ApiError::MissingWorkPoolName);
        }
        let route = format!("work_pools/{}/queues", path_segment(work_pool_name));
        let base_url = self.workspace_url(account_id, workspace_id, &route)?;
        Ok(Box::new(WorkQueuesApi::new(self.clone(), base_url)))
    }

    fn variables(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn VariablesClient>, ApiError> {
        let base_url = self.workspace_url(account_id, workspace_id, "variables")?;
        Ok(Box::new(VariablesApi::new(self.clone(), base_url)))
    }

    fn service_accounts(
        &self,
        account_id: Uuid,
    ) -> Result<Box<dyn ServiceAccountsClient>, ApiError> {
        let base_url = format!("{}/bots", self.account_url(account_id)?);
        Ok(Box::new(ServiceAccountsApi::new(self.clone(), base_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "9e6e6a8c-0b4f-4b5e-8f0a-0d7f1a2b3c4d";
    const WORKSPACE: &str = "3f2a1b0c-4d5e-6f70-8192-a3b4c5d6e7f8";

    fn client(account: &str, workspace: &str) -> Client {
        Client::new(ClientOptions {
            endpoint: "https://api.prefect.cloud/api/".to_string(),
            api_key: Some("pnu_test".to_string()),
            default_account_id: account.parse().unwrap_or_default(),
            default_workspace_id: workspace.parse().unwrap_or_default(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_relative_endpoint() {
        let result = Client::new(ClientOptions {
            endpoint: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidEndpoint(_))));
    }

    #[test]
    fn account_scope_falls_back_to_default() {
        let client = client(ACCOUNT, "");
        assert_eq!(
            client.account_url(Uuid::nil()).unwrap(),
            format!("https://api.prefect.cloud/api/accounts/{}", ACCOUNT)
        );

        let explicit = Uuid::new_v4();
        assert_eq!(
            client.account_url(explicit).unwrap(),
            format!("https://api.prefect.cloud/api/accounts/{}", explicit)
        );
    }

    #[test]
    fn account_scoped_clients_need_an_account() {
        let client = client("", "");
        assert!(matches!(
            client.account_url(Uuid::nil()),
            Err(ApiError::MissingAccountId)
        ));
        assert!(client.teams(Uuid::nil()).is_err());
        assert!(client.collections().is_ok());
    }

    #[test]
    fn workspace_scope_rules() {
        let cloud = client(ACCOUNT, WORKSPACE);
        assert_eq!(
            cloud
                .workspace_url(Uuid::nil(), Uuid::nil(), "variables")
                .unwrap(),
            format!(
                "https://api.prefect.cloud/api/accounts/{}/workspaces/{}/variables",
                ACCOUNT, WORKSPACE
            )
        );

        let server = client("", "");
        assert_eq!(
            server
                .workspace_url(Uuid::nil(), Uuid::nil(), "variables")
                .unwrap(),
            "https://api.prefect.cloud/api/variables"
        );

        let half = client(ACCOUNT, "");
        assert!(matches!(
            half.workspace_url(Uuid::nil(), Uuid::nil(), "variables"),
            Err(ApiError::MissingWorkspaceId)
        ));
    }

    #[test]
    fn work_queues_need_a_pool_name() {
        let client = client(ACCOUNT, WORKSPACE);
        assert!(matches!(
            client.work_queues(Uuid::nil(), Uuid::nil(), ""),
            Err(ApiError::MissingWorkPoolName)
        ));
        assert!(client.work_queues(Uuid::nil(), Uuid::nil(), "default").is_ok());
    }

    #[tokio::test]
    async fn request_stats_are_shared_by_clones() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/api/missing")
            .with_status(404)
            .with_body(r#"{"detail":"Not found"}"#)
            .create_async()
            .await;

        let client = Client::new(ClientOptions {
            endpoint: format!("{}/api", server.url()),
            ..Default::default()
        })
        .unwrap();
        let clone = client.clone();
        let ctx = Context::new();

        let healthy: bool = client
            .get(&ctx, &format!("{}/api/health", server.url()))
            .await
            .unwrap();
        assert!(healthy);
        let err = clone
            .get::<bool>(&ctx, &format!("{}/api/missing", server.url()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let stats = client.request_stats().await;
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.last_status, Some(404));
    }
}
