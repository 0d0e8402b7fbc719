//! In-memory `PrefectClient` that records how the adapters use it

#![allow(dead_code)]

use async_trait::async_trait;
use serde::Serialize;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tfplug::types::{AttributePath, DynamicValue};
use tfplug::{Context, ProviderServer, ServerConfig};
use uuid::Uuid;

use prefect::api::account_memberships::AccountMembershipsClient;
use prefect::api::account_roles::AccountRolesClient;
use prefect::api::accounts::AccountsClient;
use prefect::api::collections::CollectionsClient;
use prefect::api::service_accounts::ServiceAccountsClient;
use prefect::api::teams::TeamsClient;
use prefect::api::variables::VariablesClient;
use prefect::api::work_pools::WorkPoolsClient;
use prefect::api::work_queues::WorkQueuesClient;
use prefect::api::workspace_access::WorkspaceAccessClient;
use prefect::api::workspace_roles::WorkspaceRolesClient;
use prefect::api::workspaces::{Workspace, WorkspaceCreate, WorkspaceUpdate, WorkspacesClient};
use prefect::api::{ApiError, PrefectClient};
use prefect::{PrefectProvider, PrefectProviderData};

pub const ACCOUNT: &str = "9e6e6a8c-0b4f-4b5e-8f0a-0d7f1a2b3c4d";
pub const WORKSPACE: &str = "11111111-1111-1111-1111-111111111111";

#[derive(Default)]
pub struct SpyState {
    pub accessor_calls: AtomicUsize,
    pub verb_calls: AtomicUsize,
    pub account_ids: Mutex<Vec<Uuid>>,
    /// Served by `get`; `None` answers not found
    pub workspace: Mutex<Option<Workspace>>,
}

impl SpyState {
    pub fn accessor_calls(&self) -> usize {
        self.accessor_calls.load(Ordering::SeqCst)
    }

    pub fn verb_calls(&self) -> usize {
        self.verb_calls.load(Ordering::SeqCst)
    }

    pub fn account_ids(&self) -> Vec<Uuid> {
        self.account_ids.lock().unwrap().clone()
    }
}

#[derive(Clone, Default)]
pub struct SpyClient {
    pub state: Arc<SpyState>,
}

impl SpyClient {
    pub fn serving(workspace: Option<Workspace>) -> Self {
        let spy = Self::default();
        *spy.state.workspace.lock().unwrap() = workspace;
        spy
    }

    pub fn provider_data(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::new(PrefectProviderData::new(Arc::new(self.clone())))
    }

    fn unsupported<T>(&self) -> Result<T, ApiError> {
        self.state.accessor_calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::MissingAccountId)
    }
}

impl PrefectClient for SpyClient {
    fn accounts(&self, _account_id: Uuid) -> Result<Box<dyn AccountsClient>, ApiError> {
        self.unsupported()
    }

    fn account_memberships(
        &self,
        _account_id: Uuid,
    ) -> Result<Box<dyn AccountMembershipsClient>, ApiError> {
        self.unsupported()
    }

    fn account_roles(&self, _account_id: Uuid) -> Result<Box<dyn AccountRolesClient>, ApiError> {
        self.unsupported()
    }

    fn collections(&self) -> Result<Box<dyn CollectionsClient>, ApiError> {
        self.unsupported()
    }

    fn teams(&self, _account_id: Uuid) -> Result<Box<dyn TeamsClient>, ApiError> {
        self.unsupported()
    }

    fn workspaces(&self, account_id: Uuid) -> Result<Box<dyn WorkspacesClient>, ApiError> {
        self.state.accessor_calls.fetch_add(1, Ordering::SeqCst);
        self.state.account_ids.lock().unwrap().push(account_id);
        Ok(Box::new(SpyWorkspaces {
            state: self.state.clone(),
        }))
    }

    fn workspace_access(
        &self,
        _account_id: Uuid,
        _workspace_id: Uuid,
    ) -> Result<Box<dyn WorkspaceAccessClient>, ApiError> {
        self.unsupported()
    }

    fn workspace_roles(
        &self,
        _account_id: Uuid,
    ) -> Result<Box<dyn WorkspaceRolesClient>, ApiError> {
        self.unsupported()
    }

    fn work_pools(
        &self,
        _account_id: Uuid,
        _workspace_id: Uuid,
    ) -> Result<Box<dyn WorkPoolsClient>, ApiError> {
        self.unsupported()
    }

    fn work_queues(
        &self,
        _account_id: Uuid,
        _workspace_id: Uuid,
        _work_pool_name: &str,
    ) -> Result<Box<dyn WorkQueuesClient>, ApiError> {
        self.unsupported()
    }

    fn variables(
        &self,
        _account_id: Uuid,
        _workspace_id: Uuid,
    ) -> Result<Box<dyn VariablesClient>, ApiError> {
        self.unsupported()
    }

    fn service_accounts(
        &self,
        _account_id: Uuid,
    ) -> Result<Box<dyn ServiceAccountsClient>, ApiError> {
        self.unsupported()
    }
}

struct SpyWorkspaces {
    state: Arc<SpyState>,
}

impl SpyWorkspaces {
    fn record(&self) {
        self.state.verb_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn current(&self) -> Result<Workspace, ApiError> {
        self.state
            .workspace
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::NotFound("workspace not found".to_string()))
    }
}

#[async_trait]
impl WorkspacesClient for SpyWorkspaces {
    async fn create(
        &self,
        _ctx: &Context,
        payload: &WorkspaceCreate,
    ) -> Result<Workspace, ApiError> {
        self.record();
        let workspace = Workspace {
            id: Uuid::new_v4(),
            created: None,
            updated: None,
            account_id: None,
            name: payload.name.clone(),
            handle: payload.handle.clone(),
            description: payload.description.clone(),
        };
        *self.state.workspace.lock().unwrap() = Some(workspace.clone());
        Ok(workspace)
    }

    async fn list(&self, _ctx: &Context, _handles: &[String]) -> Result<Vec<Workspace>, ApiError> {
        self.record();
        Ok(self.current().into_iter().collect())
    }

    async fn get(&self, _ctx: &Context, id: Uuid) -> Result<Workspace, ApiError> {
        self.record();
        self.current()
            .and_then(|workspace| match workspace.id == id {
                true => Ok(workspace),
                false => Err(ApiError::NotFound(format!("workspace {} not found", id))),
            })
    }

    async fn update(
        &self,
        _ctx: &Context,
        _id: Uuid,
        payload: &WorkspaceUpdate,
    ) -> Result<(), ApiError> {
        self.record();
        let mut guard = self.state.workspace.lock().unwrap();
        let workspace = guard
            .as_mut()
            .ok_or_else(|| ApiError::NotFound("workspace not found".to_string()))?;
        if let Some(name) = &payload.name {
            workspace.name = name.clone();
        }
        if let Some(handle) = &payload.handle {
            workspace.handle = handle.clone();
        }
        workspace.description = payload.description.clone();
        Ok(())
    }

    async fn delete(&self, _ctx: &Context, _id: Uuid) -> Result<(), ApiError> {
        self.record();
        self.state.workspace.lock().unwrap().take();
        Ok(())
    }
}

/// Object value with the given string attributes set
pub fn object(values: &[(&str, &str)]) -> DynamicValue {
    let mut value = DynamicValue::object();
    for (name, attr) in values {
        value
            .set_string(&AttributePath::new(name), attr.to_string())
            .unwrap();
    }
    value
}

/// Object value built from any serializable shape, lists and nulls included
pub fn value<T: Serialize>(shape: &T) -> DynamicValue {
    DynamicValue::from_model(shape).unwrap()
}

pub fn encode(value: &DynamicValue) -> Vec<u8> {
    value.encode_msgpack().unwrap()
}

pub fn decode(bytes: &[u8]) -> DynamicValue {
    DynamicValue::decode_msgpack(bytes).unwrap()
}

pub fn string_at(value: &DynamicValue, name: &str) -> String {
    value.get_string(&AttributePath::new(name)).unwrap()
}

/// Provider server configured against `server` with a default account and workspace
pub async fn configured_server(server: &mockito::ServerGuard) -> ProviderServer<PrefectProvider> {
    let provider = ProviderServer::with_config(
        PrefectProvider::new(),
        ServerConfig::new().without_logging(),
    );
    let endpoint = server.url();
    let config = object(&[
        ("endpoint", endpoint.as_str()),
        ("api_key", "pnu_test"),
        ("account_id", ACCOUNT),
        ("workspace_id", WORKSPACE),
    ]);
    let diagnostics = provider
        .configure_provider(Context::new(), "1.9.0", &encode(&config))
        .await;
    assert!(!diagnostics.has_error(), "{:?}", diagnostics);
    provider
}
