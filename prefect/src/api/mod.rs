//! Prefect API client
//!
//! `PrefectClient` is the facade the adapters talk to. Each accessor takes the
//! scoping identifiers for one kind of entity and returns a sub-client bound to
//! that scope. Accessors do no I/O; they fail only when the scope cannot be
//! resolved. A nil UUID means "use the provider default".

pub mod account_memberships;
pub mod account_roles;
pub mod accounts;
pub mod client;
pub mod collections;
pub mod common;
pub mod error;
pub mod pool;
pub mod service_accounts;
pub mod teams;
pub mod variables;
pub mod work_pools;
pub mod work_queues;
pub mod workspace_access;
pub mod workspace_roles;
pub mod workspaces;

pub use client::{Client, ClientOptions};
pub use error::ApiError;

use uuid::Uuid;

use account_memberships::AccountMembershipsClient;
use account_roles::AccountRolesClient;
use accounts::AccountsClient;
use collections::CollectionsClient;
use service_accounts::ServiceAccountsClient;
use teams::TeamsClient;
use variables::VariablesClient;
use work_pools::WorkPoolsClient;
use work_queues::WorkQueuesClient;
use workspace_access::WorkspaceAccessClient;
use workspace_roles::WorkspaceRolesClient;
use workspaces::WorkspacesClient;

pub trait PrefectClient: Send + Sync {
    fn accounts(&self, account_id: Uuid) -> Result<Box<dyn AccountsClient>, ApiError>;

    fn account_memberships(
        &self,
        account_id: Uuid,
    ) -> Result<Box<dyn AccountMembershipsClient>, ApiError>;

    fn account_roles(&self, account_id: Uuid) -> Result<Box<dyn AccountRolesClient>, ApiError>;

    fn collections(&self) -> Result<Box<dyn CollectionsClient>, ApiError>;

    fn teams(&self, account_id: Uuid) -> Result<Box<dyn TeamsClient>, ApiError>;

    fn workspaces(&self, account_id: Uuid) -> Result<Box<dyn WorkspacesClient>, ApiError>;

    fn workspace_access(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn WorkspaceAccessClient>, ApiError>;

    fn workspace_roles(&self, account_id: Uuid) -> Result<Box<dyn WorkspaceRolesClient>, ApiError>;

    fn work_pools(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn WorkPoolsClient>, ApiError>;

    fn work_queues(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
        work_pool_name: &str,
    ) -> Result<Box<dyn WorkQueuesClient>, ApiError>;

    fn variables(
        &self,
        account_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Box<dyn VariablesClient>, ApiError>;

    fn service_accounts(&self, account_id: Uuid)
        -> Result<Box<dyn ServiceAccountsClient>, ApiError>;
}
