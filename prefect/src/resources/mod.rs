//! Resource implementations

pub mod account;
pub mod service_account;
pub mod variable;
pub mod work_pool;
pub mod work_queue;
pub mod workspace;
pub mod workspace_access;
pub mod workspace_role;

pub use account::AccountResource;
pub use service_account::ServiceAccountResource;
pub use variable::VariableResource;
pub use work_pool::WorkPoolResource;
pub use work_queue::WorkQueueResource;
pub use workspace::WorkspaceResource;
pub use workspace_access::WorkspaceAccessResource;
pub use workspace_role::WorkspaceRoleResource;

use tfplug::resource::{ResourceFactory, ResourceWithConfigure};

fn account() -> Box<dyn ResourceWithConfigure> {
    Box::new(AccountResource::new())
}

fn service_account() -> Box<dyn ResourceWithConfigure> {
    Box::new(ServiceAccountResource::new())
}

fn variable() -> Box<dyn ResourceWithConfigure> {
    Box::new(VariableResource::new())
}

fn work_pool() -> Box<dyn ResourceWithConfigure> {
    Box::new(WorkPoolResource::new())
}

fn work_queue() -> Box<dyn ResourceWithConfigure> {
    Box::new(WorkQueueResource::new())
}

fn workspace() -> Box<dyn ResourceWithConfigure> {
    Box::new(WorkspaceResource::new())
}

fn workspace_access() -> Box<dyn ResourceWithConfigure> {
    Box::new(WorkspaceAccessResource::new())
}

fn workspace_role() -> Box<dyn ResourceWithConfigure> {
    Box::new(WorkspaceRoleResource::new())
}

/// Every resource the provider serves
pub fn factories() -> Vec<ResourceFactory> {
    vec![
        account as ResourceFactory,
        service_account,
        variable,
        work_pool,
        work_queue,
        workspace,
        workspace_access,
        workspace_role,
    ]
}
