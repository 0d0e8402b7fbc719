//! Data source implementations

pub mod account;
pub mod account_member;
pub mod account_role;
pub mod service_account;
pub mod team;
pub mod variable;
pub mod work_pool;
pub mod work_queue;
pub mod worker_metadata;
pub mod workspace;
pub mod workspace_role;

pub use account::AccountDataSource;
pub use account_member::AccountMemberDataSource;
pub use account_role::AccountRoleDataSource;
pub use service_account::ServiceAccountDataSource;
pub use team::TeamDataSource;
pub use variable::VariableDataSource;
pub use work_pool::WorkPoolDataSource;
pub use work_queue::WorkQueueDataSource;
pub use worker_metadata::WorkerMetadataDataSource;
pub use workspace::WorkspaceDataSource;
pub use workspace_role::WorkspaceRoleDataSource;

use tfplug::data_source::{DataSourceFactory, DataSourceWithConfigure};

fn account() -> Box<dyn DataSourceWithConfigure> {
    Box::new(AccountDataSource::new())
}

fn account_member() -> Box<dyn DataSourceWithConfigure> {
    Box::new(AccountMemberDataSource::new())
}

fn account_role() -> Box<dyn DataSourceWithConfigure> {
    Box::new(AccountRoleDataSource::new())
}

fn service_account() -> Box<dyn DataSourceWithConfigure> {
    Box::new(ServiceAccountDataSource::new())
}

fn team() -> Box<dyn DataSourceWithConfigure> {
    Box::new(TeamDataSource::new())
}

fn variable() -> Box<dyn DataSourceWithConfigure> {
    Box::new(VariableDataSource::new())
}

fn work_pool() -> Box<dyn DataSourceWithConfigure> {
    Box::new(WorkPoolDataSource::new())
}

fn work_queue() -> Box<dyn DataSourceWithConfigure> {
    Box::new(WorkQueueDataSource::new())
}

fn worker_metadata() -> Box<dyn DataSourceWithConfigure> {
    Box::new(WorkerMetadataDataSource::new())
}

fn workspace() -> Box<dyn DataSourceWithConfigure> {
    Box::new(WorkspaceDataSource::new())
}

fn workspace_role() -> Box<dyn DataSourceWithConfigure> {
    Box::new(WorkspaceRoleDataSource::new())
}

/// Every data source the provider serves
pub fn factories() -> Vec<DataSourceFactory> {
    vec![
        account as DataSourceFactory,
        account_member,
        account_role,
        service_account,
        team,
        variable,
        work_pool,
        work_queue,
        worker_metadata,
        workspace,
        workspace_role,
    ]
}
