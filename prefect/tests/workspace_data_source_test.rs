#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use chrono::{TimeZone, Utc};
use common::{object, SpyClient};
use prefect::api::workspaces::Workspace;
use prefect::data_sources::WorkspaceDataSource;
use std::any::Any;
use std::sync::Arc;
use tfplug::data_source::{
    ConfigureDataSourceRequest, DataSource, DataSourceMetadataRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::types::{AttributePath, DynamicValue};
use tfplug::Context;
use uuid::Uuid;

const WORKSPACE_ID: &str = "11111111-1111-1111-1111-111111111111";
const ACCOUNT_ID: &str = "22222222-2222-2222-2222-222222222222";

fn prod_workspace() -> Workspace {
    Workspace {
        id: Uuid::parse_str(WORKSPACE_ID).unwrap(),
        created: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        updated: None,
        account_id: None,
        name: "prod".to_string(),
        handle: "prod-handle".to_string(),
        description: None,
    }
}

async fn configured(provider_data: Option<Arc<dyn Any + Send + Sync>>) -> WorkspaceDataSource {
    let mut data_source = WorkspaceDataSource::new();
    let response = data_source
        .configure(Context::new(), ConfigureDataSourceRequest { provider_data })
        .await;
    assert!(!response.diagnostics.has_error());
    data_source
}

async fn read(data_source: &WorkspaceDataSource, config: DynamicValue) -> ReadDataSourceResponse {
    data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "prefect_workspace".to_string(),
                config,
            },
        )
        .await
}

fn string_at(value: &DynamicValue, name: &str) -> String {
    value.get_string(&AttributePath::new(name)).unwrap()
}

#[tokio::test]
async fn type_name_uses_provider_prefix() {
    let response = WorkspaceDataSource::new()
        .metadata(
            Context::new(),
            DataSourceMetadataRequest {
                provider_type_name: "prefect".to_string(),
            },
        )
        .await;
    assert_eq!(response.type_name, "prefect_workspace");
}

#[tokio::test]
async fn maps_remote_workspace_into_state() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    let response = read(&data_source, object(&[("id", WORKSPACE_ID)])).await;

    assert!(!response.diagnostics.has_error());
    let state = response.state;
    assert_eq!(string_at(&state, "id"), WORKSPACE_ID);
    assert_eq!(string_at(&state, "name"), "prod");
    assert_eq!(string_at(&state, "handle"), "prod-handle");
    assert_eq!(string_at(&state, "created"), "2023-01-01T00:00:00Z");
    assert!(state.is_null_at(&AttributePath::new("updated")));
    assert!(state.is_null_at(&AttributePath::new("description")));
    assert_eq!(spy.state.verb_calls(), 1);
}

#[tokio::test]
async fn id_and_name_together_conflict_without_calling_the_api() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    let response = read(&data_source, object(&[("id", ""), ("name", "prod")])).await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Conflicting workspace lookup keys");
    assert_eq!(spy.state.accessor_calls(), 0);
    assert_eq!(spy.state.verb_calls(), 0);
}

#[tokio::test]
async fn nil_and_empty_account_ids_fall_back_to_provider_default() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    for account_id in ["", "00000000-0000-0000-0000-000000000000"] {
        let response = read(
            &data_source,
            object(&[("id", WORKSPACE_ID), ("account_id", account_id)]),
        )
        .await;
        assert!(!response.diagnostics.has_error());
    }
    read(&data_source, object(&[("id", WORKSPACE_ID)])).await;

    assert_eq!(spy.state.account_ids(), vec![Uuid::nil(); 3]);
}

#[tokio::test]
async fn explicit_account_id_scopes_the_client() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    read(
        &data_source,
        object(&[("id", WORKSPACE_ID), ("account_id", ACCOUNT_ID)]),
    )
    .await;

    assert_eq!(
        spy.state.account_ids(),
        vec![Uuid::parse_str(ACCOUNT_ID).unwrap()]
    );
}

#[tokio::test]
async fn malformed_account_id_is_an_attribute_error() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    let response = read(
        &data_source,
        object(&[("id", WORKSPACE_ID), ("account_id", "not-a-uuid")]),
    )
    .await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].attribute, Some(AttributePath::new("account_id")));
    assert_eq!(spy.state.accessor_calls(), 0);
}

#[tokio::test]
async fn malformed_id_is_an_attribute_error() {
    let spy = SpyClient::serving(Some(prod_workspace()));
    let data_source = configured(Some(spy.provider_data())).await;

    let response = read(&data_source, object(&[("id", "prod")])).await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Error parsing Workspace ID");
    assert_eq!(errors[0].attribute, Some(AttributePath::new("id")));
    assert_eq!(spy.state.verb_calls(), 0);
}

#[tokio::test]
async fn missing_workspace_leaves_config_untouched() {
    let spy = SpyClient::serving(None);
    let data_source = configured(Some(spy.provider_data())).await;
    let config = object(&[("id", WORKSPACE_ID)]);

    let response = read(&data_source, config.clone()).await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Error refreshing workspace state");
    assert_eq!(response.state, config);
}

#[tokio::test]
async fn foreign_provider_data_is_rejected_at_configure() {
    let mut data_source = WorkspaceDataSource::new();
    let foreign: Arc<dyn Any + Send + Sync> = Arc::new("not a client".to_string());

    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(foreign),
            },
        )
        .await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Unexpected Data Source Configure Type");
}

#[tokio::test]
async fn unconfigured_read_reports_an_error() {
    let data_source = configured(None).await;

    let response = read(&data_source, object(&[("id", WORKSPACE_ID)])).await;

    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Provider not configured");
}
