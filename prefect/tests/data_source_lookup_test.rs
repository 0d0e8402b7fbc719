//! Data source lookups through ProviderServer against a mock Prefect API

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use common::{configured_server, decode, encode, string_at, value, ACCOUNT, WORKSPACE};
use mockito::Matcher;
use prefect::PrefectProvider;
use serde::Deserialize;
use serde_json::json;
use tfplug::server::StateResponse;
use tfplug::types::AttributePath;
use tfplug::{Context, ProviderServer};

const VARIABLE: &str = "33333333-3333-3333-3333-333333333333";
const BOT: &str = "55555555-5555-5555-5555-555555555555";
const ROLE: &str = "88888888-8888-8888-8888-888888888888";
const TEAM: &str = "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa";
const MEMBER: &str = "cccccccc-cccc-cccc-cccc-cccccccccccc";
const USER: &str = "dddddddd-dddd-dddd-dddd-dddddddddddd";

async fn read(
    provider: &ProviderServer<PrefectProvider>,
    type_name: &str,
    config: serde_json::Value,
) -> StateResponse {
    provider
        .read_data_source(Context::new(), type_name, &encode(&value(&config)))
        .await
}

/// Fails the test if any request reaches the mock server
async fn no_requests(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();
    for method in ["GET", "POST"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }
    mocks
}

fn filter_route(entity: &str) -> String {
    format!("/api/accounts/{}/{}/filter", ACCOUNT, entity)
}

fn single_error(response: &StateResponse) -> (String, Option<AttributePath>) {
    let errors: Vec<_> = response.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1, "{:?}", response.diagnostics);
    (errors[0].summary.clone(), errors[0].attribute.clone())
}

#[tokio::test]
async fn variable_lookup_needs_exactly_one_key() {
    let mut server = mockito::Server::new_async().await;
    let guards = no_requests(&mut server).await;
    let provider = configured_server(&server).await;

    let both = read(
        &provider,
        "prefect_variable",
        json!({"id": VARIABLE, "name": "greeting"}),
    )
    .await;
    assert_eq!(single_error(&both).0, "Conflicting variable lookup keys");

    let neither = read(&provider, "prefect_variable", json!({})).await;
    assert_eq!(single_error(&neither).0, "Missing variable lookup key");

    for mock in guards {
        mock.assert_async().await;
    }
}

#[derive(Deserialize)]
struct VariableState {
    id: String,
    value: String,
    tags: Vec<String>,
}

#[tokio::test]
async fn variable_is_found_by_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            format!(
                "/api/accounts/{}/workspaces/{}/variables/name/greeting",
                ACCOUNT, WORKSPACE
            )
            .as_str(),
        )
        .with_status(200)
        .with_body(
            json!({
                "id": VARIABLE,
                "created": "2024-05-01T10:00:00Z",
                "updated": null,
                "name": "greeting",
                "value": {"text": "hello"},
                "tags": ["team-a", "prod"],
            })
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(&provider, "prefect_variable", json!({"name": "greeting"})).await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state: VariableState = decode(&response.state).to_model().unwrap();
    assert_eq!(state.id, VARIABLE);
    assert_eq!(state.value, r#"{"text":"hello"}"#);
    assert_eq!(state.tags, vec!["team-a", "prod"]);
}

#[tokio::test]
async fn service_account_lookup_needs_exactly_one_key() {
    let mut server = mockito::Server::new_async().await;
    let guards = no_requests(&mut server).await;
    let provider = configured_server(&server).await;

    let both = read(
        &provider,
        "prefect_service_account",
        json!({"id": BOT, "name": "ci"}),
    )
    .await;
    assert_eq!(single_error(&both).0, "Conflicting service account lookup keys");

    let neither = read(&provider, "prefect_service_account", json!({})).await;
    assert_eq!(single_error(&neither).0, "Missing service account lookup key");

    for mock in guards {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn service_account_is_found_by_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", filter_route("bots").as_str())
        .match_body(Matcher::Json(json!({"bots": {"name": {"any_": ["ci"]}}})))
        .with_status(200)
        .with_body(
            json!([{
                "id": BOT,
                "created": "2024-05-01T10:00:00Z",
                "updated": "2024-05-01T10:00:00Z",
                "actor_id": null,
                "name": "ci",
                "account_role_name": "Member",
                "api_key": {
                    "id": ROLE,
                    "name": "ci-key",
                    "created": "2024-05-01T10:00:00Z",
                    "expiration": "2025-05-01T10:00:00Z",
                },
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(&provider, "prefect_service_account", json!({"name": "ci"})).await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state = decode(&response.state);
    assert_eq!(string_at(&state, "id"), BOT);
    assert_eq!(string_at(&state, "account_role_name"), "Member");
    assert_eq!(string_at(&state, "api_key_expiration"), "2025-05-01T10:00:00Z");
    assert!(state.is_null_at(&AttributePath::new("actor_id")));
}

#[tokio::test]
async fn missing_service_account_name_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", filter_route("bots").as_str())
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let config = json!({"name": "ghost"});
    let response = read(&provider, "prefect_service_account", config.clone()).await;

    assert_eq!(single_error(&response).0, "Could not find service account");
    assert_eq!(response.state, encode(&value(&config)));
}

#[tokio::test]
async fn team_is_found_by_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", filter_route("teams").as_str())
        .match_body(Matcher::Json(json!({"teams": {"name": {"any_": ["platform"]}}})))
        .with_status(200)
        .with_body(
            json!([{
                "id": TEAM,
                "created": "2024-01-01T00:00:00Z",
                "updated": null,
                "name": "platform",
                "description": null,
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(&provider, "prefect_team", json!({"name": "platform"})).await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state = decode(&response.state);
    assert_eq!(string_at(&state, "id"), TEAM);
    assert_eq!(string_at(&state, "created"), "2024-01-01T00:00:00Z");
    assert!(state.is_null_at(&AttributePath::new("updated")));
    assert!(state.is_null_at(&AttributePath::new("description")));
}

#[derive(Deserialize)]
struct AccountRoleState {
    id: String,
    permissions: Vec<String>,
    is_system_role: bool,
}

#[tokio::test]
async fn account_role_is_found_by_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", filter_route("account_roles").as_str())
        .match_body(Matcher::Json(
            json!({"account_roles": {"name": {"any_": ["Admin"]}}}),
        ))
        .with_status(200)
        .with_body(
            json!([{
                "id": ROLE,
                "name": "Admin",
                "permissions": ["manage_billing", "manage_members"],
                "is_system_role": true,
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(&provider, "prefect_account_role", json!({"name": "Admin"})).await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state: AccountRoleState = decode(&response.state).to_model().unwrap();
    assert_eq!(state.id, ROLE);
    assert_eq!(state.permissions, vec!["manage_billing", "manage_members"]);
    assert!(state.is_system_role);
}

#[tokio::test]
async fn filter_results_with_other_names_do_not_match() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", filter_route("account_roles").as_str())
        .with_status(200)
        .with_body(json!([{"id": ROLE, "name": "Administrator"}]).to_string())
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(&provider, "prefect_account_role", json!({"name": "Admin"})).await;

    assert_eq!(single_error(&response).0, "Could not find account role");
}

#[tokio::test]
async fn account_member_is_found_by_email() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", filter_route("account_memberships").as_str())
        .match_body(Matcher::Json(json!({
            "account_memberships": {"email": {"any_": ["ada@example.com"]}}
        })))
        .with_status(200)
        .with_body(
            json!([{
                "id": MEMBER,
                "actor_id": BOT,
                "user_id": USER,
                "first_name": "Ada",
                "last_name": null,
                "handle": "ada",
                "email": "ada@example.com",
                "account_role_id": ROLE,
                "account_role_name": "Member",
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(
        &provider,
        "prefect_account_member",
        json!({"email": "ada@example.com"}),
    )
    .await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state = decode(&response.state);
    assert_eq!(string_at(&state, "id"), MEMBER);
    assert_eq!(string_at(&state, "user_id"), USER);
    assert_eq!(string_at(&state, "first_name"), "Ada");
    assert!(state.is_null_at(&AttributePath::new("last_name")));
    assert_eq!(string_at(&state, "account_role_id"), ROLE);
}

#[derive(Deserialize)]
struct WorkspaceRoleState {
    id: String,
    scopes: Vec<String>,
    inherited_role_id: Option<String>,
    description: Option<String>,
}

#[tokio::test]
async fn workspace_role_is_found_by_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", filter_route("workspace_roles").as_str())
        .match_body(Matcher::Json(
            json!({"workspace_roles": {"name": {"any_": ["Developer"]}}}),
        ))
        .with_status(200)
        .with_body(
            json!([{
                "id": ROLE,
                "name": "Developer",
                "description": "Builds flows",
                "scopes": ["see_flows", "run_deployments"],
                "inherited_role_id": null,
            }])
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(
        &provider,
        "prefect_workspace_role",
        json!({"name": "Developer"}),
    )
    .await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state: WorkspaceRoleState = decode(&response.state).to_model().unwrap();
    assert_eq!(state.id, ROLE);
    assert_eq!(state.scopes, vec!["see_flows", "run_deployments"]);
    assert_eq!(state.description.as_deref(), Some("Builds flows"));
    assert_eq!(state.inherited_role_id, None);
}

#[derive(Deserialize)]
struct WorkQueueState {
    id: String,
    is_paused: bool,
    concurrency_limit: Option<i64>,
    priority: Option<i64>,
}

#[tokio::test]
async fn work_queue_is_read_from_its_pool() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            format!(
                "/api/accounts/{}/workspaces/{}/work_pools/default-pool/queues/high",
                ACCOUNT, WORKSPACE
            )
            .as_str(),
        )
        .with_status(200)
        .with_body(
            json!({
                "id": VARIABLE,
                "name": "high",
                "description": null,
                "is_paused": true,
                "concurrency_limit": 5,
                "priority": 1,
            })
            .to_string(),
        )
        .create_async()
        .await;
    let provider = configured_server(&server).await;

    let response = read(
        &provider,
        "prefect_work_queue",
        json!({"work_pool_name": "default-pool", "name": "high"}),
    )
    .await;

    mock.assert_async().await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let state: WorkQueueState = decode(&response.state).to_model().unwrap();
    assert_eq!(state.id, VARIABLE);
    assert!(state.is_paused);
    assert_eq!(state.concurrency_limit, Some(5));
    assert_eq!(state.priority, Some(1));
}
