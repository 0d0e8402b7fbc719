//! Terraform provider for Prefect Cloud

pub mod api;
pub mod data_sources;
mod helpers;
pub mod provider_data;
pub mod resources;

pub use provider_data::PrefectProviderData;

use async_trait::async_trait;
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceFactory;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse,
};
use tfplug::resource::ResourceFactory;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics};
use uuid::Uuid;

use api::{Client, ClientOptions};

const DEFAULT_ENDPOINT: &str = "https://api.prefect.cloud";
const CLOUD_DOMAIN: &str = "prefect.cloud";

/// Provider block as written in configuration
#[derive(Debug, Default, Deserialize)]
struct PrefectProviderModel {
    endpoint: Option<String>,
    api_key: Option<String>,
    basic_auth_key: Option<String>,
    account_id: Option<String>,
    workspace_id: Option<String>,
}

/// Take the configured value, falling back to the environment. Empty strings
/// count as unset in both places.
fn setting(configured: Option<String>, env: &str) -> Option<String> {
    configured
        .filter(|value| !value.is_empty())
        .or_else(|| std::env::var(env).ok())
        .filter(|value| !value.is_empty())
}

/// Normalise the endpoint to an absolute URL ending in `/api`
fn api_endpoint(raw: &str) -> Result<url::Url, Diagnostic> {
    let trimmed = raw.trim_end_matches('/');
    let with_suffix = if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    };

    let invalid = |detail: String| {
        Diagnostic::attribute_error(
            AttributePath::new("endpoint"),
            "Invalid Prefect API endpoint",
            detail,
        )
    };

    let parsed = url::Url::parse(&with_suffix)
        .map_err(|e| invalid(format!("Could not parse endpoint {:?}: {}", raw, e)))?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(invalid(format!(
            "Endpoint {:?} must be an absolute URL such as {}",
            raw, DEFAULT_ENDPOINT
        )));
    }
    Ok(parsed)
}

fn is_cloud(endpoint: &url::Url) -> bool {
    endpoint
        .host_str()
        .is_some_and(|host| host == CLOUD_DOMAIN || host.ends_with(&format!(".{}", CLOUD_DOMAIN)))
}

pub struct PrefectProvider {
    configured: bool,
}

impl Default for PrefectProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefectProvider {
    pub fn new() -> Self {
        Self { configured: false }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn build_client(&self, config: PrefectProviderModel) -> Result<Client, Diagnostics> {
        let mut diagnostics = Diagnostics::new();

        let endpoint = setting(config.endpoint, "PREFECT_API_URL")
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let api_key = setting(config.api_key, "PREFECT_API_KEY");
        let basic_auth_key = setting(config.basic_auth_key, "PREFECT_BASIC_AUTH_KEY");
        let account_id = setting(config.account_id, "PREFECT_CLOUD_ACCOUNT_ID");
        let workspace_id = setting(config.workspace_id, "PREFECT_CLOUD_WORKSPACE_ID");

        let endpoint = match api_endpoint(&endpoint) {
            Ok(endpoint) => Some(endpoint),
            Err(diag) => {
                diagnostics.push(diag);
                None
            }
        };

        if let Some(endpoint) = &endpoint {
            if is_cloud(endpoint) && api_key.is_none() {
                diagnostics.add_attribute_error(
                    AttributePath::new("api_key"),
                    "Missing Prefect API key",
                    "The endpoint points at Prefect Cloud, which requires an API key. Set api_key in the provider block or the PREFECT_API_KEY environment variable.",
                );
            }
        }

        if api_key.is_some() && basic_auth_key.is_some() {
            diagnostics.add_attribute_error(
                AttributePath::new("basic_auth_key"),
                "Conflicting Prefect credentials",
                "api_key and basic_auth_key cannot both be set; use api_key for Prefect Cloud and basic_auth_key for self-hosted servers.",
            );
        }

        let account_id =
            helpers::parse_optional_uuid(account_id.as_deref(), "account_id", "Account ID")
                .unwrap_or_else(|diag| {
                    diagnostics.push(diag);
                    Uuid::nil()
                });
        let workspace_id =
            helpers::parse_optional_uuid(workspace_id.as_deref(), "workspace_id", "Workspace ID")
                .unwrap_or_else(|diag| {
                    diagnostics.push(diag);
                    Uuid::nil()
                });

        let endpoint = match endpoint {
            Some(endpoint) if !diagnostics.has_error() => endpoint,
            _ => return Err(diagnostics),
        };

        tracing::info!(
            endpoint = %endpoint,
            account_id = %account_id,
            workspace_id = %workspace_id,
            "Configuring Prefect client"
        );

        Client::new(ClientOptions {
            endpoint: endpoint.to_string().trim_end_matches('/').to_string(),
            api_key,
            basic_auth_key,
            default_account_id: account_id,
            default_workspace_id: workspace_id,
            ..Default::default()
        })
        .map_err(|e| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error(
                "Unable to create Prefect API client",
                format!("An unexpected error occurred when creating the Prefect API client: {}", e),
            );
            diagnostics
        })
    }
}

#[async_trait]
impl Provider for PrefectProvider {
    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "prefect".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manage Prefect Cloud accounts, workspaces and their contents")
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Prefect API URL, defaults to https://api.prefect.cloud. Can also be set with PREFECT_API_URL")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("Prefect Cloud API key. Can also be set with PREFECT_API_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("basic_auth_key", AttributeType::String)
                    .description("Basic auth key for self-hosted Prefect servers. Can also be set with PREFECT_BASIC_AUTH_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_id", AttributeType::String)
                    .description("Default account UUID. Can also be set with PREFECT_CLOUD_ACCOUNT_ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("Default workspace UUID. Can also be set with PREFECT_CLOUD_WORKSPACE_ID")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config: PrefectProviderModel = match helpers::decode_model(&request.config) {
            Ok(config) => config,
            Err(diag) => {
                return ConfigureProviderResponse {
                    diagnostics: diag.into(),
                    provider_data: None,
                }
            }
        };

        match self.build_client(config) {
            Ok(client) => {
                self.configured = true;
                let data: Arc<dyn Any + Send + Sync> =
                    Arc::new(PrefectProviderData::new(Arc::new(client)));
                ConfigureProviderResponse {
                    diagnostics: Diagnostics::new(),
                    provider_data: Some(data),
                }
            }
            Err(diagnostics) => {
                tracing::error!("Prefect provider configuration failed");
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn data_sources(&self) -> Vec<DataSourceFactory> {
        data_sources::factories()
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        resources::factories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::{Dynamic, DynamicValue};
    use tokio_test::{assert_err, assert_ok};

    const ENV_VARS: [&str; 5] = [
        "PREFECT_API_URL",
        "PREFECT_API_KEY",
        "PREFECT_BASIC_AUTH_KEY",
        "PREFECT_CLOUD_ACCOUNT_ID",
        "PREFECT_CLOUD_WORKSPACE_ID",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn config(values: &[(&str, &str)]) -> DynamicValue {
        let mut config = DynamicValue::object();
        for (name, value) in values {
            config
                .set_string(&AttributePath::new(name), value.to_string())
                .unwrap();
        }
        config
    }

    async fn configure(config: DynamicValue) -> (PrefectProvider, ConfigureProviderResponse) {
        let mut provider = PrefectProvider::new();
        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config,
                },
            )
            .await;
        (provider, response)
    }

    fn error_attribute(response: &ConfigureProviderResponse) -> Option<AttributePath> {
        response
            .diagnostics
            .errors()
            .next()
            .and_then(|diag| diag.attribute.clone())
    }

    #[test]
    fn endpoint_gets_api_suffix_once() {
        let cloud = assert_ok!(api_endpoint("https://api.prefect.cloud"));
        assert_eq!(cloud.as_str(), "https://api.prefect.cloud/api");

        let local = assert_ok!(api_endpoint("http://localhost:4200/api/"));
        assert_eq!(local.as_str(), "http://localhost:4200/api");

        let diag = assert_err!(api_endpoint("localhost"));
        assert_eq!(diag.attribute, Some(AttributePath::new("endpoint")));
    }

    #[test]
    fn cloud_hosts_are_recognised() {
        assert!(is_cloud(&api_endpoint("https://api.prefect.cloud").unwrap()));
        assert!(!is_cloud(&api_endpoint("http://localhost:4200").unwrap()));
        assert!(!is_cloud(&api_endpoint("https://notprefect.cloud.example").unwrap()));
    }

    #[tokio::test]
    #[serial]
    async fn configures_from_environment() {
        clear_env();
        std::env::set_var("PREFECT_API_KEY", "pnu_test");
        std::env::set_var(
            "PREFECT_CLOUD_ACCOUNT_ID",
            "11111111-1111-1111-1111-111111111111",
        );

        let (provider, response) = configure(DynamicValue::object()).await;

        assert!(!response.diagnostics.has_error());
        assert!(provider.is_configured());
        let data = response.provider_data.unwrap();
        assert!(data.downcast_ref::<PrefectProviderData>().is_some());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn config_values_take_precedence_over_environment() {
        clear_env();
        std::env::set_var("PREFECT_API_URL", "not a url");

        let (provider, response) =
            configure(config(&[("endpoint", "http://localhost:4200")])).await;

        assert!(!response.diagnostics.has_error());
        assert!(provider.is_configured());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn cloud_endpoint_requires_api_key() {
        clear_env();

        let (provider, response) = configure(DynamicValue::object()).await;

        assert!(response.diagnostics.has_error());
        assert!(!provider.is_configured());
        assert!(response.provider_data.is_none());
        assert_eq!(error_attribute(&response), Some(AttributePath::new("api_key")));
    }

    #[tokio::test]
    #[serial]
    async fn empty_values_count_as_unset() {
        clear_env();
        std::env::set_var("PREFECT_API_URL", "http://localhost:4200");

        let (_, response) = configure(config(&[
            ("endpoint", ""),
            ("account_id", ""),
            ("workspace_id", ""),
        ]))
        .await;

        assert!(!response.diagnostics.has_error());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn both_credentials_conflict() {
        clear_env();

        let (_, response) = configure(config(&[
            ("endpoint", "http://localhost:4200"),
            ("api_key", "pnu_test"),
            ("basic_auth_key", "admin:secret"),
        ]))
        .await;

        assert_eq!(
            error_attribute(&response),
            Some(AttributePath::new("basic_auth_key"))
        );
    }

    #[tokio::test]
    #[serial]
    async fn malformed_ids_are_attribute_errors() {
        clear_env();

        let (_, response) = configure(config(&[
            ("endpoint", "http://localhost:4200"),
            ("account_id", "not-a-uuid"),
            ("workspace_id", "also-not-a-uuid"),
        ]))
        .await;

        let attributes: Vec<_> = response
            .diagnostics
            .errors()
            .filter_map(|diag| diag.attribute.clone())
            .collect();
        assert_eq!(
            attributes,
            vec![
                AttributePath::new("account_id"),
                AttributePath::new("workspace_id")
            ]
        );
    }

    #[tokio::test]
    #[serial]
    async fn malformed_endpoint_is_an_attribute_error() {
        clear_env();

        let (_, response) = configure(config(&[("endpoint", "::nope")])).await;

        assert_eq!(error_attribute(&response), Some(AttributePath::new("endpoint")));
    }

    #[tokio::test]
    async fn rejects_non_object_config() {
        let (_, response) = configure(DynamicValue::new(Dynamic::String("x".into()))).await;
        assert!(response.diagnostics.has_error());
    }

    #[tokio::test]
    async fn serves_every_adapter() {
        let provider = PrefectProvider::new();
        assert_eq!(provider.data_sources().len(), 11);
        assert_eq!(provider.resources().len(), 8);
    }
}
