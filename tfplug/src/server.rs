//! Server module for hosting a Terraform provider
//!
//! `ProviderServer` is the seam between the plugin host and a `Provider`. It
//! accepts msgpack-encoded values exactly as Terraform sends them, routes each
//! request to a freshly built and configured data source or resource, and
//! hands back encoded state plus diagnostics. Transport is left to the host.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceFactory, DataSourceMetadataRequest,
    DataSourceSchemaRequest, DataSourceWithConfigure, ReadDataSourceRequest,
    ValidateDataSourceConfigRequest,
};
use crate::provider::{
    ConfigureProviderRequest, Provider, ProviderMetadataRequest, ProviderSchemaRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceFactory, ResourceMetadataRequest,
    ResourceSchemaRequest, ResourceWithConfigure, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{Diagnostic, Diagnostics, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

/// Log level for the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a Terraform log level name (TRACE, DEBUG, INFO, WARN, ERROR)
    pub fn from_tf_log(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// TF_LOG_PROVIDER wins over TF_LOG, falling back to Info
    pub fn from_env() -> Self {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|value| Self::from_tf_log(&value))
            .unwrap_or(LogLevel::Info)
    }

    fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Server configuration for hosting a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether to install a stderr tracing subscriber
    pub enable_logging: bool,
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            log_level: LogLevel::from_env(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

/// Install the stderr subscriber. Terraform owns stdout, so logs never go there.
/// A subscriber installed earlier (by tests or the host) is left in place.
pub fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_tracing_level())
        .with_target(false)
        .with_ansi(false)
        .try_init();
}

/// Every schema the provider exposes, keyed by Terraform type name
pub struct GetProviderSchemaResponse {
    pub provider: Schema,
    pub data_sources: HashMap<String, Schema>,
    pub resources: HashMap<String, Schema>,
    pub diagnostics: Diagnostics,
}

/// Encoded state returned from a read or apply; empty bytes mean null
pub struct StateResponse {
    pub state: Vec<u8>,
    pub diagnostics: Diagnostics,
}

pub struct ImportedState {
    pub type_name: String,
    pub state: Vec<u8>,
}

pub struct ImportStateResponse {
    pub imported: Vec<ImportedState>,
    pub diagnostics: Diagnostics,
}

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

pub struct ProviderServer<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<ProviderData>,
    data_sources: OnceCell<HashMap<String, DataSourceFactory>>,
    resources: OnceCell<HashMap<String, ResourceFactory>>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ServerConfig::default())
    }

    pub fn with_config(provider: P, config: ServerConfig) -> Self {
        if config.enable_logging {
            init_logging(config.log_level);
        }

        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
            data_sources: OnceCell::new(),
            resources: OnceCell::new(),
        }
    }

    pub async fn get_provider_schema(&self, ctx: Context) -> GetProviderSchemaResponse {
        let mut diagnostics = Diagnostics::new();
        let provider_schema = {
            let provider = self.provider.read().await;
            provider.schema(ctx.clone(), ProviderSchemaRequest).await
        };
        diagnostics.extend(provider_schema.diagnostics);

        let mut data_sources = HashMap::new();
        for (name, factory) in self.data_source_factories().await {
            let response = factory().schema(ctx.clone(), DataSourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            data_sources.insert(name.clone(), response.schema);
        }

        let mut resources = HashMap::new();
        for (name, factory) in self.resource_factories().await {
            let response = factory().schema(ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resources.insert(name.clone(), response.schema);
        }

        GetProviderSchemaResponse {
            provider: provider_schema.schema,
            data_sources,
            resources,
            diagnostics,
        }
    }

    pub async fn configure_provider(
        &self,
        ctx: Context,
        terraform_version: &str,
        config: &[u8],
    ) -> Diagnostics {
        let config = match decode(config, "provider configuration") {
            Ok(config) => config,
            Err(diag) => return diag.into(),
        };

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    ctx,
                    ConfigureProviderRequest {
                        terraform_version: terraform_version.to_string(),
                        config,
                    },
                )
                .await
        };

        if !response.diagnostics.has_error() {
            *self.provider_data.write().await = response.provider_data;
            tracing::debug!("provider configured");
        }

        response.diagnostics
    }

    pub async fn validate_data_source_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: &[u8],
    ) -> Diagnostics {
        let Some(factory) = self.data_source_factories().await.get(type_name) else {
            return unknown_type("data source", type_name).into();
        };
        let config = match decode(config, "data source configuration") {
            Ok(config) => config,
            Err(diag) => return diag.into(),
        };

        factory()
            .validate(
                ctx,
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await
            .diagnostics
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        type_name: &str,
        config: &[u8],
    ) -> StateResponse {
        tracing::debug!(type_name, "reading data source");
        let unchanged = || config.to_vec();

        let data_source = match self.configured_data_source(ctx.clone(), type_name).await {
            Ok(ds) => ds,
            Err(diagnostics) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics,
                }
            }
        };
        let config_value = match decode(config, "data source configuration") {
            Ok(value) => value,
            Err(diag) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics: diag.into(),
                }
            }
        };

        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: type_name.to_string(),
                    config: config_value,
                },
            )
            .await;

        encode_state(&response.state, response.diagnostics, unchanged)
    }

    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: &[u8],
    ) -> Diagnostics {
        let Some(factory) = self.resource_factories().await.get(type_name) else {
            return unknown_type("resource", type_name).into();
        };
        let config = match decode(config, "resource configuration") {
            Ok(config) => config,
            Err(diag) => return diag.into(),
        };

        factory()
            .validate(
                ctx,
                ValidateResourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await
            .diagnostics
    }

    /// Refresh a resource. An empty state in the response means the object is
    /// gone and Terraform should drop it.
    pub async fn read_resource(
        &self,
        ctx: Context,
        type_name: &str,
        current_state: &[u8],
    ) -> StateResponse {
        tracing::debug!(type_name, "reading resource");
        let unchanged = || current_state.to_vec();

        let resource = match self.configured_resource(ctx.clone(), type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics,
                }
            }
        };
        let current = match decode(current_state, "resource state") {
            Ok(value) => value,
            Err(diag) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics: diag.into(),
                }
            }
        };

        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: type_name.to_string(),
                    current_state: current,
                },
            )
            .await;

        match response.new_state {
            Some(state) => encode_state(&state, response.diagnostics, unchanged),
            None => StateResponse {
                state: Vec::new(),
                diagnostics: response.diagnostics,
            },
        }
    }

    /// Apply a planned change. A null prior state creates, a null planned state
    /// deletes, anything else updates.
    pub async fn apply_resource_change(
        &self,
        ctx: Context,
        type_name: &str,
        prior_state: &[u8],
        planned_state: &[u8],
        config: &[u8],
    ) -> StateResponse {
        let unchanged = || prior_state.to_vec();

        let resource = match self.configured_resource(ctx.clone(), type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics,
                }
            }
        };

        let decoded = decode(prior_state, "prior state").and_then(|prior| {
            let planned = decode(planned_state, "planned state")?;
            let config = decode(config, "resource configuration")?;
            Ok((prior, planned, config))
        });
        let (prior, planned, config) = match decoded {
            Ok(values) => values,
            Err(diag) => {
                return StateResponse {
                    state: unchanged(),
                    diagnostics: diag.into(),
                }
            }
        };

        let type_name = type_name.to_string();
        if prior.is_null() {
            tracing::debug!(%type_name, "creating resource");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            encode_state(&response.new_state, response.diagnostics, unchanged)
        } else if planned.is_null() {
            tracing::debug!(%type_name, "deleting resource");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name,
                        prior_state: prior,
                    },
                )
                .await;
            let state = if response.diagnostics.has_error() {
                unchanged()
            } else {
                Vec::new()
            };
            StateResponse {
                state,
                diagnostics: response.diagnostics,
            }
        } else {
            tracing::debug!(%type_name, "updating resource");
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name,
                        prior_state: prior,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            encode_state(&response.new_state, response.diagnostics, unchanged)
        }
    }

    pub async fn import_resource_state(
        &self,
        ctx: Context,
        type_name: &str,
        id: &str,
    ) -> ImportStateResponse {
        tracing::debug!(type_name, id, "importing resource");
        let resource = match self.configured_resource(ctx.clone(), type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ImportStateResponse {
                    imported: Vec::new(),
                    diagnostics,
                }
            }
        };

        let response = resource
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: type_name.to_string(),
                    id: id.to_string(),
                },
            )
            .await;

        let mut diagnostics = response.diagnostics;
        let mut imported = Vec::new();
        for resource in response.imported_resources {
            match resource.state.encode_msgpack() {
                Ok(state) => imported.push(ImportedState {
                    type_name: resource.type_name,
                    state,
                }),
                Err(e) => diagnostics.add_error("Failed to encode imported state", e.to_string()),
            }
        }

        ImportStateResponse {
            imported,
            diagnostics,
        }
    }

    async fn configured_data_source(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Diagnostics> {
        let factory = self
            .data_source_factories()
            .await
            .get(type_name)
            .ok_or_else(|| Diagnostics::from(unknown_type("data source", type_name)))?;

        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx, ConfigureDataSourceRequest { provider_data })
            .await;
        if response.diagnostics.has_error() {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }

    async fn configured_resource(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Diagnostics> {
        let factory = self
            .resource_factories()
            .await
            .get(type_name)
            .ok_or_else(|| Diagnostics::from(unknown_type("resource", type_name)))?;

        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx, ConfigureResourceRequest { provider_data })
            .await;
        if response.diagnostics.has_error() {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn registered_factories(&self) -> (String, Vec<DataSourceFactory>, Vec<ResourceFactory>) {
        let provider = self.provider.read().await;
        let metadata = provider
            .metadata(Context::new(), ProviderMetadataRequest)
            .await;
        (metadata.type_name, provider.data_sources(), provider.resources())
    }

    async fn data_source_factories(&self) -> &HashMap<String, DataSourceFactory> {
        self.data_sources
            .get_or_init(|| async {
                let (provider_type_name, factories, _) = self.registered_factories().await;
                let mut map = HashMap::new();
                for factory in factories {
                    let metadata = factory()
                        .metadata(
                            Context::new(),
                            DataSourceMetadataRequest {
                                provider_type_name: provider_type_name.clone(),
                            },
                        )
                        .await;
                    map.insert(metadata.type_name, factory);
                }
                map
            })
            .await
    }

    async fn resource_factories(&self) -> &HashMap<String, ResourceFactory> {
        self.resources
            .get_or_init(|| async {
                let (provider_type_name, _, factories) = self.registered_factories().await;
                let mut map = HashMap::new();
                for factory in factories {
                    let metadata = factory()
                        .metadata(
                            Context::new(),
                            ResourceMetadataRequest {
                                provider_type_name: provider_type_name.clone(),
                            },
                        )
                        .await;
                    map.insert(metadata.type_name, factory);
                }
                map
            })
            .await
    }
}

fn decode(bytes: &[u8], what: &str) -> Result<DynamicValue, Diagnostic> {
    DynamicValue::decode_msgpack(bytes)
        .map_err(|e| Diagnostic::error(format!("Failed to decode {}", what), e.to_string()))
}

fn encode_state(
    state: &DynamicValue,
    mut diagnostics: Diagnostics,
    fallback: impl FnOnce() -> Vec<u8>,
) -> StateResponse {
    match state.encode_msgpack() {
        Ok(state) => StateResponse { state, diagnostics },
        Err(e) => {
            diagnostics.add_error("Failed to encode state", e.to_string());
            StateResponse {
                state: fallback(),
                diagnostics,
            }
        }
    }
}

fn unknown_type(kind: &str, type_name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Unknown {} type", kind),
        format!("This provider does not implement the {} \"{}\"", kind, type_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn log_level_prefers_provider_variable() {
        std::env::set_var("TF_LOG", "ERROR");
        std::env::set_var("TF_LOG_PROVIDER", "debug");
        assert_eq!(LogLevel::from_env(), LogLevel::Debug);

        std::env::remove_var("TF_LOG_PROVIDER");
        assert_eq!(LogLevel::from_env(), LogLevel::Error);

        std::env::remove_var("TF_LOG");
        assert_eq!(LogLevel::from_env(), LogLevel::Info);
    }

    #[test]
    #[serial]
    fn unrecognised_log_level_falls_through() {
        std::env::set_var("TF_LOG_PROVIDER", "verbose");
        std::env::set_var("TF_LOG", "warn");
        assert_eq!(LogLevel::from_env(), LogLevel::Warn);

        std::env::remove_var("TF_LOG_PROVIDER");
        std::env::remove_var("TF_LOG");
    }

    #[test]
    fn server_config_builders() {
        let config = ServerConfig::new()
            .without_logging()
            .with_log_level(LogLevel::Trace);
        assert!(!config.enable_logging);
        assert_eq!(config.log_level, LogLevel::Trace);
    }
}
