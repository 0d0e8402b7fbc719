//! Drives a small in-memory provider through ProviderServer the way the
//! plugin host would, with msgpack bytes in and out.

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfplug::data_source::*;
use tfplug::provider::*;
use tfplug::resource::*;
use tfplug::{
    import_state_passthrough_id, AttributeBuilder, AttributePath, AttributeType, Context,
    DataSource, DataSourceFactory, Diagnostics, DynamicValue, ProviderServer, Resource,
    ResourceFactory, SchemaBuilder, ServerConfig,
};

type Store = Arc<Mutex<HashMap<String, String>>>;

#[derive(Default)]
struct MemoryProvider {
    store: Store,
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn metadata(&self, _: Context, _: ProviderMetadataRequest) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "memory".to_string(),
            version: "0.0.1".to_string(),
        }
    }

    async fn schema(&self, _: Context, _: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("fail", AttributeType::Bool)
                        .optional()
                        .build(),
                )
                .build(),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn configure(
        &mut self,
        _: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = Diagnostics::new();
        if request
            .config
            .get_bool(&AttributePath::new("fail"))
            .unwrap_or(false)
        {
            diagnostics.add_error("Configuration failed", "asked to fail");
        }
        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(Arc::new(self.store.clone())),
        }
    }

    fn data_sources(&self) -> Vec<DataSourceFactory> {
        vec![echo_data_source as DataSourceFactory]
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        vec![item_resource as ResourceFactory]
    }
}

fn echo_data_source() -> Box<dyn DataSourceWithConfigure> {
    Box::new(EchoDataSource::default())
}

fn item_resource() -> Box<dyn ResourceWithConfigure> {
    Box::new(ItemResource::default())
}

fn store_from(provider_data: Option<Arc<dyn std::any::Any + Send + Sync>>) -> Result<Store, Diagnostics> {
    match provider_data {
        None => Err(Diagnostics::from(tfplug::Diagnostic::error(
            "Provider not configured",
            "",
        ))),
        Some(data) => data
            .downcast_ref::<Store>()
            .cloned()
            .ok_or_else(|| tfplug::Diagnostic::error("Unexpected provider data", "").into()),
    }
}

#[derive(Default)]
struct EchoDataSource {
    store: Option<Store>,
}

#[async_trait]
impl DataSource for EchoDataSource {
    async fn metadata(
        &self,
        _: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_echo", request.provider_type_name),
        }
    }

    async fn schema(&self, _: Context, _: DataSourceSchemaRequest) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("key", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("value", AttributeType::String)
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn validate(
        &self,
        _: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = Diagnostics::new();
        if request.config.is_null_at(&AttributePath::new("key")) {
            diagnostics.add_attribute_error(AttributePath::new("key"), "Missing key", "");
        }
        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, _: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut state = request.config.clone();
        let mut diagnostics = Diagnostics::new();
        let store = self.store.as_ref().map(|s| s.lock().unwrap().clone());
        match (request.config.get_string(&AttributePath::new("key")), store) {
            (Ok(key), Some(store)) => match store.get(&key) {
                Some(value) => state
                    .set_string(&AttributePath::new("value"), value.clone())
                    .unwrap(),
                None => diagnostics.add_error("No such key", key),
            },
            _ => diagnostics.add_error("Cannot read", ""),
        }
        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for EchoDataSource {
    async fn configure(
        &mut self,
        _: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match store_from(request.provider_data) {
            Ok(store) => {
                self.store = Some(store);
                ConfigureDataSourceResponse {
                    diagnostics: Diagnostics::new(),
                }
            }
            Err(diagnostics) => ConfigureDataSourceResponse { diagnostics },
        }
    }
}

#[derive(Default)]
struct ItemResource {
    store: Option<Store>,
}

impl ItemResource {
    fn store(&self) -> &Store {
        self.store.as_ref().unwrap()
    }
}

#[async_trait]
impl Resource for ItemResource {
    async fn metadata(&self, _: Context, request: ResourceMetadataRequest) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_item", request.provider_type_name),
        }
    }

    async fn schema(&self, _: Context, _: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("value", AttributeType::String)
                        .optional()
                        .build(),
                )
                .build(),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn create(&self, _: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let id = request.planned_state.get_string(&AttributePath::new("id")).unwrap();
        let value = request
            .planned_state
            .get_string(&AttributePath::new("value"))
            .unwrap_or_default();
        self.store().lock().unwrap().insert(id, value);
        CreateResourceResponse {
            new_state: request.planned_state,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn read(&self, _: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request.current_state.get_string(&AttributePath::new("id")).unwrap();
        let found = self.store().lock().unwrap().get(&id).cloned();
        let new_state = found.map(|value| {
            let mut state = DynamicValue::object();
            state.set_string(&AttributePath::new("id"), id).unwrap();
            state.set_string(&AttributePath::new("value"), value).unwrap();
            state
        });
        ReadResourceResponse {
            new_state,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn update(&self, _: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let id = request.prior_state.get_string(&AttributePath::new("id")).unwrap();
        let value = request
            .planned_state
            .get_string(&AttributePath::new("value"))
            .unwrap_or_default();
        self.store().lock().unwrap().insert(id, value);
        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn delete(&self, _: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request.prior_state.get_string(&AttributePath::new("id")).unwrap();
        self.store().lock().unwrap().remove(&id);
        DeleteResourceResponse {
            diagnostics: Diagnostics::new(),
        }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request)
    }
}

#[async_trait]
impl ResourceWithConfigure for ItemResource {
    async fn configure(
        &mut self,
        _: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match store_from(request.provider_data) {
            Ok(store) => {
                self.store = Some(store);
                ConfigureResourceResponse {
                    diagnostics: Diagnostics::new(),
                }
            }
            Err(diagnostics) => ConfigureResourceResponse { diagnostics },
        }
    }
}

fn server() -> ProviderServer<MemoryProvider> {
    ProviderServer::with_config(MemoryProvider::default(), ServerConfig::new().without_logging())
}

fn encode(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut value = DynamicValue::object();
    for (k, v) in pairs {
        value
            .set_string(&AttributePath::new(k), v.to_string())
            .unwrap();
    }
    value.encode_msgpack().unwrap()
}

fn decode(bytes: &[u8]) -> DynamicValue {
    DynamicValue::decode_msgpack(bytes).unwrap()
}

async fn configured_server() -> ProviderServer<MemoryProvider> {
    let server = server();
    let diags = server
        .configure_provider(Context::new(), "1.9.0", &DynamicValue::object().encode_msgpack().unwrap())
        .await;
    assert!(diags.is_empty());
    server
}

#[tokio::test]
async fn schema_lists_every_type_by_prefixed_name() {
    let server = server();
    let schemas = server.get_provider_schema(Context::new()).await;

    assert!(schemas.diagnostics.is_empty());
    assert!(schemas.provider.attribute("fail").is_some());
    assert!(schemas.data_sources.contains_key("memory_echo"));
    assert!(schemas.resources.contains_key("memory_item"));
}

#[tokio::test]
async fn read_before_configure_reports_diagnostic() {
    let server = server();
    let config = encode(&[("key", "a")]);

    let response = server.read_data_source(Context::new(), "memory_echo", &config).await;

    assert!(response.diagnostics.has_error());
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    assert_eq!(response.state, config);
}

#[tokio::test]
async fn failed_configure_keeps_provider_unconfigured() {
    let server = server();
    let mut config = DynamicValue::object();
    config.set_bool(&AttributePath::new("fail"), true).unwrap();

    let diags = server
        .configure_provider(Context::new(), "1.9.0", &config.encode_msgpack().unwrap())
        .await;
    assert!(diags.has_error());

    let response = server
        .read_resource(Context::new(), "memory_item", &encode(&[("id", "a")]))
        .await;
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn unknown_type_names_are_rejected() {
    let server = configured_server().await;

    let diags = server
        .validate_resource_config(Context::new(), "memory_nope", &encode(&[]))
        .await;
    assert_eq!(diags[0].summary, "Unknown resource type");

    let response = server
        .read_data_source(Context::new(), "memory_nope", &encode(&[]))
        .await;
    assert_eq!(response.diagnostics[0].summary, "Unknown data source type");
}

#[tokio::test]
async fn validate_runs_without_configuration() {
    let server = server();

    let diags = server
        .validate_data_source_config(Context::new(), "memory_echo", &encode(&[]))
        .await;

    assert!(diags.has_error());
    assert_eq!(diags[0].attribute, Some(AttributePath::new("key")));
}

#[tokio::test]
async fn undecodable_input_becomes_diagnostic() {
    let server = configured_server().await;
    let garbage = vec![0xc1];

    let response = server.read_resource(Context::new(), "memory_item", &garbage).await;

    assert!(response.diagnostics.has_error());
    assert_eq!(response.state, garbage);
}

#[tokio::test]
async fn apply_dispatches_create_update_delete() {
    let server = configured_server().await;
    let null = Vec::new();

    let created = server
        .apply_resource_change(
            Context::new(),
            "memory_item",
            &null,
            &encode(&[("id", "a"), ("value", "one")]),
            &encode(&[("id", "a"), ("value", "one")]),
        )
        .await;
    assert!(created.diagnostics.is_empty());
    assert_eq!(
        decode(&created.state).get_string(&AttributePath::new("value")).unwrap(),
        "one"
    );

    let updated = server
        .apply_resource_change(
            Context::new(),
            "memory_item",
            &created.state,
            &encode(&[("id", "a"), ("value", "two")]),
            &encode(&[("id", "a"), ("value", "two")]),
        )
        .await;
    assert!(updated.diagnostics.is_empty());

    let echoed = server
        .read_data_source(Context::new(), "memory_echo", &encode(&[("key", "a")]))
        .await;
    assert_eq!(
        decode(&echoed.state).get_string(&AttributePath::new("value")).unwrap(),
        "two"
    );

    let deleted = server
        .apply_resource_change(Context::new(), "memory_item", &updated.state, &null, &null)
        .await;
    assert!(deleted.diagnostics.is_empty());
    assert!(deleted.state.is_empty());

    let refreshed = server
        .read_resource(Context::new(), "memory_item", &updated.state)
        .await;
    assert!(refreshed.state.is_empty(), "deleted item should drop from state");
}

#[tokio::test]
async fn import_passes_id_through() {
    let server = configured_server().await;

    let response = server
        .import_resource_state(Context::new(), "memory_item", "abc")
        .await;

    assert!(response.diagnostics.is_empty());
    assert_eq!(response.imported.len(), 1);
    assert_eq!(response.imported[0].type_name, "memory_item");
    assert_eq!(
        decode(&response.imported[0].state)
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "abc"
    );
}

#[tokio::test]
async fn concurrent_requests_share_configured_provider_data() {
    let server = configured_server().await;
    let null = DynamicValue::null().encode_msgpack().unwrap();

    let creates = (0..8).map(|i| {
        let id = format!("item-{}", i);
        let planned = encode(&[("id", id.as_str()), ("value", "v")]);
        let server = &server;
        let null = &null;
        async move {
            server
                .apply_resource_change(Context::new(), "memory_item", null, &planned, &planned)
                .await
        }
    });
    let results = futures::future::join_all(creates).await;
    assert!(results.iter().all(|r| r.diagnostics.is_empty()));

    let reads = (0..8).map(|i| {
        let key = format!("item-{}", i);
        let config = encode(&[("key", key.as_str())]);
        let server = &server;
        async move {
            server
                .read_data_source(Context::new(), "memory_echo", &config)
                .await
        }
    });
    for response in futures::future::join_all(reads).await {
        assert!(response.diagnostics.is_empty());
        let value = decode(&response.state).get_string(&AttributePath::new("value"));
        assert_eq!(tokio_test::assert_ok!(value), "v");
    }
}
