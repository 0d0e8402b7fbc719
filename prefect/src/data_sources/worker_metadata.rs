//! Worker metadata data source implementation
//!
//! Exposes the default base job template of every known worker type so work
//! pools can start from the template Prefect itself would use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, Diagnostics, DynamicValue};

use crate::api::collections::WorkerMetadataViews;
use crate::helpers::{self, DATA_SOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkerMetadataDataSourceModel {
    pub base_job_configs: Option<BTreeMap<String, String>>,
}

/// Worker type -> default base job template, flattened across collections.
/// A type listed by several collections keeps its first definition.
pub(crate) fn base_job_configs(views: WorkerMetadataViews) -> BTreeMap<String, String> {
    let mut configs = BTreeMap::new();
    for workers in views.into_values() {
        for (worker_type, metadata) in workers {
            configs
                .entry(worker_type)
                .or_insert_with(|| metadata.default_base_job_configuration.to_string());
        }
    }
    configs
}

#[derive(Default)]
pub struct WorkerMetadataDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkerMetadataDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_worker_metadata(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkerMetadataDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let collections = client
            .collections()
            .map_err(|e| helpers::client_error("collections", e))?;
        let views = collections
            .get_worker_metadata_views(ctx)
            .await
            .map_err(|e| helpers::refresh_error("worker metadata", e))?;

        let configs = base_job_configs(views);
        tracing::debug!(worker_types = configs.len(), "Read worker metadata");
        model.base_job_configs = Some(configs);

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for WorkerMetadataDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_worker_metadata", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source exposing the default base job templates of Prefect worker types")
            .attribute(
                AttributeBuilder::new(
                    "base_job_configs",
                    AttributeType::Map(Box::new(AttributeType::String)),
                )
                .description("Map of worker type to its default base job template, as JSON strings")
                .computed()
                .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let result = self.read_worker_metadata(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkerMetadataDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        ConfigureDataSourceResponse {
            diagnostics: helpers::configure_provider_data(
                &mut self.provider_data,
                request.provider_data,
                DATA_SOURCE,
            ),
        }
    }
}
