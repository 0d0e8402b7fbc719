//! Work pool data source implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, Diagnostics, DynamicValue};

use crate::helpers::{self, DATA_SOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkPoolDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: Option<String>,
    pub paused: Option<bool>,
    pub concurrency_limit: Option<i64>,
    pub default_queue_id: Option<String>,
    pub base_job_template: Option<String>,
}

#[derive(Default)]
pub struct WorkPoolDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkPoolDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_work_pool(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkPoolDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        let pools = client
            .work_pools(account_id, workspace_id)
            .map_err(|e| helpers::client_error("work pool", e))?;

        let name = model.name.clone().unwrap_or_default();
        tracing::debug!(%name, "Reading work pool");
        let pool = pools
            .get(ctx, &name)
            .await
            .map_err(|e| helpers::refresh_error("work pool", e))?;

        model.id = Some(pool.id.to_string());
        model.created = helpers::rfc3339(pool.created);
        model.updated = helpers::rfc3339(pool.updated);
        model.name = Some(pool.name);
        model.description = pool.description;
        model.pool_type = Some(pool.pool_type);
        model.paused = Some(pool.is_paused);
        model.concurrency_limit = pool.concurrency_limit;
        model.default_queue_id = helpers::uuid_string(pool.default_queue_id);
        model.base_job_template = Some(pool.base_job_template.to_string());

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for WorkPoolDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_work_pool", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect work pool")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Work pool UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the work pool creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the work pool was last updated in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_id", AttributeType::String)
                    .description("Account UUID, defaults to the account set in the provider")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("Workspace UUID, defaults to the workspace set in the provider")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the work pool")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the work pool")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Type of the work pool, e.g. kubernetes or process")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paused", AttributeType::Bool)
                    .description("Whether this work pool is paused")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("concurrency_limit", AttributeType::Number)
                    .description("The concurrency limit applied to this work pool")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("default_queue_id", AttributeType::String)
                    .description("The UUID of the default queue associated with this work pool")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("base_job_template", AttributeType::String)
                    .description("The base job template for the work pool, as a JSON string")
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
        let result = self.read_work_pool(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkPoolDataSource {
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
