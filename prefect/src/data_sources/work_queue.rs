//! Work queue data source implementation

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
pub struct WorkQueueDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub workspace_id: Option<String>,
    pub work_pool_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_paused: Option<bool>,
    pub concurrency_limit: Option<i64>,
    pub priority: Option<i64>,
}

#[derive(Default)]
pub struct WorkQueueDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkQueueDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_work_queue(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkQueueDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        let pool_name = model.work_pool_name.clone().unwrap_or_default();
        let queues = client
            .work_queues(account_id, workspace_id, &pool_name)
            .map_err(|e| helpers::client_error("work queue", e))?;

        let name = model.name.clone().unwrap_or_default();
        tracing::debug!(%pool_name, %name, "Reading work queue");
        let queue = queues
            .get(ctx, &name)
            .await
            .map_err(|e| helpers::refresh_error("work queue", e))?;

        model.id = Some(queue.id.to_string());
        model.created = helpers::rfc3339(queue.created);
        model.updated = helpers::rfc3339(queue.updated);
        model.name = Some(queue.name);
        model.description = queue.description;
        model.is_paused = Some(queue.is_paused);
        model.concurrency_limit = queue.concurrency_limit;
        model.priority = queue.priority;

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for WorkQueueDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_work_queue", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a queue inside a Prefect work pool")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Work queue UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the work queue creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the work queue was last updated in RFC 3339 format")
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
                AttributeBuilder::new("work_pool_name", AttributeType::String)
                    .description("Name of the work pool the queue belongs to")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the work queue")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the work queue")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_paused", AttributeType::Bool)
                    .description("Whether this work queue is paused")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("concurrency_limit", AttributeType::Number)
                    .description("The concurrency limit applied to this work queue")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Number)
                    .description("Priority of the queue within its pool, lower runs first")
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
        let result = self.read_work_queue(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkQueueDataSource {
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
