//! Work queue resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, Diagnostics, DynamicValue};

use crate::api::work_queues::{WorkQueue, WorkQueueCreate, WorkQueueUpdate, WorkQueuesClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkQueueResourceModel {
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

impl WorkQueueResourceModel {
    fn apply(&mut self, queue: WorkQueue) {
        self.id = Some(queue.id.to_string());
        self.created = helpers::rfc3339(queue.created);
        self.updated = helpers::rfc3339(queue.updated);
        self.name = Some(queue.name);
        self.description = queue.description;
        self.is_paused = Some(queue.is_paused);
        self.concurrency_limit = queue.concurrency_limit;
        self.priority = queue.priority;
        if let Some(pool_name) = queue.work_pool_name {
            self.work_pool_name = Some(pool_name);
        }
    }
}

#[derive(Default)]
pub struct WorkQueueResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkQueueResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn queues(
        &self,
        model: &WorkQueueResourceModel,
    ) -> Result<Box<dyn WorkQueuesClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        let pool_name = model.work_pool_name.as_deref().unwrap_or_default();
        client
            .work_queues(account_id, workspace_id, pool_name)
            .map_err(|e| helpers::client_error("work queue", e))
    }

    async fn create_queue(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkQueueResourceModel = helpers::decode_model(planned)?;
        let queues = self.queues(&model)?;

        let payload = WorkQueueCreate {
            name: model.name.clone().unwrap_or_default(),
            description: model.description.clone(),
            is_paused: model.is_paused.unwrap_or(false),
            concurrency_limit: model.concurrency_limit,
            priority: model.priority,
        };

        let queue = queues
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("work queue", e))?;

        model.apply(queue);
        helpers::encode_model(&model)
    }

    async fn read_queue(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: WorkQueueResourceModel = helpers::decode_model(state)?;
        let queues = self.queues(&model)?;
        let name = model.name.clone().unwrap_or_default();

        let queue = match queues.get(ctx, &name).await {
            Ok(queue) => queue,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("work queue", e)),
        };

        model.apply(queue);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_queue(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: WorkQueueResourceModel = helpers::decode_model(prior)?;
        let mut model: WorkQueueResourceModel = helpers::decode_model(planned)?;
        let queues = self.queues(&model)?;
        let name = prior.name.clone().unwrap_or_default();

        let payload = WorkQueueUpdate {
            description: model.description.clone(),
            is_paused: model.is_paused.unwrap_or(false),
            concurrency_limit: model.concurrency_limit,
            priority: model.priority,
        };
        queues
            .update(ctx, &name, &payload)
            .await
            .map_err(|e| helpers::update_error("work queue", e))?;

        let queue = queues
            .get(ctx, &name)
            .await
            .map_err(|e| helpers::refresh_error("work queue", e))?;

        model.apply(queue);
        helpers::encode_model(&model)
    }

    async fn delete_queue(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: WorkQueueResourceModel = helpers::decode_model(prior)?;
        let queues = self.queues(&model)?;
        let name = model.name.unwrap_or_default();

        match queues.delete(ctx, &name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("work queue", e)),
        }
    }
}

#[async_trait]
impl Resource for WorkQueueResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_work_queue", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a queue inside a Prefect work pool")
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
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_paused", AttributeType::Bool)
                    .description("Whether this work queue is paused")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("concurrency_limit", AttributeType::Number)
                    .description("The concurrency limit applied to this work queue")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Number)
                    .description("Priority of the queue within its pool, lower runs first")
                    .optional()
                    .computed()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self.create_queue(&ctx, &request.planned_state).await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_queue(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_queue(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_queue(&ctx, &request.prior_state).await)
    }
}

#[async_trait]
impl ResourceWithConfigure for WorkQueueResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        ConfigureResourceResponse {
            diagnostics: helpers::configure_provider_data(
                &mut self.provider_data,
                request.provider_data,
                RESOURCE,
            ),
        }
    }
}
