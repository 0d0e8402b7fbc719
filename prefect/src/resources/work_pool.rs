//! Work pool resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};

use crate::api::work_pools::{WorkPool, WorkPoolCreate, WorkPoolUpdate, WorkPoolsClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

const DEFAULT_POOL_TYPE: &str = "process";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkPoolResourceModel {
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

impl WorkPoolResourceModel {
    fn apply(&mut self, pool: WorkPool) {
        self.id = Some(pool.id.to_string());
        self.created = helpers::rfc3339(pool.created);
        self.updated = helpers::rfc3339(pool.updated);
        self.name = Some(pool.name);
        self.description = pool.description;
        self.pool_type = Some(pool.pool_type);
        self.paused = Some(pool.is_paused);
        self.concurrency_limit = pool.concurrency_limit;
        self.default_queue_id = helpers::uuid_string(pool.default_queue_id);
        self.base_job_template = Some(helpers::normalized_json(
            self.base_job_template.as_deref(),
            &pool.base_job_template,
        ));
    }

    fn base_job_template(&self) -> Result<Value, Diagnostic> {
        match self.base_job_template.as_deref() {
            None | Some("") => Ok(json!({})),
            Some(raw) => helpers::parse_json_object(raw, "base_job_template"),
        }
    }
}

#[derive(Default)]
pub struct WorkPoolResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkPoolResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn pools(&self, model: &WorkPoolResourceModel) -> Result<Box<dyn WorkPoolsClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        client
            .work_pools(account_id, workspace_id)
            .map_err(|e| helpers::client_error("work pool", e))
    }

    async fn create_pool(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkPoolResourceModel = helpers::decode_model(planned)?;
        let pools = self.pools(&model)?;

        let payload = WorkPoolCreate {
            name: model.name.clone().unwrap_or_default(),
            description: model.description.clone(),
            pool_type: model
                .pool_type
                .clone()
                .unwrap_or_else(|| DEFAULT_POOL_TYPE.to_string()),
            is_paused: model.paused.unwrap_or(false),
            concurrency_limit: model.concurrency_limit,
            base_job_template: model.base_job_template()?,
        };

        tracing::info!(name = %payload.name, pool_type = %payload.pool_type, "Creating work pool");
        let pool = pools
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("work pool", e))?;

        model.apply(pool);
        helpers::encode_model(&model)
    }

    async fn read_pool(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: WorkPoolResourceModel = helpers::decode_model(state)?;
        let pools = self.pools(&model)?;
        let name = model.name.clone().unwrap_or_default();

        let pool = match pools.get(ctx, &name).await {
            Ok(pool) => pool,
            Err(e) if e.is_not_found() => {
                tracing::warn!(%name, "Work pool no longer exists, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(helpers::refresh_error("work pool", e)),
        };

        model.apply(pool);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_pool(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: WorkPoolResourceModel = helpers::decode_model(prior)?;
        let mut model: WorkPoolResourceModel = helpers::decode_model(planned)?;
        let pools = self.pools(&model)?;
        let name = prior.name.clone().unwrap_or_default();

        let payload = WorkPoolUpdate {
            description: model.description.clone(),
            is_paused: model.paused.unwrap_or(false),
            concurrency_limit: model.concurrency_limit,
            base_job_template: model.base_job_template()?,
        };
        pools
            .update(ctx, &name, &payload)
            .await
            .map_err(|e| helpers::update_error("work pool", e))?;

        let pool = pools
            .get(ctx, &name)
            .await
            .map_err(|e| helpers::refresh_error("work pool", e))?;

        model.apply(pool);
        helpers::encode_model(&model)
    }

    async fn delete_pool(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: WorkPoolResourceModel = helpers::decode_model(prior)?;
        let pools = self.pools(&model)?;
        let name = model.name.unwrap_or_default();

        match pools.delete(ctx, &name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("work pool", e)),
        }
    }
}

#[async_trait]
impl Resource for WorkPoolResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_work_pool", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect work pool")
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
                    .description("Name of the work pool; changing it replaces the pool")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the work pool")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Type of the work pool, defaults to process; changing it replaces the pool")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paused", AttributeType::Bool)
                    .description("Whether this work pool is paused")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("concurrency_limit", AttributeType::Number)
                    .description("The concurrency limit applied to this work pool")
                    .optional()
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
                    .description("The base job template for the work pool, as a JSON object string")
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

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = Diagnostics::new();

        if let Ok(template) = request
            .config
            .get_string(&AttributePath::new("base_job_template"))
        {
            if let Err(diag) = helpers::parse_json_object(&template, "base_job_template") {
                diagnostics.push(diag);
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self.create_pool(&ctx, &request.planned_state).await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_pool(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_pool(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_pool(&ctx, &request.prior_state).await)
    }

    /// Work pools are addressed by name, so the import ID is the pool name
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(&ctx, AttributePath::new("name"), &request)
    }
}

#[async_trait]
impl ResourceWithConfigure for WorkPoolResource {
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
