//! Workspace resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};
use uuid::Uuid;

use crate::api::workspaces::{Workspace, WorkspaceCreate, WorkspaceUpdate, WorkspacesClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceResourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub description: Option<String>,
}

impl WorkspaceResourceModel {
    fn apply(&mut self, workspace: Workspace) {
        self.id = Some(workspace.id.to_string());
        self.created = helpers::rfc3339(workspace.created);
        self.updated = helpers::rfc3339(workspace.updated);
        self.name = Some(workspace.name);
        self.handle = Some(workspace.handle);
        self.description = workspace.description;
    }
}

#[derive(Default)]
pub struct WorkspaceResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn workspaces(
        &self,
        model: &WorkspaceResourceModel,
    ) -> Result<Box<dyn WorkspacesClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        client
            .workspaces(account_id)
            .map_err(|e| helpers::client_error("workspace", e))
    }

    fn workspace_id(model: &WorkspaceResourceModel) -> Result<Uuid, Diagnostic> {
        helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace ID")
    }

    async fn create_workspace(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkspaceResourceModel = helpers::decode_model(planned)?;
        let workspaces = self.workspaces(&model)?;

        let payload = WorkspaceCreate {
            name: model.name.clone().unwrap_or_default(),
            handle: model.handle.clone().unwrap_or_default(),
            description: model.description.clone(),
        };

        tracing::info!(handle = %payload.handle, "Creating workspace");
        let workspace = workspaces
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("workspace", e))?;

        model.apply(workspace);
        helpers::encode_model(&model)
    }

    async fn read_workspace(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: WorkspaceResourceModel = helpers::decode_model(state)?;
        let workspaces = self.workspaces(&model)?;
        let id = Self::workspace_id(&model)?;

        let workspace = match workspaces.get(ctx, id).await {
            Ok(workspace) => workspace,
            Err(e) if e.is_not_found() => {
                tracing::warn!(%id, "Workspace no longer exists, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(helpers::refresh_error("workspace", e)),
        };

        model.apply(workspace);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_workspace(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: WorkspaceResourceModel = helpers::decode_model(prior)?;
        let mut model: WorkspaceResourceModel = helpers::decode_model(planned)?;
        let workspaces = self.workspaces(&model)?;
        let id = Self::workspace_id(&prior)?;

        let payload = WorkspaceUpdate {
            name: model.name.clone(),
            handle: model.handle.clone(),
            description: model.description.clone(),
        };
        workspaces
            .update(ctx, id, &payload)
            .await
            .map_err(|e| helpers::update_error("workspace", e))?;

        let workspace = workspaces
            .get(ctx, id)
            .await
            .map_err(|e| helpers::refresh_error("workspace", e))?;

        model.apply(workspace);
        helpers::encode_model(&model)
    }

    async fn delete_workspace(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: WorkspaceResourceModel = helpers::decode_model(prior)?;
        let workspaces = self.workspaces(&model)?;
        let id = Self::workspace_id(&model)?;

        match workspaces.delete(ctx, id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("workspace", e)),
        }
    }
}

#[async_trait]
impl Resource for WorkspaceResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_workspace", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect Cloud workspace")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the workspace creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the workspace was last updated in RFC 3339 format")
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
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the workspace")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle for the workspace")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description for the workspace")
                    .optional()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self.create_workspace(&ctx, &request.planned_state).await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_workspace(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_workspace(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_workspace(&ctx, &request.prior_state).await)
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
impl ResourceWithConfigure for WorkspaceResource {
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
