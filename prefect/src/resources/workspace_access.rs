//! Workspace access resource implementation
//!
//! Grants a workspace role to a user, service account or team. Creating and
//! updating are the same upsert call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};

use crate::api::workspace_access::{AccessorType, WorkspaceAccess, WorkspaceAccessClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceAccessResourceModel {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub workspace_id: Option<String>,
    pub accessor_type: Option<String>,
    pub accessor_id: Option<String>,
    pub workspace_role_id: Option<String>,
}

impl WorkspaceAccessResourceModel {
    fn apply(&mut self, access: WorkspaceAccess) {
        self.id = Some(access.id.to_string());
        self.workspace_role_id = Some(access.workspace_role_id.to_string());
        let accessor = access.team_id.or(access.bot_id).or(access.user_id);
        if let Some(accessor_id) = accessor {
            self.accessor_id = Some(accessor_id.to_string());
        }
    }

    fn accessor_type(&self) -> Result<AccessorType, Diagnostic> {
        self.accessor_type
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: String| {
                Diagnostic::attribute_error(
                    AttributePath::new("accessor_type"),
                    "Invalid accessor type",
                    e,
                )
            })
    }
}

#[derive(Default)]
pub struct WorkspaceAccessResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceAccessResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn access(
        &self,
        model: &WorkspaceAccessResourceModel,
    ) -> Result<Box<dyn WorkspaceAccessClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        client
            .workspace_access(account_id, workspace_id)
            .map_err(|e| helpers::client_error("workspace access", e))
    }

    async fn upsert_access(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
        failure: fn(&str, crate::api::ApiError) -> Diagnostic,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkspaceAccessResourceModel = helpers::decode_model(planned)?;
        let accessor_type = model.accessor_type()?;
        let accessor_id =
            helpers::parse_required_uuid(model.accessor_id.as_deref(), "accessor_id", "Accessor ID")?;
        let role_id = helpers::parse_required_uuid(
            model.workspace_role_id.as_deref(),
            "workspace_role_id",
            "Workspace Role ID",
        )?;
        let access = self.access(&model)?;

        tracing::info!(%accessor_type, %accessor_id, %role_id, "Granting workspace access");
        let granted = access
            .upsert(ctx, accessor_type, accessor_id, role_id)
            .await
            .map_err(|e| failure("workspace access", e))?;

        model.apply(granted);
        helpers::encode_model(&model)
    }

    async fn read_access(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: WorkspaceAccessResourceModel = helpers::decode_model(state)?;
        let accessor_type = model.accessor_type()?;
        let access = self.access(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace Access ID")?;

        let granted = match access.get(ctx, accessor_type, id).await {
            Ok(granted) => granted,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("workspace access", e)),
        };

        model.apply(granted);
        helpers::encode_model(&model).map(Some)
    }

    async fn delete_access(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: WorkspaceAccessResourceModel = helpers::decode_model(prior)?;
        let accessor_type = model.accessor_type()?;
        let access = self.access(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace Access ID")?;
        let accessor_id =
            helpers::parse_required_uuid(model.accessor_id.as_deref(), "accessor_id", "Accessor ID")?;

        match access.delete(ctx, accessor_type, id, accessor_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("workspace access", e)),
        }
    }
}

#[async_trait]
impl Resource for WorkspaceAccessResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_workspace_access", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource granting a workspace role to a user, service account or team")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace access UUID")
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
                AttributeBuilder::new("accessor_type", AttributeType::String)
                    .description("USER, SERVICE_ACCOUNT or TEAM")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("accessor_id", AttributeType::String)
                    .description("ID of the user, service account or team being granted access")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_role_id", AttributeType::String)
                    .description("Workspace role UUID to grant")
                    .required()
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

        if let Ok(accessor_type) = request
            .config
            .get_string(&AttributePath::new("accessor_type"))
        {
            if let Err(e) = accessor_type.parse::<AccessorType>() {
                diagnostics.add_attribute_error(
                    AttributePath::new("accessor_type"),
                    "Invalid accessor type",
                    e,
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self
            .upsert_access(&ctx, &request.planned_state, helpers::create_error)
            .await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_access(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .upsert_access(&ctx, &request.planned_state, helpers::update_error)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_access(&ctx, &request.prior_state).await)
    }
}

#[async_trait]
impl ResourceWithConfigure for WorkspaceAccessResource {
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
