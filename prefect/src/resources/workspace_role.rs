//! Workspace role resource implementation

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

use crate::api::workspace_roles::{WorkspaceRole, WorkspaceRoleUpsert, WorkspaceRolesClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceRoleResourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub inherited_role_id: Option<String>,
}

impl WorkspaceRoleResourceModel {
    fn apply(&mut self, role: WorkspaceRole) {
        self.id = Some(role.id.to_string());
        self.created = helpers::rfc3339(role.created);
        self.updated = helpers::rfc3339(role.updated);
        self.name = Some(role.name);
        self.description = role.description;
        self.scopes = Some(role.scopes);
        self.inherited_role_id = helpers::uuid_string(role.inherited_role_id);
    }

    fn payload(&self) -> Result<WorkspaceRoleUpsert, Diagnostic> {
        Ok(WorkspaceRoleUpsert {
            name: self.name.clone().unwrap_or_default(),
            description: self.description.clone(),
            scopes: self.scopes.clone().unwrap_or_default(),
            inherited_role_id: helpers::parse_nullable_uuid(
                self.inherited_role_id.as_deref(),
                "inherited_role_id",
                "Inherited Role ID",
            )?,
        })
    }
}

#[derive(Default)]
pub struct WorkspaceRoleResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceRoleResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn roles(
        &self,
        model: &WorkspaceRoleResourceModel,
    ) -> Result<Box<dyn WorkspaceRolesClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        client
            .workspace_roles(account_id)
            .map_err(|e| helpers::client_error("workspace role", e))
    }

    async fn create_role(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkspaceRoleResourceModel = helpers::decode_model(planned)?;
        let roles = self.roles(&model)?;
        let payload = model.payload()?;

        let role = roles
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("workspace role", e))?;

        model.apply(role);
        helpers::encode_model(&model)
    }

    async fn read_role(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: WorkspaceRoleResourceModel = helpers::decode_model(state)?;
        let roles = self.roles(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace Role ID")?;

        let role = match roles.get(ctx, id).await {
            Ok(role) => role,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("workspace role", e)),
        };

        model.apply(role);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_role(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: WorkspaceRoleResourceModel = helpers::decode_model(prior)?;
        let mut model: WorkspaceRoleResourceModel = helpers::decode_model(planned)?;
        let roles = self.roles(&model)?;
        let id = helpers::parse_required_uuid(prior.id.as_deref(), "id", "Workspace Role ID")?;
        let payload = model.payload()?;

        roles
            .update(ctx, id, &payload)
            .await
            .map_err(|e| helpers::update_error("workspace role", e))?;

        let role = roles
            .get(ctx, id)
            .await
            .map_err(|e| helpers::refresh_error("workspace role", e))?;

        model.apply(role);
        helpers::encode_model(&model)
    }

    async fn delete_role(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: WorkspaceRoleResourceModel = helpers::decode_model(prior)?;
        let roles = self.roles(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace Role ID")?;

        match roles.delete(ctx, id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("workspace role", e)),
        }
    }
}

#[async_trait]
impl Resource for WorkspaceRoleResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_workspace_role", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect Cloud workspace role")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace role UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the role creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the role was last updated in RFC 3339 format")
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
                    .description("Name of the workspace role")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the workspace role")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "scopes",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("List of scopes granted by the workspace role")
                .optional()
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("inherited_role_id", AttributeType::String)
                    .description("Workspace role UUID whose scopes this role inherits")
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
        let result = self.create_role(&ctx, &request.planned_state).await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_role(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_role(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_role(&ctx, &request.prior_state).await)
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
impl ResourceWithConfigure for WorkspaceRoleResource {
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
