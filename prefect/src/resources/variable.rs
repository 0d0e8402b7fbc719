//! Variable resource implementation

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
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};

use crate::api::variables::{Variable, VariableUpsert, VariablesClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VariableResourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl VariableResourceModel {
    fn apply(&mut self, variable: Variable) {
        self.id = Some(variable.id.to_string());
        self.created = helpers::rfc3339(variable.created);
        self.updated = helpers::rfc3339(variable.updated);
        self.name = Some(variable.name);
        self.value = Some(helpers::normalized_json(
            self.value.as_deref(),
            &variable.value,
        ));
        self.tags = Some(variable.tags);
    }

    fn payload(&self) -> Result<VariableUpsert, Diagnostic> {
        Ok(VariableUpsert {
            name: self.name.clone().unwrap_or_default(),
            value: helpers::parse_json_value(self.value.as_deref().unwrap_or("null"), "value")?,
            tags: self.tags.clone().unwrap_or_default(),
        })
    }
}

#[derive(Default)]
pub struct VariableResource {
    provider_data: Option<PrefectProviderData>,
}

impl VariableResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn variables(
        &self,
        model: &VariableResourceModel,
    ) -> Result<Box<dyn VariablesClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        client
            .variables(account_id, workspace_id)
            .map_err(|e| helpers::client_error("variable", e))
    }

    async fn create_variable(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: VariableResourceModel = helpers::decode_model(planned)?;
        let variables = self.variables(&model)?;
        let payload = model.payload()?;

        let variable = variables
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("variable", e))?;

        model.apply(variable);
        helpers::encode_model(&model)
    }

    async fn read_variable(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: VariableResourceModel = helpers::decode_model(state)?;
        let variables = self.variables(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Variable ID")?;

        let variable = match variables.get(ctx, id).await {
            Ok(variable) => variable,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("variable", e)),
        };

        model.apply(variable);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_variable(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: VariableResourceModel = helpers::decode_model(prior)?;
        let mut model: VariableResourceModel = helpers::decode_model(planned)?;
        let variables = self.variables(&model)?;
        let id = helpers::parse_required_uuid(prior.id.as_deref(), "id", "Variable ID")?;
        let payload = model.payload()?;

        variables
            .update(ctx, id, &payload)
            .await
            .map_err(|e| helpers::update_error("variable", e))?;

        let variable = variables
            .get(ctx, id)
            .await
            .map_err(|e| helpers::refresh_error("variable", e))?;

        model.apply(variable);
        helpers::encode_model(&model)
    }

    async fn delete_variable(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: VariableResourceModel = helpers::decode_model(prior)?;
        let variables = self.variables(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Variable ID")?;

        match variables.delete(ctx, id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("variable", e)),
        }
    }
}

#[async_trait]
impl Resource for VariableResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_variable", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect variable")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Variable UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the variable creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the variable was last updated in RFC 3339 format")
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
                    .description("Name of the variable")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .description("Value of the variable as a JSON document, e.g. jsonencode(\"foo\")")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "tags",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Tags associated with the variable")
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

        if let Ok(value) = request.config.get_string(&AttributePath::new("value")) {
            if let Err(diag) = helpers::parse_json_value(&value, "value") {
                diagnostics.push(diag);
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self.create_variable(&ctx, &request.planned_state).await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_variable(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_variable(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_variable(&ctx, &request.prior_state).await)
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
impl ResourceWithConfigure for VariableResource {
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
