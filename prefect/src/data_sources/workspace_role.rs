//! Workspace role data source implementation

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
pub struct WorkspaceRoleDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub inherited_role_id: Option<String>,
}

#[derive(Default)]
pub struct WorkspaceRoleDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceRoleDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_workspace_role(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkspaceRoleDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let roles = client
            .workspace_roles(account_id)
            .map_err(|e| helpers::client_error("workspace role", e))?;

        let name = model.name.clone().unwrap_or_default();
        let role = roles
            .list(ctx, std::slice::from_ref(&name))
            .await
            .map_err(|e| helpers::refresh_error("workspace role", e))?
            .into_iter()
            .find(|role| role.name == name)
            .ok_or_else(|| helpers::not_found("workspace role", "name", &name))?;

        model.id = Some(role.id.to_string());
        model.created = helpers::rfc3339(role.created);
        model.updated = helpers::rfc3339(role.updated);
        model.name = Some(role.name);
        model.description = role.description;
        model.scopes = Some(role.scopes);
        model.inherited_role_id = helpers::uuid_string(role.inherited_role_id);

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for WorkspaceRoleDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_workspace_role", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect Cloud workspace role")
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
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "scopes",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("List of scopes linked to the workspace role")
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("inherited_role_id", AttributeType::String)
                    .description("Workspace role UUID whose scopes this role inherits")
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
        let result = self.read_workspace_role(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkspaceRoleDataSource {
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
