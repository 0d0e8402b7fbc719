//! Workspace data source implementation

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

use crate::api::workspaces::Workspace;
use crate::helpers::{self, DATA_SOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub description: Option<String>,
}

impl WorkspaceDataSourceModel {
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
pub struct WorkspaceDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_workspace(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: WorkspaceDataSourceModel = helpers::decode_model(config)?;

        if model.id.is_some() && model.name.is_some() {
            return Err(helpers::lookup_conflict("workspace", "name"));
        }

        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;

        let workspaces = client
            .workspaces(account_id)
            .map_err(|e| helpers::client_error("workspace", e))?;

        let workspace_id =
            helpers::parse_required_uuid(model.id.as_deref(), "id", "Workspace ID")?;

        tracing::debug!(%workspace_id, "Reading workspace");
        let workspace = workspaces
            .get(ctx, workspace_id)
            .await
            .map_err(|e| helpers::refresh_error("workspace", e))?;

        model.apply(workspace);
        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for WorkspaceDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_workspace", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect workspace")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace UUID")
                    .required()
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
                    .description(
                        "Date and time that the workspace was last updated in RFC 3339 format",
                    )
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
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle for the workspace")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description for the workspace")
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
        let result = self.read_workspace(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkspaceDataSource {
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
