//! Variable data source implementation

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
pub struct VariableDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub workspace_id: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Default)]
pub struct VariableDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl VariableDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_variable(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: VariableDataSourceModel = helpers::decode_model(config)?;

        match (&model.id, &model.name) {
            (Some(_), Some(_)) => return Err(helpers::lookup_conflict("variable", "name")),
            (None, None) => return Err(helpers::lookup_missing("variable", "name")),
            _ => {}
        }

        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let workspace_id = helpers::parse_optional_uuid(
            model.workspace_id.as_deref(),
            "workspace_id",
            "Workspace ID",
        )?;
        let variables = client
            .variables(account_id, workspace_id)
            .map_err(|e| helpers::client_error("variable", e))?;

        let variable = match model.name.as_deref() {
            Some(name) => variables.get_by_name(ctx, name).await,
            None => {
                let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Variable ID")?;
                variables.get(ctx, id).await
            }
        }
        .map_err(|e| helpers::refresh_error("variable", e))?;

        model.id = Some(variable.id.to_string());
        model.created = helpers::rfc3339(variable.created);
        model.updated = helpers::rfc3339(variable.updated);
        model.name = Some(variable.name);
        model.value = Some(variable.value.to_string());
        model.tags = Some(variable.tags);

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for VariableDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_variable", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect variable, looked up by ID or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Variable UUID")
                    .optional()
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
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .description("Value of the variable, as a JSON document")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "tags",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Tags associated with the variable")
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
        let result = self.read_variable(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for VariableDataSource {
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
