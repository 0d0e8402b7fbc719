//! Team data source implementation

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
pub struct TeamDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct TeamDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl TeamDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_team(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: TeamDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let teams = client
            .teams(account_id)
            .map_err(|e| helpers::client_error("team", e))?;

        let name = model.name.clone().unwrap_or_default();
        tracing::debug!(%name, "Looking up team");

        let team = teams
            .list(ctx, std::slice::from_ref(&name))
            .await
            .map_err(|e| helpers::refresh_error("team", e))?
            .into_iter()
            .find(|team| team.name == name)
            .ok_or_else(|| helpers::not_found("team", "name", &name))?;

        model.id = Some(team.id.to_string());
        model.created = helpers::rfc3339(team.created);
        model.updated = helpers::rfc3339(team.updated);
        model.name = Some(team.name);
        model.description = team.description;

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for TeamDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_team", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect Cloud team")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Team UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the team creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the team was last updated in RFC 3339 format")
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
                    .description("Name of the team")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the team")
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
        let result = self.read_team(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for TeamDataSource {
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
