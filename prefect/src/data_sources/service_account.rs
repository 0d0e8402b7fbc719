//! Service account data source implementation

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
pub struct ServiceAccountDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub actor_id: Option<String>,
    pub account_role_name: Option<String>,
    pub api_key_id: Option<String>,
    pub api_key_name: Option<String>,
    pub api_key_created: Option<String>,
    pub api_key_expiration: Option<String>,
}

#[derive(Default)]
pub struct ServiceAccountDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl ServiceAccountDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_service_account(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: ServiceAccountDataSourceModel = helpers::decode_model(config)?;

        match (&model.id, &model.name) {
            (Some(_), Some(_)) => {
                return Err(helpers::lookup_conflict("service account", "name"))
            }
            (None, None) => return Err(helpers::lookup_missing("service account", "name")),
            _ => {}
        }

        let client = helpers::client(&self.provider_data)?;
        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let bots = client
            .service_accounts(account_id)
            .map_err(|e| helpers::client_error("service account", e))?;

        let bot = match model.name.clone() {
            Some(name) => bots
                .list(ctx, std::slice::from_ref(&name))
                .await
                .map_err(|e| helpers::refresh_error("service account", e))?
                .into_iter()
                .find(|bot| bot.name == name)
                .ok_or_else(|| helpers::not_found("service account", "name", &name))?,
            None => {
                let id =
                    helpers::parse_required_uuid(model.id.as_deref(), "id", "Service Account ID")?;
                bots.get(ctx, id)
                    .await
                    .map_err(|e| helpers::refresh_error("service account", e))?
            }
        };

        model.id = Some(bot.id.to_string());
        model.created = helpers::rfc3339(bot.created);
        model.updated = helpers::rfc3339(bot.updated);
        model.name = Some(bot.name);
        model.actor_id = helpers::uuid_string(bot.actor_id);
        model.account_role_name = bot.account_role_name;

        let api_key = bot.api_key;
        model.api_key_id = api_key.as_ref().map(|key| key.id.to_string());
        model.api_key_name = api_key.as_ref().map(|key| key.name.clone());
        model.api_key_created = helpers::rfc3339(api_key.as_ref().and_then(|key| key.created));
        model.api_key_expiration = helpers::rfc3339(api_key.and_then(|key| key.expiration));

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for ServiceAccountDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_service_account", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect Cloud service account, looked up by ID or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Service account UUID")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the service account creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the service account was last updated in RFC 3339 format")
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
                    .description("Name of the service account")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("actor_id", AttributeType::String)
                    .description("Actor UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_role_name", AttributeType::String)
                    .description("Account role name of the service account")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key_id", AttributeType::String)
                    .description("API key UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key_name", AttributeType::String)
                    .description("API key name")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key_created", AttributeType::String)
                    .description("Date and time that the API key was created in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key_expiration", AttributeType::String)
                    .description("Date and time that the API key expires in RFC 3339 format")
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
        let result = self.read_service_account(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for ServiceAccountDataSource {
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
