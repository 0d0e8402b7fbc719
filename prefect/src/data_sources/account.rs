//! Account data source implementation

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

use crate::api::accounts::Account;
use crate::helpers::{self, DATA_SOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccountDataSourceModel {
    pub id: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub billing_email: Option<String>,
    pub allow_public_workspaces: Option<bool>,
}

impl AccountDataSourceModel {
    pub(crate) fn apply(&mut self, account: Account) {
        self.id = Some(account.id.to_string());
        self.created = helpers::rfc3339(account.created);
        self.updated = helpers::rfc3339(account.updated);
        self.name = Some(account.name);
        self.handle = Some(account.handle);
        self.location = account.location;
        self.link = account.link;
        self.billing_email = account.billing_email;
        self.allow_public_workspaces = account.settings.allow_public_workspaces;
    }
}

#[derive(Default)]
pub struct AccountDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl AccountDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_account(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: AccountDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id = helpers::parse_optional_uuid(model.id.as_deref(), "id", "Account ID")?;
        let accounts = client
            .accounts(account_id)
            .map_err(|e| helpers::client_error("account", e))?;

        tracing::debug!(%account_id, "Reading account");
        let account = accounts
            .get(ctx)
            .await
            .map_err(|e| helpers::refresh_error("account", e))?;

        model.apply(account);
        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for AccountDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_account", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a Prefect Cloud account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Account UUID, defaults to the account set in the provider")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Date and time of the account creation in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Date and time that the account was last updated in RFC 3339 format")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the account")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle of the account")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .description("An optional physical location for the account, e.g. Washington, D.C.")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("link", AttributeType::String)
                    .description("An optional external URL associated with the account")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("billing_email", AttributeType::String)
                    .description("Billing email to apply to the account's Stripe customer")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_public_workspaces", AttributeType::Bool)
                    .description("Whether or not this account allows public workspaces")
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
        let result = self.read_account(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for AccountDataSource {
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
