//! Account member data source implementation

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
pub struct AccountMemberDataSourceModel {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub actor_id: Option<String>,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub account_role_id: Option<String>,
    pub account_role_name: Option<String>,
}

#[derive(Default)]
pub struct AccountMemberDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl AccountMemberDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_account_member(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: AccountMemberDataSourceModel = helpers::decode_model(config)?;
        let client = helpers::client(&self.provider_data)?;

        let account_id =
            helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")?;
        let memberships = client
            .account_memberships(account_id)
            .map_err(|e| helpers::client_error("account membership", e))?;

        let email = model.email.clone().unwrap_or_default();
        let member = memberships
            .list(ctx, std::slice::from_ref(&email))
            .await
            .map_err(|e| helpers::refresh_error("account member", e))?
            .into_iter()
            .find(|member| member.email.eq_ignore_ascii_case(&email))
            .ok_or_else(|| helpers::not_found("account member", "email", &email))?;

        model.id = Some(member.id.to_string());
        model.actor_id = Some(member.actor_id.to_string());
        model.user_id = Some(member.user_id.to_string());
        model.first_name = member.first_name;
        model.last_name = member.last_name;
        model.handle = Some(member.handle);
        model.email = Some(member.email);
        model.account_role_id = helpers::uuid_string(member.account_role_id);
        model.account_role_name = member.account_role_name;

        helpers::encode_model(&model)
    }
}

#[async_trait]
impl DataSource for AccountMemberDataSource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: format!("{}_account_member", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Data Source representing a member of a Prefect Cloud account, looked up by email")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Account membership UUID")
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
                AttributeBuilder::new("actor_id", AttributeType::String)
                    .description("Actor UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_id", AttributeType::String)
                    .description("User UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("first_name", AttributeType::String)
                    .description("Member's first name")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("last_name", AttributeType::String)
                    .description("Member's last name")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Member handle, a unique identifier for the user")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .description("Member email")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_role_id", AttributeType::String)
                    .description("Account role UUID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_role_name", AttributeType::String)
                    .description("Name of the account role assigned to the member")
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
        let result = self.read_account_member(&ctx, &request.config).await;
        helpers::read_data_source_response(result, request.config)
    }
}

#[async_trait]
impl DataSourceWithConfigure for AccountMemberDataSource {
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
