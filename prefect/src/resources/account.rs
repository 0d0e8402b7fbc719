//! Account resource implementation
//!
//! Accounts cannot be created through the API; they are brought under
//! management with `terraform import` and then updated in place.

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

use crate::api::accounts::{Account, AccountSettings, AccountUpdate, AccountsClient};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccountResourceModel {
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

impl AccountResourceModel {
    fn apply(&mut self, account: Account) {
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
pub struct AccountResource {
    provider_data: Option<PrefectProviderData>,
}

impl AccountResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self, model: &AccountResourceModel) -> Result<Box<dyn AccountsClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        let account_id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Account ID")?;
        client
            .accounts(account_id)
            .map_err(|e| helpers::client_error("account", e))
    }

    async fn read_account(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: AccountResourceModel = helpers::decode_model(state)?;
        let accounts = self.accounts(&model)?;

        let account = match accounts.get(ctx).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("account", e)),
        };

        model.apply(account);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_account(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: AccountResourceModel = helpers::decode_model(prior)?;
        let mut model: AccountResourceModel = helpers::decode_model(planned)?;
        let accounts = self.accounts(&prior)?;

        let payload = AccountUpdate {
            name: model.name.clone(),
            handle: model.handle.clone(),
            location: model.location.clone(),
            link: model.link.clone(),
            billing_email: model.billing_email.clone(),
        };
        accounts
            .update(ctx, &payload)
            .await
            .map_err(|e| helpers::update_error("account", e))?;

        if model.allow_public_workspaces.is_some()
            && model.allow_public_workspaces != prior.allow_public_workspaces
        {
            let settings = AccountSettings {
                allow_public_workspaces: model.allow_public_workspaces,
            };
            accounts
                .update_settings(ctx, &settings)
                .await
                .map_err(|e| helpers::update_error("account settings", e))?;
        }

        let account = accounts
            .get(ctx)
            .await
            .map_err(|e| helpers::refresh_error("account", e))?;

        model.apply(account);
        helpers::encode_model(&model)
    }

    async fn delete_account(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let model: AccountResourceModel = helpers::decode_model(prior)?;
        let accounts = self.accounts(&model)?;

        match accounts.delete(ctx).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("account", e)),
        }
    }
}

#[async_trait]
impl Resource for AccountResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_account", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Resource representing a Prefect Cloud account. Accounts cannot be created; \
                 import an existing account to manage it.",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Account UUID")
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
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle of the account")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .description("An optional physical location for the account")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("link", AttributeType::String)
                    .description("An optional external URL associated with the account")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("billing_email", AttributeType::String)
                    .description("Billing email to apply to the account's Stripe customer")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_public_workspaces", AttributeType::Bool)
                    .description("Whether or not this account allows public workspaces")
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

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = Err(Diagnostic::error(
            "Cannot create account",
            "Prefect Cloud accounts cannot be created through the API. Use `terraform import` \
             with the account ID to bring an existing account under management.",
        ));
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self.read_account(&ctx, &request.current_state).await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_account(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(self.delete_account(&ctx, &request.prior_state).await)
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
impl ResourceWithConfigure for AccountResource {
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
