//! Service account resource implementation
//!
//! The API key secret is only returned when the service account is created,
//! so reads keep whatever key is already in state.

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
use uuid::Uuid;

use crate::api::service_accounts::{
    ServiceAccount, ServiceAccountCreate, ServiceAccountUpdate, ServiceAccountsClient,
};
use crate::helpers::{self, RESOURCE};
use crate::provider_data::PrefectProviderData;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServiceAccountResourceModel {
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
    pub api_key: Option<String>,
}

impl ServiceAccountResourceModel {
    fn apply(&mut self, bot: ServiceAccount) {
        self.id = Some(bot.id.to_string());
        self.created = helpers::rfc3339(bot.created);
        self.updated = helpers::rfc3339(bot.updated);
        self.name = Some(bot.name);
        self.actor_id = helpers::uuid_string(bot.actor_id);
        self.account_role_name = bot.account_role_name;

        if let Some(key) = bot.api_key {
            self.api_key_id = Some(key.id.to_string());
            self.api_key_name = Some(key.name);
            self.api_key_created = helpers::rfc3339(key.created);
            self.api_key_expiration = helpers::rfc3339(key.expiration);
            if let Some(secret) = key.key {
                self.api_key = Some(secret);
            }
        }
    }
}

#[derive(Default)]
pub struct ServiceAccountResource {
    provider_data: Option<PrefectProviderData>,
}

impl ServiceAccountResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn account_id(model: &ServiceAccountResourceModel) -> Result<Uuid, Diagnostic> {
        helpers::parse_optional_uuid(model.account_id.as_deref(), "account_id", "Account ID")
    }

    fn service_accounts(
        &self,
        model: &ServiceAccountResourceModel,
    ) -> Result<Box<dyn ServiceAccountsClient>, Diagnostic> {
        let client = helpers::client(&self.provider_data)?;
        client
            .service_accounts(Self::account_id(model)?)
            .map_err(|e| helpers::client_error("service account", e))
    }

    /// Resolve `account_role_name` to the role's ID; no name leaves the
    /// account's default role in place
    async fn account_role_id(
        &self,
        ctx: &Context,
        model: &ServiceAccountResourceModel,
    ) -> Result<Option<Uuid>, Diagnostic> {
        let Some(role_name) = model.account_role_name.clone() else {
            return Ok(None);
        };

        let client = helpers::client(&self.provider_data)?;
        let roles = client
            .account_roles(Self::account_id(model)?)
            .map_err(|e| helpers::client_error("account role", e))?;

        let role = roles
            .list(ctx, std::slice::from_ref(&role_name))
            .await
            .map_err(|e| helpers::refresh_error("account role", e))?
            .into_iter()
            .find(|role| role.name == role_name)
            .ok_or_else(|| {
                helpers::not_found("account role", "name", &role_name)
                    .with_attribute(AttributePath::new("account_role_name"))
            })?;

        Ok(Some(role.id))
    }

    async fn create_service_account(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let mut model: ServiceAccountResourceModel = helpers::decode_model(planned)?;
        let bots = self.service_accounts(&model)?;

        let payload = ServiceAccountCreate {
            name: model.name.clone().unwrap_or_default(),
            account_role_id: self.account_role_id(ctx, &model).await?,
            api_key_expiration: helpers::parse_rfc3339(
                model.api_key_expiration.as_deref(),
                "api_key_expiration",
            )?,
        };

        tracing::info!(name = %payload.name, "Creating service account");
        let bot = bots
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::create_error("service account", e))?;

        model.apply(bot);
        helpers::encode_model(&model)
    }

    async fn read_service_account(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let mut model: ServiceAccountResourceModel = helpers::decode_model(state)?;
        let bots = self.service_accounts(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Service Account ID")?;

        let bot = match bots.get(ctx, id).await {
            Ok(bot) => bot,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(helpers::refresh_error("service account", e)),
        };

        model.apply(bot);
        helpers::encode_model(&model).map(Some)
    }

    async fn update_service_account(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior: ServiceAccountResourceModel = helpers::decode_model(prior)?;
        let mut model: ServiceAccountResourceModel = helpers::decode_model(planned)?;
        let bots = self.service_accounts(&model)?;
        let id = helpers::parse_required_uuid(prior.id.as_deref(), "id", "Service Account ID")?;

        let payload = ServiceAccountUpdate {
            name: model.name.clone().unwrap_or_default(),
            account_role_id: self.account_role_id(ctx, &model).await?,
        };
        bots.update(ctx, id, &payload)
            .await
            .map_err(|e| helpers::update_error("service account", e))?;

        let bot = bots
            .get(ctx, id)
            .await
            .map_err(|e| helpers::refresh_error("service account", e))?;

        model.api_key = prior.api_key;
        model.apply(bot);
        helpers::encode_model(&model)
    }

    async fn delete_service_account(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
    ) -> Result<(), Diagnostic> {
        let model: ServiceAccountResourceModel = helpers::decode_model(prior)?;
        let bots = self.service_accounts(&model)?;
        let id = helpers::parse_required_uuid(model.id.as_deref(), "id", "Service Account ID")?;

        match bots.delete(ctx, id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(helpers::delete_error("service account", e)),
        }
    }
}

#[async_trait]
impl Resource for ServiceAccountResource {
    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_service_account", request.provider_type_name),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect Cloud service account and its API key")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Service account UUID")
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
                    .required()
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
                    .description("Account role name of the service account, e.g. Member or Admin")
                    .optional()
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
                    .description("Date and time that the API key expires in RFC 3339 format; never expires when unset")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("API key secret, only available after creation")
                    .computed()
                    .sensitive()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let result = self
            .create_service_account(&ctx, &request.planned_state)
            .await;
        helpers::create_response(result, request.planned_state)
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result = self
            .read_service_account(&ctx, &request.current_state)
            .await;
        helpers::read_resource_response(result, request.current_state)
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let result = self
            .update_service_account(&ctx, &request.prior_state, &request.planned_state)
            .await;
        helpers::update_response(result, request.prior_state)
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        helpers::delete_response(
            self.delete_service_account(&ctx, &request.prior_state)
                .await,
        )
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
impl ResourceWithConfigure for ServiceAccountResource {
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
