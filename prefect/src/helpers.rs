//! Shared plumbing for data sources and resources: provider data injection,
//! model conversion, identifier parsing and diagnostic wording.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tfplug::data_source::ReadDataSourceResponse;
use tfplug::resource::{
    CreateResourceResponse, DeleteResourceResponse, ReadResourceResponse, UpdateResourceResponse,
};
use tfplug::types::{AttributePath, Diagnostic, Diagnostics, DynamicValue};
use uuid::Uuid;

use crate::api::{ApiError, PrefectClient};
use crate::provider_data::PrefectProviderData;

pub(crate) const DATA_SOURCE: &str = "Data Source";
pub(crate) const RESOURCE: &str = "Resource";

/// Store the provider data handed to an adapter. Nothing is stored when the
/// provider has not been configured yet; a foreign type is reported.
pub(crate) fn configure_provider_data(
    slot: &mut Option<PrefectProviderData>,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    kind: &str,
) -> Diagnostics {
    let Some(data) = provider_data else {
        return Diagnostics::new();
    };

    match data.downcast_ref::<PrefectProviderData>() {
        Some(provider_data) => {
            *slot = Some(provider_data.clone());
            Diagnostics::new()
        }
        None => Diagnostic::error(
            format!("Unexpected {} Configure Type", kind),
            "Expected prefect::PrefectProviderData, got a different provider data type. \
             Please report this issue to the provider developers.",
        )
        .into(),
    }
}

pub(crate) fn client(
    provider_data: &Option<PrefectProviderData>,
) -> Result<&Arc<dyn PrefectClient>, Diagnostic> {
    provider_data.as_ref().map(|data| &data.client).ok_or_else(|| {
        Diagnostic::error(
            "Provider not configured",
            "The Prefect client is not available. Configure the provider before reading or \
             changing Prefect objects.",
        )
    })
}

pub(crate) fn decode_model<T: DeserializeOwned>(value: &DynamicValue) -> Result<T, Diagnostic> {
    value
        .to_model()
        .map_err(|e| Diagnostic::error("Error reading configuration", e.to_string()))
}

pub(crate) fn encode_model<T: Serialize>(model: &T) -> Result<DynamicValue, Diagnostic> {
    DynamicValue::from_model(model)
        .map_err(|e| Diagnostic::error("Error writing state", e.to_string()))
}

/// Parse an optional UUID attribute; absent or empty means "use the default" (nil)
pub(crate) fn parse_optional_uuid(
    value: Option<&str>,
    attribute: &str,
    label: &str,
) -> Result<Uuid, Diagnostic> {
    match value {
        None | Some("") => Ok(Uuid::nil()),
        Some(raw) => parse_uuid(raw, attribute, label),
    }
}

pub(crate) fn parse_required_uuid(
    value: Option<&str>,
    attribute: &str,
    label: &str,
) -> Result<Uuid, Diagnostic> {
    match value {
        Some(raw) => parse_uuid(raw, attribute, label),
        None => Err(Diagnostic::attribute_error(
            AttributePath::new(attribute),
            format!("Missing {}", label),
            format!("The {} attribute must be set.", attribute),
        )),
    }
}

/// Parse a UUID attribute whose absence is meaningful to the API
pub(crate) fn parse_nullable_uuid(
    value: Option<&str>,
    attribute: &str,
    label: &str,
) -> Result<Option<Uuid>, Diagnostic> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => parse_uuid(raw, attribute, label).map(Some),
    }
}

fn parse_uuid(raw: &str, attribute: &str, label: &str) -> Result<Uuid, Diagnostic> {
    Uuid::parse_str(raw).map_err(|e| {
        Diagnostic::attribute_error(
            AttributePath::new(attribute),
            format!("Error parsing {}", label),
            format!(
                "Could not parse {} to UUID, unexpected error: {}",
                lowercase_first(label),
                e
            ),
        )
    })
}

fn lowercase_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn uuid_string(value: Option<Uuid>) -> Option<String> {
    value.map(|id| id.to_string())
}

/// RFC 3339 with second precision and a `Z` suffix, e.g. `2023-01-01T00:00:00Z`
pub(crate) fn rfc3339(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub(crate) fn parse_rfc3339(
    value: Option<&str>,
    attribute: &str,
) -> Result<Option<DateTime<Utc>>, Diagnostic> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                Diagnostic::attribute_error(
                    AttributePath::new(attribute),
                    "Error parsing timestamp",
                    format!("Could not parse {} as RFC 3339: {}", attribute, e),
                )
            }),
    }
}

pub(crate) fn client_error(what: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error creating {} client", what),
        format!(
            "Could not create {} client, unexpected error: {}. This is a bug in the provider, \
             please report this to the maintainers.",
            what, err
        ),
    )
}

pub(crate) fn refresh_error(entity: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error refreshing {} state", entity),
        format!("Could not read {}, unexpected error: {}", entity, err),
    )
}

pub(crate) fn create_error(entity: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error creating {}", entity),
        format!("Could not create {}, unexpected error: {}", entity, err),
    )
}

pub(crate) fn update_error(entity: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error updating {}", entity),
        format!("Could not update {}, unexpected error: {}", entity, err),
    )
}

pub(crate) fn delete_error(entity: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error deleting {}", entity),
        format!("Could not delete {}, unexpected error: {}", entity, err),
    )
}

pub(crate) fn not_found(entity: &str, key: &str, value: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Could not find {}", entity),
        format!("No {} with {} {:?} was found", entity, key, value),
    )
}

/// Both the ID and an alternate key were supplied
pub(crate) fn lookup_conflict(entity: &str, key: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Conflicting {} lookup keys", entity),
        format!(
            "{}s can be identified by their unique {} or ID, but not both.",
            capitalize(entity),
            key
        ),
    )
}

/// Neither the ID nor the alternate key was supplied
pub(crate) fn lookup_missing(entity: &str, key: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Missing {} lookup key", entity),
        format!(
            "{}s can be identified by their unique {} or ID; one of them must be set.",
            capitalize(entity),
            key
        ),
    )
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a JSON attribute that must hold an object
pub(crate) fn parse_json_object(raw: &str, attribute: &str) -> Result<Value, Diagnostic> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(Diagnostic::attribute_error(
            AttributePath::new(attribute),
            "Invalid JSON object",
            format!("{} must be a JSON object", attribute),
        )),
        Err(e) => Err(Diagnostic::attribute_error(
            AttributePath::new(attribute),
            "Invalid JSON",
            format!("{} is not valid JSON: {}", attribute, e),
        )),
    }
}

pub(crate) fn parse_json_value(raw: &str, attribute: &str) -> Result<Value, Diagnostic> {
    serde_json::from_str(raw).map_err(|e| {
        Diagnostic::attribute_error(
            AttributePath::new(attribute),
            "Invalid JSON",
            format!("{} is not valid JSON: {}", attribute, e),
        )
    })
}

/// Serialize a JSON value read from the API, keeping the previous string when
/// it encodes the same value so formatting differences never show as drift
pub(crate) fn normalized_json(prior: Option<&str>, remote: &Value) -> String {
    if let Some(prior) = prior {
        if serde_json::from_str::<Value>(prior).is_ok_and(|value| &value == remote) {
            return prior.to_string();
        }
    }
    remote.to_string()
}

pub(crate) fn read_data_source_response(
    result: Result<DynamicValue, Diagnostic>,
    config: DynamicValue,
) -> ReadDataSourceResponse {
    match result {
        Ok(state) => ReadDataSourceResponse {
            state,
            diagnostics: Diagnostics::new(),
        },
        Err(diagnostic) => ReadDataSourceResponse {
            state: config,
            diagnostics: diagnostic.into(),
        },
    }
}

/// `Ok(None)` drops the resource from state
pub(crate) fn read_resource_response(
    result: Result<Option<DynamicValue>, Diagnostic>,
    current_state: DynamicValue,
) -> ReadResourceResponse {
    match result {
        Ok(new_state) => ReadResourceResponse {
            new_state,
            diagnostics: Diagnostics::new(),
        },
        Err(diagnostic) => ReadResourceResponse {
            new_state: Some(current_state),
            diagnostics: diagnostic.into(),
        },
    }
}

pub(crate) fn create_response(
    result: Result<DynamicValue, Diagnostic>,
    planned_state: DynamicValue,
) -> CreateResourceResponse {
    match result {
        Ok(new_state) => CreateResourceResponse {
            new_state,
            diagnostics: Diagnostics::new(),
        },
        Err(diagnostic) => CreateResourceResponse {
            new_state: planned_state,
            diagnostics: diagnostic.into(),
        },
    }
}

pub(crate) fn update_response(
    result: Result<DynamicValue, Diagnostic>,
    prior_state: DynamicValue,
) -> UpdateResourceResponse {
    match result {
        Ok(new_state) => UpdateResourceResponse {
            new_state,
            diagnostics: Diagnostics::new(),
        },
        Err(diagnostic) => UpdateResourceResponse {
            new_state: prior_state,
            diagnostics: diagnostic.into(),
        },
    }
}

pub(crate) fn delete_response(result: Result<(), Diagnostic>) -> DeleteResourceResponse {
    DeleteResourceResponse {
        diagnostics: match result {
            Ok(()) => Diagnostics::new(),
            Err(diagnostic) => diagnostic.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_optional_uuid_is_nil() {
        assert_eq!(parse_optional_uuid(None, "account_id", "Account ID").unwrap(), Uuid::nil());
        assert_eq!(
            parse_optional_uuid(Some(""), "account_id", "Account ID").unwrap(),
            Uuid::nil()
        );
    }

    #[test]
    fn malformed_uuid_names_the_attribute() {
        let diag = parse_optional_uuid(Some("not-a-uuid"), "account_id", "Account ID").unwrap_err();
        assert_eq!(diag.summary, "Error parsing Account ID");
        assert!(diag
            .detail
            .starts_with("Could not parse account ID to UUID, unexpected error:"));
        assert_eq!(diag.attribute, Some(AttributePath::new("account_id")));
    }

    #[test]
    fn empty_required_uuid_is_a_parse_error() {
        let diag = parse_required_uuid(Some(""), "id", "Workspace ID").unwrap_err();
        assert_eq!(diag.summary, "Error parsing Workspace ID");
        assert_eq!(diag.attribute, Some(AttributePath::new("id")));
    }

    #[test]
    fn timestamps_use_second_precision_and_z() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(rfc3339(Some(ts)).as_deref(), Some("2023-01-01T00:00:00Z"));
        assert_eq!(rfc3339(None), None);
    }

    #[test]
    fn rfc3339_round_trips_through_parse() {
        let parsed = parse_rfc3339(Some("2024-06-30T12:00:00+02:00"), "expiration").unwrap();
        assert_eq!(rfc3339(parsed).as_deref(), Some("2024-06-30T10:00:00Z"));
        assert!(parse_rfc3339(Some("yesterday"), "expiration").is_err());
    }

    #[test]
    fn lookup_diagnostics_read_naturally() {
        let diag = lookup_conflict("workspace", "name");
        assert_eq!(diag.summary, "Conflicting workspace lookup keys");
        assert_eq!(
            diag.detail,
            "Workspaces can be identified by their unique name or ID, but not both."
        );

        let diag = lookup_missing("service account", "name");
        assert_eq!(diag.summary, "Missing service account lookup key");
    }

    #[test]
    fn json_objects_are_validated() {
        assert!(parse_json_object(r#"{"job_configuration": {}}"#, "base_job_template").is_ok());

        let diag = parse_json_object("[1, 2]", "base_job_template").unwrap_err();
        assert_eq!(diag.summary, "Invalid JSON object");

        let diag = parse_json_object("{", "base_job_template").unwrap_err();
        assert_eq!(diag.summary, "Invalid JSON");
        assert_eq!(diag.attribute, Some(AttributePath::new("base_job_template")));
    }

    #[test]
    fn normalized_json_keeps_equivalent_prior() {
        let remote = serde_json::json!({"a": 1, "b": [true]});
        let prior = "{ \"b\": [true],\n  \"a\": 1 }";

        assert_eq!(normalized_json(Some(prior), &remote), prior);
        assert_eq!(normalized_json(Some(r#"{"a": 2}"#), &remote), r#"{"a":1,"b":[true]}"#);
        assert_eq!(normalized_json(None, &remote), r#"{"a":1,"b":[true]}"#);
    }

    #[test]
    fn unconfigured_adapter_reports_provider_not_configured() {
        let diag = client(&None).err().unwrap();
        assert_eq!(diag.summary, "Provider not configured");
    }

    #[test]
    fn foreign_provider_data_is_rejected() {
        let mut slot = None;
        let foreign: Arc<dyn Any + Send + Sync> = Arc::new(42u8);
        let diags = configure_provider_data(&mut slot, Some(foreign), DATA_SOURCE);

        assert!(slot.is_none());
        assert_eq!(diags[0].summary, "Unexpected Data Source Configure Type");
        assert!(diags[0].detail.contains("report this issue"));

        let diags = configure_provider_data(&mut slot, None, RESOURCE);
        assert!(diags.is_empty());
    }
}
