//! Common types and utilities for the Prefect API

use serde::Deserialize;
use serde_json::{json, Value};

/// Error body returned by Prefect; `detail` is a string for most errors and a
/// list of validation problems for 422 responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: Option<Value>,
}

impl ApiErrorResponse {
    /// Best human-readable message from an error body, falling back to the raw text
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(ApiErrorResponse {
                detail: Some(Value::String(detail)),
            }) => detail,
            Ok(ApiErrorResponse {
                detail: Some(detail),
            }) => detail.to_string(),
            _ if body.trim().is_empty() => "no response body".to_string(),
            _ => body.to_string(),
        }
    }
}

/// Body for the `/filter` endpoints, e.g. `{"teams": {"name": {"any_": ["a"]}}}`.
/// An empty value list means no filtering.
pub fn any_filter(entity: &str, field: &str, values: &[String]) -> Value {
    if values.is_empty() {
        return json!({});
    }
    json!({ (entity): { (field): { "any_": values } } })
}

/// Percent-encode a user-supplied path segment such as a work pool name
pub fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
