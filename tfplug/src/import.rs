//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostics, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// Useful for resources where the import identifier maps directly to a single
/// attribute, e.g. "0b6f..." -> state.id = "0b6f...". Terraform then calls
/// read to fill in the rest.
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
) -> ImportResourceStateResponse {
    let mut diagnostics = Diagnostics::new();
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        diagnostics.add_attribute_error(
            attr_path.clone(),
            format!("Failed to set import ID: {}", e),
            format!("Could not set attribute '{}' to value '{}'", attr_path, request.id),
        );
        return ImportResourceStateResponse {
            imported_resources: Vec::new(),
            diagnostics,
        };
    }

    ImportResourceStateResponse {
        imported_resources: vec![ImportedResource {
            type_name: request.type_name.clone(),
            state,
        }],
        diagnostics,
    }
}
