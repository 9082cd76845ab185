use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who an invitation is addressed to, e.g. `{"type": "email", "value": "a@b.com"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct InvitationTarget {
    #[serde(rename = "type")]
    pub target_type: String,
    pub value: String,
}

/// An invitation as returned by the Vortex API.
///
/// Only `id` is typed. Every other member stays in `fields` exactly as the
/// API sent it, nulls and empty lists included, so handlers can pass the
/// resource through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Invitation {
    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    /// Targets that parse as `{type, value}`; others are skipped
    pub fn targets(&self) -> Vec<InvitationTarget> {
        self.fields
            .get("target")
            .and_then(Value::as_array)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|target| InvitationTarget::deserialize(target).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A missing or null `deactivated` counts as active
    pub fn is_active(&self) -> bool {
        !self
            .fields
            .get("deactivated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// Response from the list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationsResponse {
    #[serde(default)]
    pub invitations: Vec<Invitation>,
}
