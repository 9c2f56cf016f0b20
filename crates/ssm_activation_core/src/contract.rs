use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expiry::activation_expiry;

pub const ACTIVATION_DESCRIPTION_PREFIX: &str = "WorkspaceActivation-";
pub const ACTIVATION_REGISTRATION_LIMIT: i32 = 1;
pub const LOOKUP_MAX_RESULTS: i32 = 1;

/// Body returned to the caller once a fresh activation exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationResponse {
    #[serde(rename = "ActivationCode")]
    pub activation_code: String,
    #[serde(rename = "ActivationId")]
    pub activation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// An activation as reported by the lookup call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationSummary {
    pub activation_id: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationLookup {
    pub status_code: u16,
    pub activations: Vec<ActivationSummary>,
}

impl ActivationLookup {
    pub fn first(&self) -> Option<&ActivationSummary> {
        self.activations.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivation {
    pub description: String,
    pub default_instance_name: String,
    pub iam_role: String,
    pub registration_limit: i32,
    pub expiration_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedActivation {
    pub status_code: u16,
    pub activation_id: String,
    pub activation_code: String,
}

impl From<CreatedActivation> for ActivationResponse {
    fn from(created: CreatedActivation) -> Self {
        Self {
            activation_code: created.activation_code,
            activation_id: created.activation_id,
        }
    }
}

pub fn activation_description(workspace_name: &str) -> String {
    format!("{ACTIVATION_DESCRIPTION_PREFIX}{workspace_name}")
}

/// Builds the single-use activation request for `workspace_name`, expiring
/// one activation lifetime after `now`.
pub fn new_activation(workspace_name: &str, iam_role: &str, now: DateTime<Utc>) -> NewActivation {
    NewActivation {
        description: activation_description(workspace_name),
        default_instance_name: workspace_name.to_string(),
        iam_role: iam_role.to_string(),
        registration_limit: ACTIVATION_REGISTRATION_LIMIT,
        expiration_date: activation_expiry(now),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn new_activation_is_single_use_and_named_after_workspace() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");

        let request = new_activation("ws-42", "ssm-workspaces-instance", now);

        assert_eq!(request.description, "WorkspaceActivation-ws-42");
        assert_eq!(request.default_instance_name, "ws-42");
        assert_eq!(request.iam_role, "ssm-workspaces-instance");
        assert_eq!(request.registration_limit, 1);
        assert_eq!(
            request.expiration_date,
            Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0)
                .single()
                .expect("valid timestamp")
        );
    }

    #[test]
    fn workspace_name_is_forwarded_verbatim() {
        let now = Utc::now();
        let request = new_activation("  Team Space/ü ", "role", now);

        assert_eq!(request.default_instance_name, "  Team Space/ü ");
        assert_eq!(request.description, "WorkspaceActivation-  Team Space/ü ");
    }

    #[test]
    fn activation_response_uses_pascal_case_field_names() {
        let body = serde_json::to_value(ActivationResponse {
            activation_code: "code-1".to_string(),
            activation_id: "act-1".to_string(),
        })
        .expect("response should serialize");

        assert_eq!(
            body,
            serde_json::json!({"ActivationCode": "code-1", "ActivationId": "act-1"})
        );
    }
}
