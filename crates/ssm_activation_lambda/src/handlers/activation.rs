use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::adapters::registration::RegistrationService;
use crate::runtime::config::ActivatorConfig;
use crate::runtime::contract::{
    new_activation, ActivationResponse, CreatedActivation, LOOKUP_MAX_RESULTS,
};
use crate::runtime::error::{ActivationError, RegistrationError, UpstreamErrorKind};

pub const WORKSPACE_NAME_PARAMETER: &str = "name";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Which branch the reconciler took before creating the new activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Replaced { previous_activation_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: ReconcileOutcome,
    pub activation: CreatedActivation,
}

pub fn handle_activation_event(
    event: Value,
    config: &ActivatorConfig,
    registry: &dyn RegistrationService,
    now: DateTime<Utc>,
) -> ApiGatewayResponse {
    let result = extract_workspace_name(&event)
        .and_then(|workspace| reconcile_activation(&workspace, config, registry, now));

    match result {
        Ok(reconciled) => {
            let status_code = reconciled.activation.status_code;
            info!(
                outcome = ?reconciled.outcome,
                activation_id = %reconciled.activation.activation_id,
                status_code,
                "activation request completed"
            );
            serialized_response(status_code, &ActivationResponse::from(reconciled.activation))
        }
        Err(activation_error) => {
            if activation_error.is_client_error() {
                warn!(error = %activation_error, "rejected activation request");
            } else {
                error!(
                    error = %activation_error,
                    status_code = activation_error.status_code(),
                    upstream_status = activation_error.upstream_status(),
                    "activation request failed"
                );
            }
            error_response(&activation_error)
        }
    }
}

/// Ensures `workspace` ends up with exactly one fresh activation: any
/// activation already registered under that default instance name is deleted
/// before the new one is created. A failed delete aborts the chain.
pub fn reconcile_activation(
    workspace: &str,
    config: &ActivatorConfig,
    registry: &dyn RegistrationService,
    now: DateTime<Utc>,
) -> Result<Reconciled, ActivationError> {
    let iam_role = config.iam_role()?;

    let lookup = registry
        .describe_activations(workspace, LOOKUP_MAX_RESULTS)
        .map_err(ActivationError::UpstreamLookupFailure)?;
    if lookup.status_code != 200 {
        return Err(ActivationError::UpstreamLookupFailure(
            RegistrationError::unexpected_status("DescribeActivations", lookup.status_code),
        ));
    }

    let outcome = match lookup.first() {
        Some(existing) => {
            let activation_id = existing.activation_id.clone().ok_or_else(|| {
                ActivationError::UpstreamLookupFailure(RegistrationError::new(
                    UpstreamErrorKind::Service,
                    "DescribeActivations returned an activation without an id",
                ))
            })?;
            info!(
                workspace,
                activation_id = %activation_id,
                expired = existing.expired,
                expires_at = ?existing.expiration_date.map(|value| value.to_rfc3339()),
                "activation exists, removing before creating a new one"
            );
            registry
                .delete_activation(&activation_id)
                .map_err(|source| ActivationError::UpstreamDeleteFailure {
                    activation_id: activation_id.clone(),
                    source,
                })?;
            ReconcileOutcome::Replaced {
                previous_activation_id: activation_id,
            }
        }
        None => {
            info!(workspace, "no existing activation, creating a new one");
            ReconcileOutcome::Created
        }
    };

    let request = new_activation(workspace, iam_role, now);
    let activation = registry
        .create_activation(&request)
        .map_err(ActivationError::UpstreamCreateFailure)?;
    if !(200..300).contains(&activation.status_code) {
        return Err(ActivationError::UpstreamCreateFailure(
            RegistrationError::unexpected_status("CreateActivation", activation.status_code),
        ));
    }

    info!(
        workspace,
        activation_id = %activation.activation_id,
        expires_at = %request.expiration_date.to_rfc3339(),
        "created activation"
    );
    Ok(Reconciled {
        outcome,
        activation,
    })
}

/// Reads the workspace name from an API Gateway proxy event
/// (`queryStringParameters.name`), falling back to a top-level `name` field
/// for direct invocations.
pub fn extract_workspace_name(event: &Value) -> Result<String, ActivationError> {
    let Some(object) = event.as_object() else {
        return Err(ActivationError::MalformedRequest(
            "Request payload must be a JSON object".to_string(),
        ));
    };

    let from_query = match object.get("queryStringParameters") {
        None | Some(Value::Null) => None,
        Some(Value::Object(parameters)) => parameters.get(WORKSPACE_NAME_PARAMETER),
        Some(_) => {
            return Err(ActivationError::MalformedRequest(
                "queryStringParameters must be an object".to_string(),
            ));
        }
    };

    let candidate = from_query.or_else(|| object.get(WORKSPACE_NAME_PARAMETER));
    match candidate {
        Some(Value::String(name)) if !name.is_empty() => Ok(name.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(
            ActivationError::MissingParameter(WORKSPACE_NAME_PARAMETER),
        ),
        Some(_) => Err(ActivationError::MalformedRequest(format!(
            "`{WORKSPACE_NAME_PARAMETER}` must be a string"
        ))),
    }
}

fn serialized_response(status_code: u16, payload: &impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => json_response(status_code, body),
        Err(error) => json_response(
            500,
            json!({
                "error": "serialization_error",
                "message": error.to_string(),
            })
            .to_string(),
        ),
    }
}

fn error_response(error: &ActivationError) -> ApiGatewayResponse {
    serialized_response(error.status_code(), &error.to_body())
}

fn json_response(status_code: u16, body: String) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body,
    }
}
