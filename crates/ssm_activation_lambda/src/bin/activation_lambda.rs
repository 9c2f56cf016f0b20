use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::config::http::HttpResponse;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::operation::create_activation::CreateActivationOutput;
use aws_sdk_ssm::primitives::DateTime as SmithyDateTime;
use aws_sdk_ssm::types::{Activation, DescribeActivationsFilter, DescribeActivationsFilterKeys};
use chrono::{DateTime, Utc};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use ssm_activation_lambda::adapters::registration::RegistrationService;
use ssm_activation_lambda::handlers::activation::{handle_activation_event, ApiGatewayResponse};
use ssm_activation_lambda::runtime::config::{ActivatorConfig, IAM_ROLE_ENV};
use ssm_activation_lambda::runtime::contract::{
    ActivationLookup, ActivationSummary, CreatedActivation, NewActivation,
};
use ssm_activation_lambda::runtime::error::{RegistrationError, UpstreamErrorKind};
use tracing::{info_span, warn};
use tracing_subscriber::EnvFilter;

struct SsmRegistrationService {
    ssm_client: aws_sdk_ssm::Client,
}

impl RegistrationService for SsmRegistrationService {
    fn describe_activations(
        &self,
        default_instance_name: &str,
        max_results: i32,
    ) -> Result<ActivationLookup, RegistrationError> {
        let client = self.ssm_client.clone();
        let filter = DescribeActivationsFilter::builder()
            .filter_key(DescribeActivationsFilterKeys::DefaultInstanceName)
            .filter_values(default_instance_name)
            .build();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .describe_activations()
                    .filters(filter)
                    .max_results(max_results)
                    .send()
                    .await
                    .map(|output| ActivationLookup {
                        status_code: 200,
                        activations: output
                            .activation_list()
                            .iter()
                            .map(activation_summary)
                            .collect(),
                    })
                    .map_err(|error| classify_sdk_error("DescribeActivations", &error))
            })
        })
    }

    fn delete_activation(&self, activation_id: &str) -> Result<(), RegistrationError> {
        let client = self.ssm_client.clone();
        let activation_id = activation_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_activation()
                    .activation_id(activation_id)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| classify_sdk_error("DeleteActivation", &error))
            })
        })
    }

    fn create_activation(
        &self,
        request: &NewActivation,
    ) -> Result<CreatedActivation, RegistrationError> {
        let client = self.ssm_client.clone();
        let request = request.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .create_activation()
                    .description(request.description)
                    .default_instance_name(request.default_instance_name)
                    .iam_role(request.iam_role)
                    .registration_limit(request.registration_limit)
                    .expiration_date(SmithyDateTime::from_secs(
                        request.expiration_date.timestamp(),
                    ))
                    .send()
                    .await
                    .map_err(|error| classify_sdk_error("CreateActivation", &error))
                    .and_then(|output| created_activation(&output))
            })
        })
    }
}

/// A successful create must carry both the id and the one-time code.
fn created_activation(
    output: &CreateActivationOutput,
) -> Result<CreatedActivation, RegistrationError> {
    match (output.activation_id(), output.activation_code()) {
        (Some(activation_id), Some(activation_code)) => Ok(CreatedActivation {
            status_code: 200,
            activation_id: activation_id.to_string(),
            activation_code: activation_code.to_string(),
        }),
        _ => Err(RegistrationError::new(
            UpstreamErrorKind::Service,
            "CreateActivation response is missing the activation id or code",
        )
        .with_status(200)),
    }
}

fn activation_summary(activation: &Activation) -> ActivationSummary {
    ActivationSummary {
        activation_id: activation.activation_id().map(str::to_string),
        expiration_date: activation.expiration_date().and_then(to_chrono),
        expired: activation.expired(),
    }
}

fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn classify_sdk_error<E>(operation: &str, error: &SdkError<E, HttpResponse>) -> RegistrationError
where
    E: std::error::Error + 'static,
{
    let kind = match error {
        SdkError::TimeoutError(_) => UpstreamErrorKind::Timeout,
        SdkError::ServiceError(_) => UpstreamErrorKind::Service,
        _ => UpstreamErrorKind::Transport,
    };
    let registration_error = RegistrationError::new(
        kind,
        format!("{operation} failed: {}", DisplayErrorContext(error)),
    );

    match error.raw_response() {
        Some(raw) => registration_error.with_status(raw.status().as_u16()),
        None => registration_error,
    }
}

struct RuntimeDependencies {
    config: ActivatorConfig,
    registry: SsmRegistrationService,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    let span = info_span!("activation_request", request_id = %event.context.request_id);
    let now = Utc::now();
    Ok(span.in_scope(|| {
        handle_activation_event(event.payload, &deps.config, &deps.registry, now)
    }))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = ActivatorConfig::from_env();
    if config.iam_role.is_none() {
        warn!("{IAM_ROLE_ENV} is not configured; activation requests will fail");
    }

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = config.region.clone() {
        loader = loader.region(Region::new(region));
    }
    let aws_config = loader.load().await;

    let deps = RuntimeDependencies {
        config,
        registry: SsmRegistrationService {
            ssm_client: aws_sdk_ssm::Client::new(&aws_config),
        },
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::error::ErrorMetadata;
    use aws_sdk_ssm::operation::describe_activations::DescribeActivationsError;
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;

    use super::*;

    #[test]
    fn timeouts_are_classified_as_timeout() {
        let error: SdkError<DescribeActivationsError, HttpResponse> =
            SdkError::timeout_error("operation timed out");

        let classified = classify_sdk_error("DescribeActivations", &error);

        assert_eq!(classified.kind, UpstreamErrorKind::Timeout);
        assert_eq!(classified.status_code, None);
        assert!(classified.message.starts_with("DescribeActivations failed"));
    }

    #[test]
    fn service_errors_keep_raw_http_status() {
        let source = DescribeActivationsError::generic(
            ErrorMetadata::builder()
                .code("ThrottlingException")
                .message("Rate exceeded")
                .build(),
        );
        let raw = HttpResponse::new(
            StatusCode::try_from(400_u16).expect("valid status code"),
            SdkBody::empty(),
        );
        let error: SdkError<DescribeActivationsError, HttpResponse> =
            SdkError::service_error(source, raw);

        let classified = classify_sdk_error("DescribeActivations", &error);

        assert_eq!(classified.kind, UpstreamErrorKind::Service);
        assert_eq!(classified.status_code, Some(400));
        assert!(classified.message.starts_with("DescribeActivations failed"));
    }

    #[test]
    fn create_output_with_id_and_code_becomes_created_activation() {
        let output = CreateActivationOutput::builder()
            .activation_id("act-9")
            .activation_code("code-9")
            .build();

        let created = created_activation(&output).expect("complete output should convert");

        assert_eq!(
            created,
            CreatedActivation {
                status_code: 200,
                activation_id: "act-9".to_string(),
                activation_code: "code-9".to_string(),
            }
        );
    }

    #[test]
    fn create_output_missing_code_or_id_is_a_service_error() {
        let outputs = [
            CreateActivationOutput::builder().activation_id("act-9").build(),
            CreateActivationOutput::builder().activation_code("code-9").build(),
            CreateActivationOutput::builder().build(),
        ];

        for output in outputs {
            let error = created_activation(&output).expect_err("incomplete output should fail");

            assert_eq!(error.kind, UpstreamErrorKind::Service);
            assert!(error.message.contains("missing the activation id or code"));
        }
    }

    #[test]
    fn construction_failures_are_classified_as_transport() {
        let error: SdkError<DescribeActivationsError, HttpResponse> =
            SdkError::construction_failure("missing region");

        let classified = classify_sdk_error("DescribeActivations", &error);

        assert_eq!(classified.kind, UpstreamErrorKind::Transport);
    }

    #[test]
    fn converts_sdk_activation_into_summary() {
        let activation = Activation::builder()
            .activation_id("act-1")
            .description("WorkspaceActivation-ws-42")
            .default_instance_name("ws-42")
            .iam_role("ssm-workspaces-instance")
            .registration_limit(1)
            .registrations_count(0)
            .expiration_date(SmithyDateTime::from_secs(1_767_225_600))
            .expired(false)
            .build();

        let summary = activation_summary(&activation);

        assert_eq!(summary.activation_id.as_deref(), Some("act-1"));
        assert!(!summary.expired);
        assert_eq!(
            summary.expiration_date.map(|value| value.timestamp()),
            Some(1_767_225_600)
        );
    }
}
