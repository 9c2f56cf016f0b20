use thiserror::Error;

use crate::contract::ErrorBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Timeout,
    Service,
    Transport,
}

/// Failure reported by the registration service adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RegistrationError {
    pub kind: UpstreamErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
}

impl RegistrationError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn unexpected_status(operation: &str, status_code: u16) -> Self {
        Self::new(
            UpstreamErrorKind::Service,
            format!("{operation} returned HTTP {status_code}"),
        )
        .with_status(status_code)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == UpstreamErrorKind::Timeout
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("{0}")]
    MalformedRequest(String),

    #[error("missing required query parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("{0}")]
    Misconfiguration(String),

    #[error("failed to look up existing activations: {0}")]
    UpstreamLookupFailure(RegistrationError),

    #[error("failed to delete activation {activation_id}: {source}")]
    UpstreamDeleteFailure {
        activation_id: String,
        source: RegistrationError,
    },

    #[error("failed to create activation: {0}")]
    UpstreamCreateFailure(RegistrationError),
}

impl ActivationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::MissingParameter(_) => "missing_parameter",
            Self::Misconfiguration(_) => "misconfiguration",
            Self::UpstreamLookupFailure(_) => "upstream_lookup_failure",
            Self::UpstreamDeleteFailure { .. } => "upstream_delete_failure",
            Self::UpstreamCreateFailure(_) => "upstream_create_failure",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequest(_) | Self::MissingParameter(_) => 400,
            Self::Misconfiguration(_) => 500,
            Self::UpstreamLookupFailure(source)
            | Self::UpstreamDeleteFailure { source, .. }
            | Self::UpstreamCreateFailure(source) => {
                if source.is_timeout() {
                    504
                } else {
                    502
                }
            }
        }
    }

    /// HTTP status the registration service answered with, if the failure
    /// came from an upstream call that got that far.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamLookupFailure(source)
            | Self::UpstreamDeleteFailure { source, .. }
            | Self::UpstreamCreateFailure(source) => source.status_code,
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}
