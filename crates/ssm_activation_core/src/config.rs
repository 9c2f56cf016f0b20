use crate::error::ActivationError;

pub const REGION_ENV: &str = "region";
pub const IAM_ROLE_ENV: &str = "iamrole";

/// Process-wide settings read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivatorConfig {
    pub region: Option<String>,
    pub iam_role: Option<String>,
}

impl ActivatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            region: non_blank(lookup(REGION_ENV)),
            iam_role: non_blank(lookup(IAM_ROLE_ENV)),
        }
    }

    pub fn iam_role(&self) -> Result<&str, ActivationError> {
        self.iam_role.as_deref().ok_or_else(|| {
            ActivationError::Misconfiguration(format!("{IAM_ROLE_ENV} must be configured"))
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
