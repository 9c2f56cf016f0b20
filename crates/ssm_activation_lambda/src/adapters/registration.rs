use crate::runtime::contract::{ActivationLookup, CreatedActivation, NewActivation};
use crate::runtime::error::RegistrationError;

/// The subset of the SSM activation API the reconciler consumes.
pub trait RegistrationService {
    fn describe_activations(
        &self,
        default_instance_name: &str,
        max_results: i32,
    ) -> Result<ActivationLookup, RegistrationError>;

    fn delete_activation(&self, activation_id: &str) -> Result<(), RegistrationError>;

    fn create_activation(
        &self,
        request: &NewActivation,
    ) -> Result<CreatedActivation, RegistrationError>;
}
