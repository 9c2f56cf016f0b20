//! AWS-oriented adapters and handlers for SSM workspace activation.
//!
//! This crate owns runtime integration details (the Lambda handler and the
//! registration service seam) and re-exports the core contracts under a
//! single runtime module boundary.

pub mod adapters;
pub mod handlers;

pub mod runtime {
    pub use ssm_activation_core::{config, contract, error, expiry};
}
