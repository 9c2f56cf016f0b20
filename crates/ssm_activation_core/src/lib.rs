//! Shared SSM activation domain primitives.
//!
//! This crate owns the activation request/response contracts, the expiry
//! policy, the error taxonomy and environment configuration. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod config;
pub mod contract;
pub mod error;
pub mod expiry;
