//! Error taxonomy for allocation, partitioning and release.

use crate::models::Ipv4;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AllocError>;

#[derive(Debug, Error)]
pub enum AllocError {
    /// Malformed command line, no side effects were made.
    #[error("usage error: {0}")]
    Usage(String),

    /// The IPAM service (via the AWS CLI) rejected or failed a request.
    #[error("IPAM {operation} failed: {message}")]
    ExternalService { operation: String, message: String },

    #[error("No more available subnets in {parent}.")]
    SubnetsExhausted { parent: Ipv4 },

    #[error("parent index {index} out of range, {len} parent block(s) available")]
    ParentIndexOutOfRange { index: usize, len: usize },

    #[error("cannot carve /{prefix_length} subnets out of {parent}")]
    InvalidPrefixLength { parent: Ipv4, prefix_length: u8 },

    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("invalid input document: {0}")]
    InvalidInput(String),
}

impl AllocError {
    pub(crate) fn external(operation: &str, message: impl Into<String>) -> AllocError {
        AllocError::ExternalService {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AllocError::Usage(_) => 1,
            _ => 2,
        }
    }
}
