//! AWS IPAM interaction.
//!
//! - [`cli`] - Command execution for the AWS CLI
//! - [`ipam`] - IPAM pool allocate/release behind the [`IpamClient`] trait

mod cli;
mod ipam;

// Re-export public types and functions
pub use ipam::{AwsCliIpam, IpamClient};
