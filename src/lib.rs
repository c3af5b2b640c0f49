//! Allocate IPv4 blocks from an AWS VPC IPAM pool and carve them into
//! per-tier subnets.
//!
//! - [`aws`] - IPAM pool access through the AWS CLI
//! - [`processing`] - pool allocation with rollback, subnet partitioning
//! - [`document`] - JSON input/output documents
//! - [`commands`] - `create-allocation` / `destroy-allocation`

pub mod aws;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod processing;

pub use commands::{execute, parse_args, Invocation, Operation, USAGE};
pub use error::{AllocError, Result};
