//! IPAM pool operations.
//!
//! [`IpamClient`] is the seam between the allocation logic and the network:
//! [`AwsCliIpam`] talks to AWS through the CLI, tests use an in-memory stub.

use super::cli;
use crate::config::Config;
use crate::error::{AllocError, Result};
use crate::models::{AllocationRecord, Ipv4};
use serde::Deserialize;

/// Allocate-one / release-one access to an IPAM pool.
pub trait IpamClient {
    /// Allocate one top-level block of `/netmask_length` from the pool.
    fn allocate_cidr(
        &mut self,
        pool_id: &str,
        netmask_length: u8,
        description: Option<&str>,
    ) -> Result<AllocationRecord>;

    /// Release a block previously returned by [`IpamClient::allocate_cidr`].
    fn release_allocation(&mut self, pool_id: &str, record: &AllocationRecord) -> Result<()>;
}

/// `aws ec2 allocate-ipam-pool-cidr` response.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AllocateResponse {
    ipam_pool_allocation: PoolAllocation,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PoolAllocation {
    cidr: Ipv4,
    ipam_pool_allocation_id: String,
}

/// `aws ec2 release-ipam-pool-allocation` response.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ReleaseResponse {
    success: bool,
}

fn parse_response<'a, T: Deserialize<'a>>(operation: &str, output: &'a str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(output);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        AllocError::external(
            operation,
            format!("unexpected response: path={} error={}", e.path(), e),
        )
    })
}

fn parse_allocate_response(output: &str) -> Result<AllocationRecord> {
    let response: AllocateResponse = parse_response("allocate", output)?;
    let allocation = response.ipam_pool_allocation;
    Ok(AllocationRecord {
        cidr: allocation.cidr,
        allocation_id: allocation.ipam_pool_allocation_id,
    })
}

fn parse_release_response(output: &str, record: &AllocationRecord) -> Result<()> {
    let response: ReleaseResponse = parse_response("release", output)?;
    if response.success {
        Ok(())
    } else {
        Err(AllocError::external(
            "release",
            format!("service reported failure releasing {record}"),
        ))
    }
}

/// IPAM client backed by the AWS CLI. One instance per invocation.
#[derive(Debug, Clone)]
pub struct AwsCliIpam {
    config: Config,
}

impl AwsCliIpam {
    pub fn new(config: Config) -> AwsCliIpam {
        AwsCliIpam { config }
    }

    fn ec2_args(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec!["ec2".to_string(), subcommand.to_string()];
        if let Some(profile) = &self.config.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
        if let Some(region) = &self.config.region {
            args.extend(["--region".to_string(), region.clone()]);
        }
        args.extend(["--output".to_string(), "json".to_string()]);
        args
    }

    fn allocate_args(
        &self,
        pool_id: &str,
        netmask_length: u8,
        description: Option<&str>,
    ) -> Vec<String> {
        let mut args = self.ec2_args("allocate-ipam-pool-cidr");
        args.extend([
            "--ipam-pool-id".to_string(),
            pool_id.to_string(),
            "--netmask-length".to_string(),
            netmask_length.to_string(),
        ]);
        if let Some(description) = description {
            args.extend(["--description".to_string(), description.to_string()]);
        }
        args
    }

    fn release_args(&self, pool_id: &str, record: &AllocationRecord) -> Vec<String> {
        let mut args = self.ec2_args("release-ipam-pool-allocation");
        args.extend([
            "--ipam-pool-id".to_string(),
            pool_id.to_string(),
            "--ipam-pool-allocation-id".to_string(),
            record.allocation_id.clone(),
            "--cidr".to_string(),
            record.cidr.to_string(),
        ]);
        args
    }

    fn run(&self, operation: &str, args: &[String]) -> Result<String> {
        cli::run(&self.config.aws_cli, args, self.config.max_output).map_err(|e| match e {
            AllocError::ExternalService { message, .. } => {
                AllocError::external(operation, message)
            }
            other => other,
        })
    }
}

impl IpamClient for AwsCliIpam {
    fn allocate_cidr(
        &mut self,
        pool_id: &str,
        netmask_length: u8,
        description: Option<&str>,
    ) -> Result<AllocationRecord> {
        let args = self.allocate_args(pool_id, netmask_length, description);
        let output = self.run("allocate", &args)?;
        let record = parse_allocate_response(&output)?;
        log::info!("Allocated {record} from {pool_id}");
        Ok(record)
    }

    fn release_allocation(&mut self, pool_id: &str, record: &AllocationRecord) -> Result<()> {
        let args = self.release_args(pool_id, record);
        let output = self.run("release", &args)?;
        parse_release_response(&output, record)?;
        log::info!("Released {record} back to {pool_id}");
        Ok(())
    }
}
