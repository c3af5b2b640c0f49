//! The `create-allocation` and `destroy-allocation` commands.

use crate::aws::IpamClient;
use crate::document::{
    empty_response, CreateRequest, CreateResponse, DestroyRequest, PrimarySource,
    SecondarySource,
};
use crate::error::{AllocError, Result};
use crate::models::{AllocationRecord, Ipv4};
use crate::processing::{allocate, partition_tiers, release, rollback};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const USAGE: &str =
    "Usage: ipam-subnet-allocator [create-allocation|destroy-allocation] [ipam_pool_id]";

static POOL_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_pool_id_regex() -> &'static Regex {
    POOL_ID_REGEX.get_or_init(|| Regex::new(r"^ipam-pool-[0-9a-f]+$").expect("Invalid Regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateAllocation,
    DestroyAllocation,
}

impl FromStr for Operation {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Operation> {
        match s {
            "create-allocation" => Ok(Operation::CreateAllocation),
            "destroy-allocation" => Ok(Operation::DestroyAllocation),
            other => Err(AllocError::Usage(format!("Unknown operation: {other}"))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAllocation => f.write_str("create-allocation"),
            Operation::DestroyAllocation => f.write_str("destroy-allocation"),
        }
    }
}

/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: Operation,
    pub pool_id: String,
}

/// Parse the arguments following the program name.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Invocation> {
    let [operation, pool_id] = args else {
        return Err(AllocError::Usage(format!(
            "expected 2 arguments, got {}",
            args.len()
        )));
    };
    let operation: Operation = operation.as_ref().parse()?;
    let pool_id = pool_id.as_ref().trim();
    if !get_pool_id_regex().is_match(pool_id) {
        return Err(AllocError::Usage(format!(
            "'{pool_id}' is not an IPAM pool id (ipam-pool-<hex>)"
        )));
    }
    Ok(Invocation {
        operation,
        pool_id: pool_id.to_string(),
    })
}

/// Run `invocation` against `input` and return the output document.
pub fn execute<C: IpamClient + ?Sized>(
    client: &mut C,
    invocation: &Invocation,
    input: &str,
) -> Result<String> {
    log::info!("#Start {} pool={}", invocation.operation, invocation.pool_id);
    match invocation.operation {
        Operation::CreateAllocation => {
            let request = CreateRequest::from_json(input)?;
            create_allocation(client, &invocation.pool_id, &request)?.to_json()
        }
        Operation::DestroyAllocation => {
            let request = DestroyRequest::from_json(input)?;
            destroy_allocation(client, &invocation.pool_id, &request)?;
            Ok(empty_response())
        }
    }
}

/// Obtain parent blocks (unless supplied) and carve every tier out of them.
///
/// Any failure after the first pool allocation releases every block
/// allocated by this call before the error is returned.
pub fn create_allocation<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    request: &CreateRequest,
) -> Result<CreateResponse> {
    let mut created = Vec::new();
    match build_allocation(client, pool_id, request, &mut created) {
        Ok(response) => Ok(response),
        Err(e) => {
            log::error!("create-allocation failed: {e}");
            rollback(client, pool_id, &created);
            Err(e)
        }
    }
}

fn build_allocation<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    request: &CreateRequest,
    created: &mut Vec<AllocationRecord>,
) -> Result<CreateResponse> {
    let description = request.description.as_deref();

    let primary = match &request.primary {
        PrimarySource::Existing(cidr) => *cidr,
        PrimarySource::Allocate(length) => {
            let records = allocate(client, pool_id, &[*length], description)?;
            let cidr = records[0].cidr;
            created.extend(records);
            cidr
        }
    };

    let secondaries: Vec<Ipv4> = match &request.secondaries {
        SecondarySource::Existing(cidrs) => cidrs.clone(),
        SecondarySource::Allocate(lengths) => {
            let records = allocate(client, pool_id, lengths, description)?;
            let cidrs = records.iter().map(|r| r.cidr).collect();
            created.extend(records);
            cidrs
        }
    };

    let mut parents = Vec::with_capacity(1 + secondaries.len());
    parents.push(primary);
    parents.extend(secondaries.iter().copied());

    let subnets = partition_tiers(&parents, &request.tiers)?;
    CreateResponse::new(primary, &secondaries, &subnets, created)
}

/// Release every record of a previous `create-allocation`.
pub fn destroy_allocation<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    request: &DestroyRequest,
) -> Result<()> {
    if request.allocation_details.is_empty() {
        log::warn!("Nothing to release in {pool_id}");
    }
    release(client, pool_id, &request.allocation_details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pool::stub::StubIpam;
    use serde_json::Value;

    const POOL: &str = "ipam-pool-0abc";

    fn output_field(output: &str, field: &str) -> String {
        let value: Value = serde_json::from_str(output).unwrap();
        value[field].as_str().unwrap().to_string()
    }

    #[test]
    fn test_parse_args() {
        let invocation = parse_args(&["create-allocation", "ipam-pool-0abc123"]).unwrap();
        assert_eq!(invocation.operation, Operation::CreateAllocation);
        assert_eq!(invocation.pool_id, "ipam-pool-0abc123");
        let invocation = parse_args(&["destroy-allocation", "ipam-pool-1"]).unwrap();
        assert_eq!(invocation.operation, Operation::DestroyAllocation);
    }

    #[test]
    fn test_parse_args_usage_errors() {
        for args in [
            vec![],
            vec!["create-allocation"],
            vec!["create-allocation", "ipam-pool-1", "extra"],
            vec!["list-allocations", "ipam-pool-1"],
            vec!["create-allocation", "pool-1"],
        ] {
            let err = parse_args(&args).unwrap_err();
            assert!(matches!(err, AllocError::Usage(_)), "{args:?}");
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_create_with_existing_blocks_allocates_nothing() {
        let mut client = StubIpam::default();
        let invocation = parse_args(&["create-allocation", POOL]).unwrap();
        let input = r#"{
            "primary_cidr": "10.0.0.0/16",
            "secondary_cidr_ranges": ["10.1.0.0/16"],
            "subnet_configurations": {
                "public": [{"prefixlen": 24}, {"prefixlen": 24, "cidr_pointer": 1}],
                "private": [{"prefixlen": 24}]
            }
        }"#;
        let output = execute(&mut client, &invocation, input).unwrap();
        assert_eq!(client.allocate_calls, 0);
        assert_eq!(output_field(&output, "primary_cidr"), "10.0.0.0/16");
        assert_eq!(
            output_field(&output, "public_subnets"),
            r#"{"subnet_0":"10.0.0.0/24","subnet_1":"10.1.0.0/24"}"#
        );
        assert_eq!(
            output_field(&output, "private_subnets"),
            r#"{"subnet_0":"10.0.1.0/24"}"#
        );
        assert_eq!(output_field(&output, "allocation_details"), "[]");
    }

    #[test]
    fn test_create_allocates_primary_and_secondaries() {
        let mut client = StubIpam::default();
        let request = CreateRequest::from_json(
            r#"{"primary_netmask": "16", "secondary_netmasks": "[16]",
                "subnet_configurations":
                    "{\"database\": [{\"prefixlen\": 28, \"cidr_pointer\": 1}]}"}"#,
        )
        .unwrap();
        let response = create_allocation(&mut client, POOL, &request).unwrap();
        assert_eq!(response.primary_cidr, "10.0.0.0/16");
        assert_eq!(response.secondary_cidrs, r#"{"cidr_0":"10.1.0.0/16"}"#);
        assert_eq!(response.database_subnets, r#"{"subnet_0":"10.1.0.0/28"}"#);
        assert_eq!(client.outstanding.len(), 2);
        assert!(response.allocation_details.contains("ipam-pool-alloc-0002"));
    }

    #[test]
    fn test_secondary_failure_rolls_back_primary() {
        let mut client = StubIpam::failing_on(3);
        let request = CreateRequest::from_json(
            r#"{"primary_netmask": 16, "secondary_netmasks": [16, 16]}"#,
        )
        .unwrap();
        let err = create_allocation(&mut client, POOL, &request).unwrap_err();
        assert!(matches!(err, AllocError::ExternalService { .. }));
        assert!(client.outstanding.is_empty());
        assert_eq!(client.released.len(), 2);
    }

    #[test]
    fn test_partition_failure_rolls_back_everything() {
        let mut client = StubIpam::default();
        let request = CreateRequest::from_json(
            r#"{"primary_netmask": 24, "secondary_netmasks": [24],
                "subnet_configurations": {"public": [{"prefixlen": 25}, {"prefixlen": 25}],
                                          "intra": [{"prefixlen": 26}]}}"#,
        )
        .unwrap();
        let err = create_allocation(&mut client, POOL, &request).unwrap_err();
        assert!(matches!(err, AllocError::SubnetsExhausted { .. }));
        assert!(client.outstanding.is_empty());
        assert_eq!(client.released.len(), 2);
    }

    #[test]
    fn test_bad_parent_index_rolls_back() {
        let mut client = StubIpam::default();
        let request = CreateRequest::from_json(
            r#"{"primary_netmask": 16,
                "subnet_configurations": {"redshift": [{"prefixlen": 24, "cidr_pointer": 1}]}}"#,
        )
        .unwrap();
        let err = create_allocation(&mut client, POOL, &request).unwrap_err();
        assert!(matches!(err, AllocError::ParentIndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(client.released.len(), 1);
    }

    #[test]
    fn test_destroy_releases_and_emits_empty_document() {
        let mut client = StubIpam::default();
        let create = parse_args(&["create-allocation", POOL]).unwrap();
        let output = execute(&mut client, &create, r#"{"primary_netmask": 16}"#).unwrap();
        let allocation_details = output_field(&output, "allocation_details");

        let destroy = parse_args(&["destroy-allocation", POOL]).unwrap();
        let input = serde_json::json!({ "allocation_details": allocation_details }).to_string();
        assert_eq!(execute(&mut client, &destroy, &input).unwrap(), "{}");
        assert!(client.outstanding.is_empty());

        // A second teardown of the same records is surfaced.
        assert!(execute(&mut client, &destroy, &input).is_err());
    }

    #[test]
    fn test_destroy_without_details_releases_nothing_and_fails() {
        let mut client = StubIpam::default();
        let create = parse_args(&["create-allocation", POOL]).unwrap();
        let output = execute(&mut client, &create, r#"{"primary_netmask": 16}"#).unwrap();
        let allocation_details = output_field(&output, "allocation_details");

        let destroy = parse_args(&["destroy-allocation", POOL]).unwrap();
        let input = serde_json::json!({ "allocated_details": allocation_details }).to_string();
        let err = execute(&mut client, &destroy, &input).unwrap_err();
        assert!(matches!(err, AllocError::InvalidInput(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(client.outstanding.len(), 1, "block must stay allocated");
        assert!(client.released.is_empty());
    }
}
