//! Integration tests for ipam-subnet-allocator
//!
//! These run the create/destroy commands end to end against an in-memory pool.

use ipam_subnet_allocator::aws::IpamClient;
use ipam_subnet_allocator::models::{AllocationRecord, Ipv4};
use ipam_subnet_allocator::{execute, parse_args, AllocError, Result};
use serde_json::Value;
use std::net::Ipv4Addr;

const POOL: &str = "ipam-pool-0f00ba4";

/// Hands out consecutive aligned blocks from 10.0.0.0.
#[derive(Default)]
struct MemoryPool {
    next: u32,
    calls: usize,
    fail_on_call: Option<usize>,
    outstanding: Vec<AllocationRecord>,
}

impl IpamClient for MemoryPool {
    fn allocate_cidr(
        &mut self,
        pool_id: &str,
        netmask_length: u8,
        _description: Option<&str>,
    ) -> Result<AllocationRecord> {
        assert_eq!(pool_id, POOL);
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(AllocError::ExternalService {
                operation: "allocate".to_string(),
                message: "InsufficientCidrCapacity".to_string(),
            });
        }
        let size = 1u32 << (32 - netmask_length);
        let start = self.next.div_ceil(size) * size;
        self.next = start + size;
        let record = AllocationRecord {
            cidr: Ipv4 {
                addr: Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 0, 0)) + start),
                mask: netmask_length,
            },
            allocation_id: format!("ipam-pool-alloc-{}", self.calls),
        };
        self.outstanding.push(record.clone());
        Ok(record)
    }

    fn release_allocation(&mut self, _pool_id: &str, record: &AllocationRecord) -> Result<()> {
        let before = self.outstanding.len();
        self.outstanding.retain(|r| r != record);
        if self.outstanding.len() == before {
            return Err(AllocError::ExternalService {
                operation: "release".to_string(),
                message: format!("{record} is not allocated"),
            });
        }
        Ok(())
    }
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("src/tests/test_data/{name}"))
        .expect("Failed to read test fixture")
}

fn field(output: &Value, name: &str) -> Value {
    let encoded = output[name].as_str().expect("output values are strings");
    serde_json::from_str(encoded).expect("nested value is JSON")
}

#[test]
fn test_full_workflow_allocating_from_pool() {
    let mut pool = MemoryPool::default();
    let create = parse_args(&["create-allocation", POOL]).unwrap();

    let output = execute(&mut pool, &create, &read_fixture("create_request_01.json"))
        .expect("create-allocation failed");
    let output: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(output["primary_cidr"], "10.0.0.0/16");
    assert_eq!(
        field(&output, "secondary_cidrs"),
        serde_json::json!({"cidr_0": "10.1.0.0/20", "cidr_1": "10.1.16.0/20"})
    );
    assert_eq!(
        field(&output, "public_subnets"),
        serde_json::json!({
            "subnet_0": "10.0.0.0/24",
            "subnet_1": "10.0.1.0/24",
            "subnet_2": "10.0.2.0/24"
        })
    );
    assert_eq!(
        field(&output, "private_subnets"),
        serde_json::json!({
            "subnet_0": "10.1.0.0/22",
            "subnet_1": "10.1.4.0/22",
            "subnet_2": "10.1.16.0/22"
        })
    );
    assert_eq!(
        field(&output, "intra_subnets"),
        serde_json::json!({"subnet_0": "10.0.3.0/26", "subnet_1": "10.0.3.64/26"})
    );
    assert_eq!(field(&output, "redshift_subnets"), serde_json::json!({}));
    assert_eq!(
        field(&output, "database_subnets"),
        serde_json::json!({"subnet_0": "10.0.3.128/27", "subnet_1": "10.0.3.160/27"})
    );

    let allocation_details = field(&output, "allocation_details");
    assert_eq!(allocation_details.as_array().unwrap().len(), 3);
    assert_eq!(pool.outstanding.len(), 3);

    // Teardown replays the emitted records.
    let destroy = parse_args(&["destroy-allocation", POOL]).unwrap();
    // Terraform hands the string-encoded list back unchanged.
    let input =
        serde_json::json!({ "allocation_details": output["allocation_details"] }).to_string();
    let output = execute(&mut pool, &destroy, &input).expect("destroy-allocation failed");
    assert_eq!(output, "{}");
    assert!(pool.outstanding.is_empty());
}

#[test]
fn test_existing_blocks_skip_the_pool() {
    let mut pool = MemoryPool::default();
    let create = parse_args(&["create-allocation", POOL]).unwrap();

    let output = execute(&mut pool, &create, &read_fixture("create_request_02.json")).unwrap();
    let output: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(pool.calls, 0);
    assert_eq!(
        field(&output, "public_subnets"),
        serde_json::json!({"subnet_0": "10.0.0.0/24"})
    );
    assert_eq!(
        field(&output, "private_subnets"),
        serde_json::json!({"subnet_0": "10.1.0.0/25"})
    );
    assert_eq!(field(&output, "allocation_details"), serde_json::json!([]));
}

#[test]
fn test_failed_create_leaves_nothing_allocated() {
    let mut pool = MemoryPool {
        fail_on_call: Some(3),
        ..Default::default()
    };
    let create = parse_args(&["create-allocation", POOL]).unwrap();

    let err = execute(&mut pool, &create, &read_fixture("create_request_01.json")).unwrap_err();
    assert!(matches!(err, AllocError::ExternalService { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(pool.outstanding.is_empty(), "rollback must release every block");
}

#[test]
fn test_deterministic_output() {
    let create = parse_args(&["create-allocation", POOL]).unwrap();
    let input = read_fixture("create_request_01.json");

    let first = execute(&mut MemoryPool::default(), &create, &input).unwrap();
    let second = execute(&mut MemoryPool::default(), &create, &input).unwrap();
    assert_eq!(first, second);
}
