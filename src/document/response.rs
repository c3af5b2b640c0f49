//! Output document written to stdout.
//!
//! Every value is a string so the document can feed a Terraform `external`
//! data source directly; lists are JSON-encoded maps keyed `<prefix>_<n>`.

use crate::error::{AllocError, Result};
use crate::models::{AllocationRecord, Ipv4, Tier};
use crate::processing::TierSubnets;
use serde::Serialize;
use serde_json::{Map, Value};

/// `create-allocation` result.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateResponse {
    pub primary_cidr: String,
    pub secondary_cidrs: String,
    pub public_subnets: String,
    pub private_subnets: String,
    pub intra_subnets: String,
    pub redshift_subnets: String,
    pub database_subnets: String,
    /// Records the caller must keep for `destroy-allocation`.
    pub allocation_details: String,
}

/// Encode `items` as `{"<prefix>_0": "..", "<prefix>_1": ..}`.
pub fn indexed_json<T: ToString>(prefix: &str, items: &[T]) -> Result<String> {
    let map: Map<String, Value> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (format!("{prefix}_{i}"), Value::String(item.to_string())))
        .collect();
    to_json(&map)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| AllocError::InvalidInput(format!("cannot encode output: {e}")))
}

impl CreateResponse {
    pub fn new(
        primary: Ipv4,
        secondaries: &[Ipv4],
        subnets: &TierSubnets,
        allocations: &[AllocationRecord],
    ) -> Result<CreateResponse> {
        let encode_tier = |tier: Tier| -> Result<String> {
            let list = subnets.get(&tier).map(Vec::as_slice).unwrap_or_default();
            indexed_json("subnet", list)
        };
        Ok(CreateResponse {
            primary_cidr: primary.to_string(),
            secondary_cidrs: indexed_json("cidr", secondaries)?,
            public_subnets: encode_tier(Tier::Public)?,
            private_subnets: encode_tier(Tier::Private)?,
            intra_subnets: encode_tier(Tier::Intra)?,
            redshift_subnets: encode_tier(Tier::Redshift)?,
            database_subnets: encode_tier(Tier::Database)?,
            allocation_details: to_json(allocations)?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        to_json(self)
    }
}

/// `destroy-allocation` result: an empty object.
pub fn empty_response() -> String {
    "{}".to_string()
}
