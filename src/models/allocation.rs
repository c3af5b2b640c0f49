//! Top-level pool allocation records.

use super::Ipv4;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A block obtained from the IPAM pool. The caller persists these and hands
/// them back to `destroy-allocation` for teardown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    pub cidr: Ipv4,
    /// IPAM pool allocation id, e.g. `ipam-pool-alloc-0123abcd`.
    #[serde(alias = "ipam_pool_allocation_id")]
    pub allocation_id: String,
}

impl fmt::Display for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cidr, self.allocation_id)
    }
}
