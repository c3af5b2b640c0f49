//! Domain models for IPAM subnet allocation.
//!
//! - [`Ipv4`] - IPv4 address block with CIDR notation support
//! - [`SubnetSpec`] and [`Tier`] - subnet requests grouped by deployment tier
//! - [`AllocationRecord`] - a top-level block obtained from the IPAM pool

mod allocation;
mod ipv4;
mod subnet_spec;

// Re-export public types
pub use allocation::AllocationRecord;
pub use ipv4::{
    block_size, broadcast_addr, cut_addr, get_cidr_mask, Ipv4, Subnets, MAX_LENGTH,
};
pub use subnet_spec::{SubnetSpec, Tier};
