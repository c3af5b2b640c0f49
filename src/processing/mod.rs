//! Allocation logic.
//!
//! - [`pool`] - Top-level block allocation and release against an IPAM pool
//! - [`partition`] - Carving tier subnets out of parent blocks

pub mod partition;
pub mod pool;

// Re-export public functions
pub use partition::{partition, partition_tiers, LastAllocatedTable, TierSubnets};
pub use pool::{allocate, release, rollback};
