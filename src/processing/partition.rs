//! Deterministic subnet partitioning of parent blocks.
//!
//! Each request is served by the lowest subdivision of its parent that lies
//! past the last subnet handed out from that parent. The
//! [`LastAllocatedTable`] is shared across all tiers of one invocation.

use crate::error::{AllocError, Result};
use crate::models::{Ipv4, SubnetSpec, Tier};
use std::collections::{BTreeMap, HashMap};

/// Most recently issued child subnet per parent block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LastAllocatedTable {
    last: HashMap<Ipv4, Ipv4>,
}

impl LastAllocatedTable {
    pub fn new() -> LastAllocatedTable {
        Self::default()
    }

    /// Last subnet carved from `parent`, if any.
    pub fn get(&self, parent: &Ipv4) -> Option<Ipv4> {
        self.last.get(&parent.network()).copied()
    }

    /// Record `subnet` as the latest allocation from `parent`, replacing any previous entry.
    pub fn record(&mut self, parent: &Ipv4, subnet: Ipv4) {
        self.last.insert(parent.network(), subnet);
    }
}

/// Carve one subnet per spec, in order, out of `parents`.
///
/// # Arguments
/// * `parents` - Parent block list, index 0 is the primary block
/// * `specs` - Subnet requests, processed strictly in order
/// * `table` - Last allocation per parent, updated after every subnet
///
/// # Returns
/// The allocated subnets, one per spec. On error nothing is returned but
/// `table` keeps the entries recorded before the failing spec.
pub fn partition(
    parents: &[Ipv4],
    specs: &[SubnetSpec],
    table: &mut LastAllocatedTable,
) -> Result<Vec<Ipv4>> {
    specs
        .iter()
        .map(|spec| allocate_subnet(parents, spec, table))
        .collect()
}

fn allocate_subnet(
    parents: &[Ipv4],
    spec: &SubnetSpec,
    table: &mut LastAllocatedTable,
) -> Result<Ipv4> {
    let parent = parents
        .get(spec.parent_index)
        .ok_or(AllocError::ParentIndexOutOfRange {
            index: spec.parent_index,
            len: parents.len(),
        })?
        .network();

    let mut candidates = parent.subnets(spec.prefix_length)?;

    let subnet = match table.get(&parent) {
        Some(last) => {
            if spec.prefix_length < last.mask {
                log::warn!(
                    "Requesting /{prefix} from {parent} after a finer /{} ({last}); \
                     space after {last} up to the next /{prefix} boundary stays unused",
                    last.mask,
                    prefix = spec.prefix_length,
                );
            }
            // Drop every candidate overlapping or below the last claim.
            candidates.skip_while(|c| c.lo() <= last.hi()).next()
        }
        None => candidates.next(),
    }
    .ok_or(AllocError::SubnetsExhausted { parent })?;

    log::debug!("Allocated {subnet} from {parent}");
    table.record(&parent, subnet);
    Ok(subnet)
}

/// Subnets per tier, in tier order.
pub type TierSubnets = BTreeMap<Tier, Vec<Ipv4>>;

/// Partition every tier in [`Tier::ALL`] order against one fresh table.
///
/// Tiers missing from `tiers` or with no specs yield an empty list.
pub fn partition_tiers(
    parents: &[Ipv4],
    tiers: &BTreeMap<Tier, Vec<SubnetSpec>>,
) -> Result<TierSubnets> {
    let mut table = LastAllocatedTable::new();
    let mut result = TierSubnets::new();

    for tier in Tier::ALL {
        let specs = tiers.get(&tier).map(Vec::as_slice).unwrap_or_default();
        let subnets = partition(parents, specs, &mut table)?;
        if !subnets.is_empty() {
            log::info!(
                "Tier {tier}: {}",
                subnets
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        result.insert(tier, subnets);
    }

    Ok(result)
}
