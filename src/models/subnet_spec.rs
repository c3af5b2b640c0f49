//! Subnet requests and deployment tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request for one subnet of `prefix_length` carved from `parents[parent_index]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetSpec {
    /// Index into the parent block list, 0 is the primary block.
    #[serde(rename = "cidr_pointer", alias = "parent_index", default)]
    pub parent_index: usize,
    #[serde(rename = "prefixlen")]
    pub prefix_length: u8,
}

impl SubnetSpec {
    pub fn new(prefix_length: u8) -> SubnetSpec {
        SubnetSpec {
            parent_index: 0,
            prefix_length,
        }
    }

    pub fn on_parent(mut self, parent_index: usize) -> SubnetSpec {
        self.parent_index = parent_index;
        self
    }
}

/// Deployment tier, processed in declaration order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Public,
    Private,
    Intra,
    Redshift,
    Database,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Public,
        Tier::Private,
        Tier::Intra,
        Tier::Redshift,
        Tier::Database,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Public => "public",
            Tier::Private => "private",
            Tier::Intra => "intra",
            Tier::Redshift => "redshift",
            Tier::Database => "database",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
