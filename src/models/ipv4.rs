//! IPv4 address block (CIDR) utilities.
//!
//! Provides the [`Ipv4`] block type used for parent blocks and carved subnets,
//! along with the mask arithmetic the partitioner relies on.

use crate::error::{AllocError, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use ipam_subnet_allocator::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32> {
    if len > MAX_LENGTH {
        Err(AllocError::InvalidCidr(format!(
            "network length /{len} is too long"
        )))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Number of addresses in a block of the given prefix length.
pub fn block_size(len: u8) -> Result<u64> {
    if len > MAX_LENGTH {
        Err(AllocError::InvalidCidr(format!(
            "network length /{len} is too long"
        )))
    } else {
        Ok(1u64 << (MAX_LENGTH - len))
    }
}

/// IPv4 address block in CIDR notation.
///
/// `mask` is always within `0..=32`; every constructor checks it.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address, host bits may be set.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::new(&s).map_err(de::Error::custom)
    }
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| AllocError::InvalidCidr(format!("missing '/' in '{addr_cidr}'")))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| AllocError::InvalidCidr(format!("invalid address '{addr}'")))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| AllocError::InvalidCidr(format!("invalid prefix length '{mask}'")))?;
        if mask > MAX_LENGTH {
            return Err(AllocError::InvalidCidr(format!(
                "network length /{mask} is too long"
            )));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// Get the lowest (network) address in the block.
    pub fn lo(&self) -> Ipv4Addr {
        cut_addr(self.addr, self.mask)
            .unwrap_or_else(|e| panic!("Error calculating minimum address for {self:?}: {e}"))
    }

    /// Get the highest (broadcast) address in the block.
    pub fn hi(&self) -> Ipv4Addr {
        broadcast_addr(self.addr, self.mask)
            .unwrap_or_else(|e| panic!("Error calculating broadcast address for {self:?}: {e}"))
    }

    /// The same block with host bits cleared.
    pub fn network(&self) -> Ipv4 {
        Ipv4 {
            addr: self.lo(),
            mask: self.mask,
        }
    }

    /// True when the two address ranges share at least one address.
    pub fn overlaps(&self, other: &Ipv4) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Ipv4) -> bool {
        self.mask <= other.mask && self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    /// Lazily enumerate the subdivisions of this block at `new_prefix`,
    /// lowest address first.
    pub fn subnets(&self, new_prefix: u8) -> Result<Subnets> {
        if new_prefix < self.mask || new_prefix > MAX_LENGTH {
            return Err(AllocError::InvalidPrefixLength {
                parent: *self,
                prefix_length: new_prefix,
            });
        }
        let start = u32::from(self.lo()) as u64;
        Ok(Subnets {
            next: start,
            end: start + block_size(self.mask)?,
            step: block_size(new_prefix)?,
            mask: new_prefix,
        })
    }
}

/// Iterator over equal-size subdivisions of a block, see [`Ipv4::subnets`].
#[derive(Debug, Clone)]
pub struct Subnets {
    next: u64,
    end: u64,
    step: u64,
    mask: u8,
}

impl Iterator for Subnets {
    type Item = Ipv4;

    fn next(&mut self) -> Option<Ipv4> {
        if self.next >= self.end {
            return None;
        }
        let subnet = Ipv4 {
            addr: Ipv4Addr::from(self.next as u32),
            mask: self.mask,
        };
        self.next += self.step;
        Some(subnet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = ((self.end - self.next.min(self.end)) / self.step) as usize;
        (remaining, Some(remaining))
    }
}

impl FromStr for Ipv4 {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Ipv4> {
        Ipv4::new(s)
    }
}

impl fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl PartialEq for Ipv4 {
    fn eq(&self, other: &Ipv4) -> bool {
        self.addr == other.addr && self.mask == other.mask
    }
}

impl PartialOrd for Ipv4 {
    fn partial_cmp(&self, other: &Ipv4) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
