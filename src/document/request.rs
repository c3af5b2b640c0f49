//! Input documents read from stdin.
//!
//! Terraform's `external` data source only passes strings, so nested values
//! (lists, maps, numbers) are accepted either as JSON or as JSON-encoded strings.

use crate::error::{AllocError, Result};
use crate::models::{AllocationRecord, Ipv4, SubnetSpec, Tier};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Where the primary block comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimarySource {
    Existing(Ipv4),
    /// Allocate a new block of this prefix length.
    Allocate(u8),
}

/// Where the secondary blocks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondarySource {
    Existing(Vec<Ipv4>),
    Allocate(Vec<u8>),
}

/// Parsed `create-allocation` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub primary: PrimarySource,
    pub secondaries: SecondarySource,
    pub tiers: BTreeMap<Tier, Vec<SubnetSpec>>,
    pub description: Option<String>,
}

/// Parsed `destroy-allocation` input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DestroyRequest {
    pub allocation_details: Vec<AllocationRecord>,
}

#[derive(Deserialize, Debug, Default)]
struct RawCreateRequest {
    #[serde(default)]
    primary_cidr: Option<Value>,
    #[serde(default)]
    primary_netmask: Option<Value>,
    #[serde(default)]
    secondary_cidr_ranges: Option<Value>,
    #[serde(default)]
    secondary_netmasks: Option<Value>,
    #[serde(default)]
    subnet_configurations: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct RawDestroyRequest {
    #[serde(default, alias = "allocations")]
    allocation_details: Option<Value>,
}

/// A netmask given as a number or a numeric string.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Netmask {
    Number(u8),
    Text(String),
}

impl Netmask {
    fn value(&self, field: &str) -> Result<u8> {
        let len = match self {
            Netmask::Number(n) => *n,
            Netmask::Text(s) => s.trim().parse().map_err(|_| {
                AllocError::InvalidInput(format!("{field}: '{s}' is not a netmask length"))
            })?,
        };
        if len > 32 {
            return Err(AllocError::InvalidInput(format!(
                "{field}: /{len} is not an IPv4 netmask length"
            )));
        }
        Ok(len)
    }
}

fn parse_document<T: DeserializeOwned>(input: &str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(input);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| AllocError::InvalidInput(format!("path={} error={}", e.path(), e)))
}

/// Drop null, blank strings and empty lists so they read as "not provided".
fn provided(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::Array(a)) if a.is_empty() => None,
        other => other,
    }
}

/// Decode a field that is either JSON or a string holding JSON.
fn decode_nested<T: DeserializeOwned>(field: &str, value: Value) -> Result<T> {
    let result = match value {
        Value::String(s) => {
            let mut deserializer = serde_json::Deserializer::from_str(&s);
            serde_path_to_error::deserialize(&mut deserializer)
        }
        other => serde_path_to_error::deserialize(other),
    };
    result.map_err(|e| AllocError::InvalidInput(format!("{field}: path={} error={}", e.path(), e)))
}

fn parse_tiers(value: Option<Value>) -> Result<BTreeMap<Tier, Vec<SubnetSpec>>> {
    let Some(value) = provided(value) else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, Option<Vec<SubnetSpec>>> =
        decode_nested("subnet_configurations", value)?;

    let mut tiers = BTreeMap::new();
    for (name, specs) in raw {
        match Tier::ALL.iter().find(|t| t.name() == name) {
            Some(tier) => {
                tiers.insert(*tier, specs.unwrap_or_default());
            }
            None => log::warn!("Ignoring unknown subnet tier '{name}'"),
        }
    }
    Ok(tiers)
}

impl CreateRequest {
    pub fn from_json(input: &str) -> Result<CreateRequest> {
        let raw: RawCreateRequest = parse_document(input)?;

        let primary = match provided(raw.primary_cidr) {
            Some(cidr) => PrimarySource::Existing(decode_cidr("primary_cidr", cidr)?),
            None => {
                let netmask = provided(raw.primary_netmask).ok_or_else(|| {
                    AllocError::InvalidInput(
                        "either primary_cidr or primary_netmask is required".to_string(),
                    )
                })?;
                let netmask: Netmask = decode_netmask_value(netmask)?;
                PrimarySource::Allocate(netmask.value("primary_netmask")?)
            }
        };

        let secondaries = match provided(raw.secondary_cidr_ranges) {
            Some(ranges) => {
                SecondarySource::Existing(decode_nested("secondary_cidr_ranges", ranges)?)
            }
            None => {
                let netmasks: Vec<Netmask> = match provided(raw.secondary_netmasks) {
                    Some(value) => decode_nested("secondary_netmasks", value)?,
                    None => Vec::new(),
                };
                SecondarySource::Allocate(
                    netmasks
                        .iter()
                        .map(|n| n.value("secondary_netmasks"))
                        .collect::<Result<_>>()?,
                )
            }
        };

        Ok(CreateRequest {
            primary,
            secondaries,
            tiers: parse_tiers(raw.subnet_configurations)?,
            description: raw.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

fn decode_cidr(field: &str, value: Value) -> Result<Ipv4> {
    match value {
        Value::String(s) => Ipv4::new(&s)
            .map_err(|e| AllocError::InvalidInput(format!("{field}: {e}"))),
        other => Err(AllocError::InvalidInput(format!(
            "{field}: expected a CIDR string, got {other}"
        ))),
    }
}

/// A netmask value is a bare number or numeric string, never nested JSON.
fn decode_netmask_value(value: Value) -> Result<Netmask> {
    serde_path_to_error::deserialize(value)
        .map_err(|e| AllocError::InvalidInput(format!("primary_netmask: {e}")))
}

impl DestroyRequest {
    pub fn from_json(input: &str) -> Result<DestroyRequest> {
        let raw: RawDestroyRequest = parse_document(input)?;
        // An explicit empty list is a no-op, a missing list is a caller error.
        let allocation_details = match raw.allocation_details {
            None | Some(Value::Null) => {
                return Err(AllocError::InvalidInput(
                    "allocation_details is required".to_string(),
                ));
            }
            Some(value) => decode_nested("allocation_details", value)?,
        };
        Ok(DestroyRequest { allocation_details })
    }
}
