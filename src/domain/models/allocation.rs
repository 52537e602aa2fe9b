//! Network Allocation Domain Model
//!
//! Represents the CIDR block held by a logical network in the registry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::cidr::CidrBlock;
use crate::shared::errors::DomainError;

lazy_static! {
    /// Logical names (`net-a`) and cloud ids (`vpc-0a1b2c3d`) alike
    static ref NETWORK_ID_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:-]{0,127}$").expect("valid regex");
}

/// Newtype wrapper for the caller-chosen network identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(String);

impl NetworkId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for NetworkId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl TryFrom<String> for NetworkId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if NETWORK_ID_REGEX.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidNetworkId(value))
        }
    }
}

/// Lifecycle state of an allocation record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStatus {
    Active,
    Released,
}

impl AllocationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Released => "RELEASED",
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "RELEASED" => Ok(Self::Released),
            other => Err(DomainError::InvalidState(format!("unknown status '{other}'"))),
        }
    }
}

/// Data required to allocate a block from the pool
#[derive(Debug, Clone)]
pub struct AllocateCidrData {
    pub network_id: NetworkId,
    pub prefix_len: u8,
    pub name: Option<String>,
}

/// Data required to record a block that already exists outside the registry
#[derive(Debug, Clone)]
pub struct RegisterCidrData {
    pub network_id: NetworkId,
    pub cidr_block: CidrBlock,
    pub name: Option<String>,
}

/// Result of an allocate or register call
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub allocation: NetworkAllocation,
    /// False when the network already held this block
    pub created: bool,
}

impl AllocationOutcome {
    #[must_use]
    pub fn created(allocation: NetworkAllocation) -> Self {
        Self { allocation, created: true }
    }

    #[must_use]
    pub fn existing(allocation: NetworkAllocation) -> Self {
        Self { allocation, created: false }
    }
}

/// A candidate block and the active allocations it collides with
#[derive(Debug, Clone)]
pub struct OverlapReport {
    pub cidr_block: CidrBlock,
    pub conflicts: Vec<NetworkAllocation>,
}

impl OverlapReport {
    #[must_use]
    pub fn has_overlap(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// CIDR block held (or once held) by a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAllocation {
    id: Uuid,
    network_id: NetworkId,
    cidr_block: CidrBlock,
    name: Option<String>,
    status: AllocationStatus,
    allocated_at: DateTime<Utc>,
    released_at: Option<DateTime<Utc>>,
}

impl NetworkAllocation {
    /// Create a new active allocation stamped with the current time
    #[must_use]
    pub fn new(network_id: NetworkId, cidr_block: CidrBlock, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            network_id,
            cidr_block,
            name,
            status: AllocationStatus::Active,
            allocated_at: now(),
            released_at: None,
        }
    }

    /// Restore an allocation from persisted data
    #[must_use]
    pub fn restore(
        id: Uuid,
        network_id: NetworkId,
        cidr_block: CidrBlock,
        name: Option<String>,
        status: AllocationStatus,
        allocated_at: DateTime<Utc>,
        released_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            network_id,
            cidr_block,
            name,
            status,
            allocated_at,
            released_at,
        }
    }

    /// Mark the allocation released, returning a new instance
    #[must_use]
    pub fn release(self, released_at: DateTime<Utc>) -> Self {
        Self {
            status: AllocationStatus::Released,
            released_at: Some(released_at),
            ..self
        }
    }

    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    #[must_use]
    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    #[must_use]
    pub fn cidr_block(&self) -> CidrBlock {
        self.cidr_block
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> AllocationStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AllocationStatus::Active
    }

    #[must_use]
    pub fn allocated_at(&self) -> DateTime<Utc> {
        self.allocated_at
    }

    #[must_use]
    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }
}

/// Current time at the precision the store keeps (microseconds)
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Keyset position in the `(allocated_at, network_id)` ordering of active allocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    allocated_at: DateTime<Utc>,
    network_id: NetworkId,
}

impl PageCursor {
    const SEPARATOR: char = '~';

    #[must_use]
    pub fn new(allocated_at: DateTime<Utc>, network_id: NetworkId) -> Self {
        Self { allocated_at, network_id }
    }

    #[must_use]
    pub fn allocated_at(&self) -> DateTime<Utc> {
        self.allocated_at
    }

    #[must_use]
    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    /// Opaque, URL-safe text form
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.allocated_at.timestamp_micros(),
            Self::SEPARATOR,
            self.network_id
        )
    }

    /// Parse the text form produced by [`PageCursor::encode`]
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCursor` if the text is malformed.
    pub fn decode(value: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidCursor(value.to_string());

        let (micros, network_id) = value.split_once(Self::SEPARATOR).ok_or_else(invalid)?;
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let allocated_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;
        let network_id = NetworkId::try_from(network_id).map_err(|_| invalid())?;

        Ok(Self { allocated_at, network_id })
    }
}

impl From<&NetworkAllocation> for PageCursor {
    fn from(allocation: &NetworkAllocation) -> Self {
        Self::new(allocation.allocated_at(), allocation.network_id().clone())
    }
}
