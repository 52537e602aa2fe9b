//! Allocation Repository Gateway
//!
//! Abstract trait defining the contract for the durable registry store.
//! Implementations must enforce the two active-set invariants themselves
//! (no overlapping active blocks, one active block per network) so that
//! `insert_active` is the single serialization point for allocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::allocation::{NetworkAllocation, NetworkId, PageCursor};
use crate::domain::models::cidr::CidrBlock;
use crate::shared::errors::RepositoryError;

/// Repository trait for allocation persistence operations
#[async_trait]
pub trait AllocationRepository: Send + Sync {
    /// Find the active allocation held by a network
    async fn find_active_by_network_id(
        &self,
        network_id: &NetworkId,
    ) -> Result<Option<NetworkAllocation>, RepositoryError>;

    /// Find all active allocations, sorted by block address ascending
    async fn find_all_active(&self) -> Result<Vec<NetworkAllocation>, RepositoryError>;

    /// Find up to `limit` active allocations strictly after `after`,
    /// sorted by `(allocated_at, network_id)` ascending
    async fn find_active_page(
        &self,
        after: Option<&PageCursor>,
        limit: u32,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError>;

    /// Find active allocations whose block overlaps `cidr_block`
    async fn find_active_overlapping(
        &self,
        cidr_block: &CidrBlock,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError>;

    /// Conditionally insert an active allocation
    ///
    /// Fails with `RepositoryError::Overlap` if the block overlaps an active
    /// allocation, or `RepositoryError::DuplicateNetwork` if the network
    /// already holds one. Either the row is committed or nothing is.
    async fn insert_active(&self, allocation: &NetworkAllocation) -> Result<NetworkAllocation, RepositoryError>;

    /// Atomically move a network's active allocation to RELEASED
    ///
    /// Returns `None` if the network holds no active allocation.
    async fn release(
        &self,
        network_id: &NetworkId,
        released_at: DateTime<Utc>,
    ) -> Result<Option<NetworkAllocation>, RepositoryError>;
}
