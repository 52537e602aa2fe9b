//! Lookup CIDR Use Case
//!
//! Read-only: the block a network currently holds, if any.

use std::sync::Arc;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{NetworkAllocation, NetworkId};
use crate::shared::errors::UseCaseError;

/// Use case for looking up a network's active allocation
pub struct LookupCidrUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
}

impl LookupCidrUseCase {
    /// Create a new LookupCidrUseCase
    #[must_use]
    pub fn new(allocation_repository: Arc<dyn AllocationRepository>) -> Self {
        Self { allocation_repository }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, network_id: &NetworkId) -> Result<Option<NetworkAllocation>, UseCaseError> {
        tracing::debug!(network_id = %network_id, "Looking up active allocation");

        let allocation = self
            .allocation_repository
            .find_active_by_network_id(network_id)
            .await?;

        tracing::debug!(network_id = %network_id, found = allocation.is_some(), "Lookup finished");
        Ok(allocation)
    }
}
