//! Release CIDR Use Case
//!
//! Marks a network's active allocation RELEASED so its block can be reused.
//! The record itself is kept as audit trail.

use std::sync::Arc;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{self, NetworkAllocation, NetworkId};
use crate::shared::errors::UseCaseError;

/// Use case for releasing a network's block
pub struct ReleaseCidrUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
}

impl ReleaseCidrUseCase {
    /// Create a new ReleaseCidrUseCase
    #[must_use]
    pub fn new(allocation_repository: Arc<dyn AllocationRepository>) -> Self {
        Self { allocation_repository }
    }

    /// Execute the use case
    ///
    /// Releasing twice is safe: the second call changes nothing and reports
    /// `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::NotFound` if the network holds no active allocation.
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, network_id: &NetworkId) -> Result<NetworkAllocation, UseCaseError> {
        tracing::info!(network_id = %network_id, "Releasing CIDR block");

        let released = self
            .allocation_repository
            .release(network_id, allocation::now())
            .await?
            .ok_or_else(|| {
                tracing::warn!(network_id = %network_id, "No active allocation to release");
                UseCaseError::NotFound {
                    resource: "Allocation".to_string(),
                    id: network_id.to_string(),
                }
            })?;

        tracing::info!(
            network_id = %network_id,
            cidr_block = %released.cidr_block(),
            "CIDR block released"
        );
        Ok(released)
    }
}
