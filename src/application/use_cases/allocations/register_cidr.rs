//! Register CIDR Use Case
//!
//! Records a block that a network already uses (for example a VPC created
//! before the registry existed) so that later allocations steer around it.
//! The block does not have to lie inside the address pool.

use std::sync::Arc;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{AllocationOutcome, NetworkAllocation, RegisterCidrData};
use crate::shared::errors::{RepositoryError, UseCaseError};

/// Use case for registering an externally chosen block
pub struct RegisterCidrUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
}

impl RegisterCidrUseCase {
    /// Create a new RegisterCidrUseCase
    #[must_use]
    pub fn new(allocation_repository: Arc<dyn AllocationRepository>) -> Self {
        Self { allocation_repository }
    }

    /// Execute the use case
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Conflict` if the network already holds a different block.
    /// Returns `UseCaseError::Overlap` if another network's active block overlaps.
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, data: RegisterCidrData) -> Result<AllocationOutcome, UseCaseError> {
        tracing::info!(
            network_id = %data.network_id,
            cidr_block = %data.cidr_block,
            "Registering existing CIDR block"
        );

        if let Some(existing) = self.find_existing(&data).await? {
            return Ok(existing);
        }

        let candidate = NetworkAllocation::new(data.network_id.clone(), data.cidr_block, data.name.clone());
        match self.allocation_repository.insert_active(&candidate).await {
            Ok(created) => {
                tracing::info!(
                    network_id = %created.network_id(),
                    cidr_block = %created.cidr_block(),
                    "CIDR block registered"
                );
                Ok(AllocationOutcome::created(created))
            }
            Err(RepositoryError::Overlap(_)) => {
                let overlapping = self
                    .allocation_repository
                    .find_active_overlapping(&data.cidr_block)
                    .await?;
                let existing = overlapping
                    .iter()
                    .map(|a| format!("{} held by '{}'", a.cidr_block(), a.network_id()))
                    .collect::<Vec<_>>()
                    .join(", ");

                tracing::warn!(
                    network_id = %data.network_id,
                    cidr_block = %data.cidr_block,
                    overlaps = %existing,
                    "Refusing to register overlapping block"
                );
                Err(UseCaseError::Overlap {
                    cidr_block: data.cidr_block.to_string(),
                    existing: if existing.is_empty() {
                        "an active allocation".to_string()
                    } else {
                        existing
                    },
                })
            }
            Err(RepositoryError::DuplicateNetwork(_)) => self
                .find_existing(&data)
                .await?
                .ok_or_else(|| UseCaseError::Conflict(format!("Network '{}' changed concurrently", data.network_id))),
            Err(e) => Err(e.into()),
        }
    }

    /// The network's current allocation if it matches the request
    async fn find_existing(&self, data: &RegisterCidrData) -> Result<Option<AllocationOutcome>, UseCaseError> {
        let Some(existing) = self
            .allocation_repository
            .find_active_by_network_id(&data.network_id)
            .await?
        else {
            return Ok(None);
        };

        if existing.cidr_block() == data.cidr_block {
            tracing::debug!(network_id = %data.network_id, "Block already registered");
            return Ok(Some(AllocationOutcome::existing(existing)));
        }

        tracing::warn!(
            network_id = %data.network_id,
            held = %existing.cidr_block(),
            requested = %data.cidr_block,
            "Network already holds a different block"
        );
        Err(UseCaseError::Conflict(format!(
            "Network '{}' already holds {}",
            data.network_id,
            existing.cidr_block()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::allocation::NetworkId;
    use crate::infrastructure::driven_adapters::allocation_repository::InMemoryAllocationRepository;

    fn request(network_id: &str, cidr_block: &str) -> RegisterCidrData {
        RegisterCidrData {
            network_id: NetworkId::try_from(network_id).unwrap(),
            cidr_block: cidr_block.parse().unwrap(),
            name: Some("ExtraVpc-2".to_string()),
        }
    }

    #[tokio::test]
    async fn should_register_block_outside_any_pool() {
        let use_case = RegisterCidrUseCase::new(Arc::new(InMemoryAllocationRepository::new()));

        let outcome = use_case.execute(request("vpc-0a1b", "192.168.0.0/16")).await.unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.allocation.cidr_block().to_string(), "192.168.0.0/16");
        assert_eq!(outcome.allocation.name(), Some("ExtraVpc-2"));
    }

    #[tokio::test]
    async fn should_be_idempotent_for_same_block() {
        let use_case = RegisterCidrUseCase::new(Arc::new(InMemoryAllocationRepository::new()));

        let first = use_case.execute(request("vpc-0a1b", "10.2.0.0/16")).await.unwrap();
        let second = use_case.execute(request("vpc-0a1b", "10.2.0.0/16")).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.allocation.id(), first.allocation.id());
    }

    #[tokio::test]
    async fn should_conflict_when_network_holds_other_block() {
        let use_case = RegisterCidrUseCase::new(Arc::new(InMemoryAllocationRepository::new()));

        use_case.execute(request("vpc-0a1b", "10.2.0.0/16")).await.unwrap();
        let result = use_case.execute(request("vpc-0a1b", "10.3.0.0/16")).await;

        assert!(matches!(result.unwrap_err(), UseCaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn should_report_overlapping_holder() {
        let use_case = RegisterCidrUseCase::new(Arc::new(InMemoryAllocationRepository::new()));

        use_case.execute(request("vpc-main", "10.2.0.0/16")).await.unwrap();
        let result = use_case.execute(request("vpc-extra", "10.2.128.0/24")).await;

        match result.unwrap_err() {
            UseCaseError::Overlap { cidr_block, existing } => {
                assert_eq!(cidr_block, "10.2.128.0/24");
                assert!(existing.contains("vpc-main"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
