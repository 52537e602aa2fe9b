//! Check Overlaps Use Case
//!
//! Pre-flight check for a proposed topology: which active allocations would
//! each candidate block collide with.

use std::sync::Arc;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::OverlapReport;
use crate::domain::models::cidr::CidrBlock;
use crate::shared::errors::UseCaseError;

/// Largest number of candidates accepted per call
pub const MAX_CANDIDATES: usize = 100;

/// Use case for checking candidate blocks against the registry
pub struct CheckOverlapsUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
}

impl CheckOverlapsUseCase {
    /// Create a new CheckOverlapsUseCase
    #[must_use]
    pub fn new(allocation_repository: Arc<dyn AllocationRepository>) -> Self {
        Self { allocation_repository }
    }

    /// Execute the use case
    ///
    /// All candidates are checked against one snapshot of the active set and
    /// reported in input order.
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidRequest` if there are no candidates or more than 100.
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, candidates: Vec<CidrBlock>) -> Result<Vec<OverlapReport>, UseCaseError> {
        if candidates.is_empty() || candidates.len() > MAX_CANDIDATES {
            return Err(UseCaseError::InvalidRequest(vec![format!(
                "cidrBlocks: must contain between 1 and {MAX_CANDIDATES} blocks"
            )]));
        }

        tracing::debug!(candidates = candidates.len(), "Checking blocks for overlaps");

        let active = self.allocation_repository.find_all_active().await?;

        let reports: Vec<OverlapReport> = candidates
            .into_iter()
            .map(|cidr_block| OverlapReport {
                cidr_block,
                conflicts: active
                    .iter()
                    .filter(|a| a.cidr_block().overlaps(&cidr_block))
                    .cloned()
                    .collect(),
            })
            .collect();

        let overlapping = reports.iter().filter(|r| r.has_overlap()).count();
        if overlapping > 0 {
            tracing::warn!(overlapping, "Candidate blocks overlap active allocations");
        }

        Ok(reports)
    }
}
