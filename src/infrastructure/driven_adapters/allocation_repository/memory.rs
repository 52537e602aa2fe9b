//! In-Memory Allocation Repository
//!
//! Process-local store for local runs and tests. It enforces the same
//! active-set rules as the Postgres table: the overlap and duplicate checks
//! and the insert happen under one lock.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{NetworkAllocation, NetworkId, PageCursor};
use crate::domain::models::cidr::CidrBlock;
use crate::shared::errors::RepositoryError;

/// In-memory implementation of AllocationRepository
///
/// Keeps every record, released ones included, like the durable table.
#[derive(Debug, Default)]
pub struct InMemoryAllocationRepository {
    records: Mutex<Vec<NetworkAllocation>>,
}

impl InMemoryAllocationRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<NetworkAllocation>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn active_matching<F>(&self, predicate: F) -> Result<Vec<NetworkAllocation>, RepositoryError>
    where
        F: Fn(&NetworkAllocation) -> bool,
    {
        let mut active: Vec<NetworkAllocation> = self
            .records()?
            .iter()
            .filter(|a| a.is_active() && predicate(a))
            .cloned()
            .collect();
        active.sort_by_key(|a| a.cidr_block().start());
        Ok(active)
    }
}

#[async_trait]
impl AllocationRepository for InMemoryAllocationRepository {
    async fn find_active_by_network_id(
        &self,
        network_id: &NetworkId,
    ) -> Result<Option<NetworkAllocation>, RepositoryError> {
        Ok(self
            .records()?
            .iter()
            .find(|a| a.is_active() && a.network_id() == network_id)
            .cloned())
    }

    async fn find_all_active(&self) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        self.active_matching(|_| true)
    }

    async fn find_active_page(
        &self,
        after: Option<&PageCursor>,
        limit: u32,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        let key = |a: &NetworkAllocation| (a.allocated_at(), a.network_id().clone());

        let mut active: Vec<NetworkAllocation> = self
            .records()?
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| match after {
                Some(cursor) => key(*a) > (cursor.allocated_at(), cursor.network_id().clone()),
                None => true,
            })
            .cloned()
            .collect();

        active.sort_by_key(key);
        active.truncate(limit as usize);
        Ok(active)
    }

    async fn find_active_overlapping(
        &self,
        cidr_block: &CidrBlock,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        self.active_matching(|a| a.cidr_block().overlaps(cidr_block))
    }

    async fn insert_active(&self, allocation: &NetworkAllocation) -> Result<NetworkAllocation, RepositoryError> {
        let mut records = self.records()?;

        for existing in records.iter().filter(|a| a.is_active()) {
            if existing.network_id() == allocation.network_id() {
                return Err(RepositoryError::DuplicateNetwork(allocation.network_id().to_string()));
            }
            if existing.cidr_block().overlaps(&allocation.cidr_block()) {
                return Err(RepositoryError::Overlap(allocation.cidr_block().to_string()));
            }
        }

        records.push(allocation.clone());
        Ok(allocation.clone())
    }

    async fn release(
        &self,
        network_id: &NetworkId,
        released_at: DateTime<Utc>,
    ) -> Result<Option<NetworkAllocation>, RepositoryError> {
        let mut records = self.records()?;

        let Some(slot) = records
            .iter_mut()
            .find(|a| a.is_active() && a.network_id() == network_id)
        else {
            return Ok(None);
        };

        *slot = slot.clone().release(released_at);
        Ok(Some(slot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::allocation::{self, AllocationStatus};
    use uuid::Uuid;

    fn record(network_id: &str, cidr_block: &str) -> NetworkAllocation {
        NetworkAllocation::new(
            NetworkId::try_from(network_id).unwrap(),
            cidr_block.parse().unwrap(),
            None,
        )
    }

    #[tokio::test]
    async fn should_reject_overlapping_insert() {
        let repo = InMemoryAllocationRepository::new();
        repo.insert_active(&record("net-a", "10.0.0.0/16")).await.unwrap();

        let result = repo.insert_active(&record("net-b", "10.0.128.0/17")).await;

        assert!(matches!(result, Err(RepositoryError::Overlap(_))));
    }

    #[tokio::test]
    async fn should_reject_second_active_block_for_network() {
        let repo = InMemoryAllocationRepository::new();
        repo.insert_active(&record("net-a", "10.0.0.0/16")).await.unwrap();

        let result = repo.insert_active(&record("net-a", "10.1.0.0/16")).await;

        assert!(matches!(result, Err(RepositoryError::DuplicateNetwork(_))));
    }

    #[tokio::test]
    async fn released_block_can_be_taken_again() {
        let repo = InMemoryAllocationRepository::new();
        repo.insert_active(&record("net-a", "10.0.0.0/16")).await.unwrap();

        let released = repo
            .release(&NetworkId::try_from("net-a").unwrap(), allocation::now())
            .await
            .unwrap()
            .unwrap();
        assert!(!released.is_active());

        repo.insert_active(&record("net-b", "10.0.0.0/16")).await.unwrap();
        assert_eq!(repo.find_all_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn release_of_unknown_network_returns_none() {
        let repo = InMemoryAllocationRepository::new();

        let result = repo
            .release(&NetworkId::try_from("net-x").unwrap(), allocation::now())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn find_all_active_is_sorted_by_address() {
        let repo = InMemoryAllocationRepository::new();
        repo.insert_active(&record("net-b", "10.2.0.0/16")).await.unwrap();
        repo.insert_active(&record("net-a", "10.1.0.0/16")).await.unwrap();

        let active = repo.find_all_active().await.unwrap();

        assert_eq!(active[0].network_id().as_str(), "net-a");
        assert_eq!(active[1].network_id().as_str(), "net-b");
    }

    #[tokio::test]
    async fn page_ties_are_ordered_by_network_id_bytes() {
        let repo = InMemoryAllocationRepository::new();
        let allocated_at = allocation::now();
        for (network_id, cidr_block) in [("net-a", "10.0.0.0/16"), ("net-Z", "10.1.0.0/16"), ("net-B", "10.2.0.0/16")] {
            let record = NetworkAllocation::restore(
                Uuid::new_v4(),
                NetworkId::try_from(network_id).unwrap(),
                cidr_block.parse().unwrap(),
                None,
                AllocationStatus::Active,
                allocated_at,
                None,
            );
            repo.insert_active(&record).await.unwrap();
        }

        let first = repo.find_active_page(None, 1).await.unwrap();
        assert_eq!(first[0].network_id().as_str(), "net-B");

        let rest = repo
            .find_active_page(Some(&PageCursor::from(&first[0])), 10)
            .await
            .unwrap();
        let ids: Vec<&str> = rest.iter().map(|a| a.network_id().as_str()).collect();
        assert_eq!(ids, vec!["net-Z", "net-a"]);
    }
}
