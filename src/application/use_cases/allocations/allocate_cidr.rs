//! Allocate CIDR Use Case
//!
//! Hands a network the lowest-addressed free block of the requested size.
//!
//! The scan runs against a snapshot of the active set, so two callers can pick
//! the same block. The store's conditional insert decides the winner; the
//! loser re-reads, re-scans and retries with exponential backoff until the
//! commit budget runs out.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{AllocateCidrData, AllocationOutcome, NetworkAllocation};
use crate::domain::models::cidr::CidrBlock;
use crate::domain::models::pool::AddressPool;
use crate::shared::errors::{RepositoryError, UseCaseError};

/// Bounded retry budget for conflicting commits
///
/// Losers of a commit race all re-scan towards the same lowest free block, so
/// each delay is spread by a random jitter factor to keep them from waking
/// together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitRetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    jitter: f64,
}

impl CommitRetryPolicy {
    /// Create a policy without jitter; at least one attempt is always made
    #[must_use]
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            jitter: 0.0,
        }
    }

    /// Set the jitter factor (0.0 to 1.0)
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Delay after the given failed attempt (1-based)
    ///
    /// Doubles each time, then scales by a random factor in
    /// `[1 - jitter, 1 + jitter)`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let base_delay = self.base_backoff.saturating_mul(1 << exponent);

        if self.jitter > 0.0 {
            let jitter_factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..self.jitter);
            base_delay.mul_f64(jitter_factor)
        } else {
            base_delay
        }
    }
}

impl Default for CommitRetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(20)).with_jitter(0.5)
    }
}

/// Use case for allocating a block from the address pool
pub struct AllocateCidrUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
    pool: Arc<AddressPool>,
    retry_policy: CommitRetryPolicy,
}

impl AllocateCidrUseCase {
    /// Create a new AllocateCidrUseCase
    #[must_use]
    pub fn new(
        allocation_repository: Arc<dyn AllocationRepository>,
        pool: Arc<AddressPool>,
        retry_policy: CommitRetryPolicy,
    ) -> Self {
        Self {
            allocation_repository,
            pool,
            retry_policy,
        }
    }

    /// Execute the use case
    ///
    /// Returns the existing allocation unchanged if the network already holds
    /// one (whatever its size).
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::Domain` if the prefix length is outside the pool bounds.
    /// Returns `UseCaseError::PoolExhausted` if no free block of that size exists.
    /// Returns `UseCaseError::ConcurrencyConflict` if every commit attempt lost a race.
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, data: AllocateCidrData) -> Result<AllocationOutcome, UseCaseError> {
        tracing::info!(
            network_id = %data.network_id,
            prefix_len = data.prefix_len,
            "Allocating CIDR block"
        );

        self.pool.validate_prefix_len(data.prefix_len)?;

        let max_attempts = self.retry_policy.max_attempts();
        for attempt in 1..=max_attempts {
            if let Some(existing) = self
                .allocation_repository
                .find_active_by_network_id(&data.network_id)
                .await?
            {
                tracing::debug!(
                    network_id = %data.network_id,
                    cidr_block = %existing.cidr_block(),
                    "Network already holds a block"
                );
                return Ok(AllocationOutcome::existing(existing));
            }

            let taken: Vec<CidrBlock> = self
                .allocation_repository
                .find_all_active()
                .await?
                .iter()
                .map(NetworkAllocation::cidr_block)
                .collect();

            let Some(block) = self.pool.find_free_block(data.prefix_len, &taken) else {
                tracing::warn!(
                    network_id = %data.network_id,
                    prefix_len = data.prefix_len,
                    active = taken.len(),
                    "Address pool exhausted"
                );
                return Err(UseCaseError::PoolExhausted {
                    prefix_len: data.prefix_len,
                });
            };

            let candidate = NetworkAllocation::new(data.network_id.clone(), block, data.name.clone());
            match self.allocation_repository.insert_active(&candidate).await {
                Ok(created) => {
                    tracing::info!(
                        network_id = %created.network_id(),
                        cidr_block = %created.cidr_block(),
                        attempt,
                        "CIDR block allocated"
                    );
                    return Ok(AllocationOutcome::created(created));
                }
                Err(RepositoryError::Overlap(detail)) => {
                    tracing::warn!(
                        network_id = %data.network_id,
                        cidr_block = %block,
                        attempt,
                        detail = %detail,
                        "Commit conflict, rescanning"
                    );
                }
                Err(RepositoryError::DuplicateNetwork(_)) => {
                    // A concurrent caller allocated for the same network; hand back its block.
                    if let Some(existing) = self
                        .allocation_repository
                        .find_active_by_network_id(&data.network_id)
                        .await?
                    {
                        return Ok(AllocationOutcome::existing(existing));
                    }
                    tracing::warn!(network_id = %data.network_id, attempt, "Concurrent allocation vanished, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry_policy.backoff(attempt)).await;
            }
        }

        tracing::warn!(
            network_id = %data.network_id,
            attempts = max_attempts,
            "Commit retry budget exhausted"
        );
        Err(UseCaseError::ConcurrencyConflict {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::allocation::{NetworkId, PageCursor};
    use crate::infrastructure::driven_adapters::allocation_repository::InMemoryAllocationRepository;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pool(range: &str) -> Arc<AddressPool> {
        Arc::new(AddressPool::new(vec![range.parse().unwrap()], 16, 28).unwrap())
    }

    fn request(network_id: &str, prefix_len: u8) -> AllocateCidrData {
        AllocateCidrData {
            network_id: NetworkId::try_from(network_id).unwrap(),
            prefix_len,
            name: None,
        }
    }

    fn use_case(repo: Arc<dyn AllocationRepository>, range: &str) -> AllocateCidrUseCase {
        AllocateCidrUseCase::new(repo, pool(range), CommitRetryPolicy::new(3, Duration::ZERO))
    }

    /// Store whose conditional insert always loses, counting attempts
    struct AlwaysConflictingRepository {
        inserts: AtomicU32,
    }

    #[async_trait]
    impl AllocationRepository for AlwaysConflictingRepository {
        async fn find_active_by_network_id(
            &self,
            _network_id: &NetworkId,
        ) -> Result<Option<NetworkAllocation>, RepositoryError> {
            Ok(None)
        }

        async fn find_all_active(&self) -> Result<Vec<NetworkAllocation>, RepositoryError> {
            Ok(vec![])
        }

        async fn find_active_page(
            &self,
            _after: Option<&PageCursor>,
            _limit: u32,
        ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
            Ok(vec![])
        }

        async fn find_active_overlapping(
            &self,
            _cidr_block: &CidrBlock,
        ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
            Ok(vec![])
        }

        async fn insert_active(&self, allocation: &NetworkAllocation) -> Result<NetworkAllocation, RepositoryError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Overlap(allocation.cidr_block().to_string()))
        }

        async fn release(
            &self,
            _network_id: &NetworkId,
            _released_at: DateTime<Utc>,
        ) -> Result<Option<NetworkAllocation>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn should_allocate_lowest_block_in_sequence() {
        let use_case = use_case(Arc::new(InMemoryAllocationRepository::new()), "10.0.0.0/8");

        let a = use_case.execute(request("net-a", 16)).await.unwrap();
        let b = use_case.execute(request("net-b", 16)).await.unwrap();

        assert!(a.created);
        assert_eq!(a.allocation.cidr_block().to_string(), "10.0.0.0/16");
        assert_eq!(b.allocation.cidr_block().to_string(), "10.1.0.0/16");
    }

    #[tokio::test]
    async fn should_return_existing_block_for_same_network() {
        let use_case = use_case(Arc::new(InMemoryAllocationRepository::new()), "10.0.0.0/8");

        let first = use_case.execute(request("net-a", 16)).await.unwrap();
        let second = use_case.execute(request("net-a", 24)).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.allocation, first.allocation);
    }

    #[tokio::test]
    async fn should_reject_prefix_outside_pool_bounds() {
        let use_case = use_case(Arc::new(InMemoryAllocationRepository::new()), "10.0.0.0/8");

        let result = use_case.execute(request("net-a", 8)).await;

        assert!(matches!(result.unwrap_err(), UseCaseError::Domain(_)));
    }

    #[tokio::test]
    async fn should_return_pool_exhausted_when_full() {
        let use_case = use_case(Arc::new(InMemoryAllocationRepository::new()), "10.0.0.0/15");

        use_case.execute(request("net-a", 16)).await.unwrap();
        use_case.execute(request("net-b", 16)).await.unwrap();
        let result = use_case.execute(request("net-c", 16)).await;

        assert!(matches!(
            result.unwrap_err(),
            UseCaseError::PoolExhausted { prefix_len: 16 }
        ));
    }

    #[tokio::test]
    async fn should_give_up_after_retry_budget() {
        let repo = Arc::new(AlwaysConflictingRepository {
            inserts: AtomicU32::new(0),
        });
        let use_case = use_case(repo.clone(), "10.0.0.0/8");

        let result = use_case.execute(request("net-a", 16)).await;

        assert!(matches!(
            result.unwrap_err(),
            UseCaseError::ConcurrencyConflict { attempts: 3 }
        ));
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = CommitRetryPolicy::new(5, Duration::from_millis(10));
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(4), Duration::from_millis(80));
        assert_eq!(CommitRetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn jittered_backoff_stays_within_factor() {
        let policy = CommitRetryPolicy::new(5, Duration::from_millis(100)).with_jitter(0.5);

        let delays: Vec<Duration> = (0..64).map(|_| policy.backoff(2)).collect();

        for delay in &delays {
            assert!(*delay >= Duration::from_millis(100), "{delay:?} below range");
            assert!(*delay < Duration::from_millis(300), "{delay:?} above range");
        }
        let distinct: HashSet<Duration> = delays.into_iter().collect();
        assert!(distinct.len() > 1, "jitter produced a single fixed delay");
    }

    #[test]
    fn jitter_factor_is_clamped() {
        let clamped = |jitter: f64| CommitRetryPolicy::new(5, Duration::ZERO).with_jitter(jitter).jitter();

        assert!((clamped(3.0) - 1.0).abs() < f64::EPSILON);
        assert!(clamped(-1.0).abs() < f64::EPSILON);
        assert!(clamped(f64::NAN).abs() < f64::EPSILON);
        assert!((CommitRetryPolicy::default().jitter() - 0.5).abs() < f64::EPSILON);
    }
}
