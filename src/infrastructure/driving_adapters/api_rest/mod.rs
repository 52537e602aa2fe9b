//! REST API Module
//!
//! Contains HTTP handlers, DTOs, and middleware for the REST API.

pub mod dto;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use crate::application::use_cases::allocations::{
    AllocateCidrUseCase, CheckOverlapsUseCase, ListActiveAllocationsUseCase, LookupCidrUseCase, RegisterCidrUseCase,
    ReleaseCidrUseCase,
};
use crate::domain::gateways::AllocationRepository;
use crate::infrastructure::driven_adapters::config::AppConfig;
use crate::shared::errors::DomainError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub allocate_cidr_use_case: Arc<AllocateCidrUseCase>,
    pub register_cidr_use_case: Arc<RegisterCidrUseCase>,
    pub release_cidr_use_case: Arc<ReleaseCidrUseCase>,
    pub lookup_cidr_use_case: Arc<LookupCidrUseCase>,
    pub list_active_allocations_use_case: Arc<ListActiveAllocationsUseCase>,
    pub check_overlaps_use_case: Arc<CheckOverlapsUseCase>,
}

impl AppState {
    /// Wire every use case over one repository
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the configured address pool is invalid.
    pub fn new(config: Arc<AppConfig>, allocation_repository: Arc<dyn AllocationRepository>) -> Result<Self, DomainError> {
        let pool = Arc::new(config.pool.to_address_pool()?);
        let retry_policy = config.registry.to_retry_policy();

        tracing::info!(
            ranges = ?pool.ranges().iter().map(ToString::to_string).collect::<Vec<_>>(),
            min_prefix_len = pool.min_prefix_len(),
            max_prefix_len = pool.max_prefix_len(),
            max_commit_attempts = retry_policy.max_attempts(),
            retry_jitter = retry_policy.jitter(),
            "Address pool configured"
        );

        Ok(Self {
            allocate_cidr_use_case: Arc::new(AllocateCidrUseCase::new(
                Arc::clone(&allocation_repository),
                pool,
                retry_policy,
            )),
            register_cidr_use_case: Arc::new(RegisterCidrUseCase::new(Arc::clone(&allocation_repository))),
            release_cidr_use_case: Arc::new(ReleaseCidrUseCase::new(Arc::clone(&allocation_repository))),
            lookup_cidr_use_case: Arc::new(LookupCidrUseCase::new(Arc::clone(&allocation_repository))),
            list_active_allocations_use_case: Arc::new(ListActiveAllocationsUseCase::new(Arc::clone(
                &allocation_repository,
            ))),
            check_overlaps_use_case: Arc::new(CheckOverlapsUseCase::new(allocation_repository)),
            config,
        })
    }
}
