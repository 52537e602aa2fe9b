//! List Active Allocations Use Case
//!
//! Active allocations ordered by `allocated_at` ascending, either one page
//! at a time or through a lazy cursor that walks every page.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{NetworkAllocation, PageCursor};
use crate::shared::errors::UseCaseError;

/// Default number of allocations per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 1000;

/// One page of active allocations
#[derive(Debug, Clone)]
pub struct ActivePage {
    pub items: Vec<NetworkAllocation>,
    /// Position to resume from; `None` once the listing is complete
    pub next_cursor: Option<PageCursor>,
}

/// Use case for listing active allocations
pub struct ListActiveAllocationsUseCase {
    allocation_repository: Arc<dyn AllocationRepository>,
}

impl ListActiveAllocationsUseCase {
    /// Create a new ListActiveAllocationsUseCase
    #[must_use]
    pub fn new(allocation_repository: Arc<dyn AllocationRepository>) -> Self {
        Self { allocation_repository }
    }

    /// Fetch the page after `after`
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::InvalidRequest` if `limit` is not between 1 and 1000.
    /// Returns `UseCaseError::StoreUnavailable` if the store fails.
    pub async fn execute(&self, after: Option<PageCursor>, limit: u32) -> Result<ActivePage, UseCaseError> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(UseCaseError::InvalidRequest(vec![format!(
                "limit: must be between 1 and {MAX_PAGE_SIZE}"
            )]));
        }

        tracing::debug!(after = ?after.as_ref().map(PageCursor::encode), limit, "Listing active allocations");

        let items = self
            .allocation_repository
            .find_active_page(after.as_ref(), limit)
            .await?;

        let next_cursor = if items.len() == limit as usize {
            items.last().map(PageCursor::from)
        } else {
            None
        };

        tracing::debug!(count = items.len(), "Found active allocations");
        Ok(ActivePage { items, next_cursor })
    }

    /// Start a lazy walk over every active allocation
    ///
    /// Nothing is fetched until the first call to
    /// [`ActiveAllocationCursor::next`]. Calling this again restarts from the
    /// beginning.
    #[must_use]
    pub fn cursor(&self, page_size: u32) -> ActiveAllocationCursor {
        ActiveAllocationCursor {
            allocation_repository: Arc::clone(&self.allocation_repository),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// Lazy, finite sequence of active allocations
pub struct ActiveAllocationCursor {
    allocation_repository: Arc<dyn AllocationRepository>,
    page_size: u32,
    after: Option<PageCursor>,
    buffer: VecDeque<NetworkAllocation>,
    exhausted: bool,
}

impl ActiveAllocationCursor {
    /// Next allocation, fetching another page when the buffer runs dry
    ///
    /// # Errors
    ///
    /// Returns `UseCaseError::StoreUnavailable` if the store fails; the cursor
    /// keeps its position and the call may be repeated.
    pub async fn next(&mut self) -> Result<Option<NetworkAllocation>, UseCaseError> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .allocation_repository
                .find_active_page(self.after.as_ref(), self.page_size)
                .await?;

            if page.len() < self.page_size as usize {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.after = Some(PageCursor::from(last));
            }
            self.buffer.extend(page);
        }

        Ok(self.buffer.pop_front())
    }

    /// Drain the cursor into a vector
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn collect_all(mut self) -> Result<Vec<NetworkAllocation>, UseCaseError> {
        let mut all = Vec::new();
        while let Some(allocation) = self.next().await? {
            all.push(allocation);
        }
        Ok(all)
    }
}
