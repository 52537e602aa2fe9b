//! Allocation Use Cases
//!
//! Business logic for handing out, recording, releasing and inspecting
//! network CIDR blocks.

mod allocate_cidr;
mod check_overlaps;
mod list_active_allocations;
mod lookup_cidr;
mod register_cidr;
mod release_cidr;

pub use allocate_cidr::{AllocateCidrUseCase, CommitRetryPolicy};
pub use check_overlaps::{CheckOverlapsUseCase, MAX_CANDIDATES};
pub use list_active_allocations::{
    ActiveAllocationCursor, ActivePage, ListActiveAllocationsUseCase, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use lookup_cidr::LookupCidrUseCase;
pub use register_cidr::RegisterCidrUseCase;
pub use release_cidr::ReleaseCidrUseCase;
