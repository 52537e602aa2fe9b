//! Use Cases
//!
//! Application-specific business rules.
//! Each use case is a single-purpose struct with an execute() method.

pub mod allocations;

pub use allocations::{
    AllocateCidrUseCase, CheckOverlapsUseCase, CommitRetryPolicy, ListActiveAllocationsUseCase, LookupCidrUseCase,
    RegisterCidrUseCase, ReleaseCidrUseCase,
};
