//! Domain Layer
//!
//! Contains the core allocation logic, domain models, and gateway traits (ports).
//! This layer has no dependencies on infrastructure.

pub mod gateways;
pub mod models;

pub use gateways::allocation_repository::AllocationRepository;
pub use models::{
    AddressPool, AllocateCidrData, AllocationOutcome, AllocationStatus, CidrBlock, NetworkAllocation,
    NetworkId, OverlapReport, PageCursor, RegisterCidrData,
};
