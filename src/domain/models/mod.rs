//! Domain Models
//!
//! Pure domain entities and value objects representing registry concepts.

pub mod allocation;
pub mod cidr;
pub mod pool;

pub use allocation::{
    AllocateCidrData, AllocationOutcome, AllocationStatus, NetworkAllocation, NetworkId, OverlapReport,
    PageCursor, RegisterCidrData,
};
pub use cidr::CidrBlock;
pub use pool::AddressPool;
