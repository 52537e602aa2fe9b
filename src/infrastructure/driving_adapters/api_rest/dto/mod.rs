//! Data Transfer Objects
//!
//! Request and response DTOs for the REST API.

pub mod allocation;

pub use allocation::{
    AllocateCidrDto, AllocationPageDto, AllocationResponseDto, CheckOverlapsDto, ListAllocationsQuery,
    OverlapReportDto, RegisterCidrDto,
};
