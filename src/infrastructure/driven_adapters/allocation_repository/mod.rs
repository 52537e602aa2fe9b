//! Allocation Repository Adapters
//!
//! `postgres` is the durable store; `memory` is selected explicitly for
//! local runs and tests.

mod memory;
mod postgres;

pub use memory::InMemoryAllocationRepository;
pub use postgres::PostgresAllocationRepository;
