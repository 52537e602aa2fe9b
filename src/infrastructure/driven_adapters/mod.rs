//! Driven Adapters
//!
//! Implementations of gateway traits for external systems:
//! - Allocation repositories (Postgres, in-memory)
//! - Configuration
//! - Database connection pool

pub mod allocation_repository;
pub mod config;
pub mod database;

pub use allocation_repository::{InMemoryAllocationRepository, PostgresAllocationRepository};
pub use config::AppConfig;
