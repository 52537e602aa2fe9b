//! Application Layer
//!
//! Contains the registry use cases.
//! Use cases depend on the allocation repository gateway, not on a concrete store.

pub mod use_cases;
