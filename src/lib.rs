//! VPC CIDR Registry API
//!
//! A Rust-based microservice that hands out non-overlapping IPv4 CIDR blocks
//! to logical networks, following Clean/Hexagonal Architecture principles.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
