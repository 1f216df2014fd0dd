//! Persistence layer for the webinar backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The Postgres implementation of the domain registration store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;
