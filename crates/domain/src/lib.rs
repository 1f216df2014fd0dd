//! Domain layer for the webinar backend.
//!
//! This crate contains:
//! - Domain models (User, Webinar, Registration, Payment)
//! - Request/response DTOs with validation
//! - Service traits at the seams (store, payment gateway, meeting provider, mailer)

pub mod models;
pub mod services;
