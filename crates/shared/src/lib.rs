//! Shared utilities for the webinar backend.
//!
//! This crate provides common functionality used across the other crates:
//! - Webhook signature signing and verification (HMAC-SHA256)
//! - Offset pagination helpers for list endpoints

pub mod crypto;
pub mod pagination;
