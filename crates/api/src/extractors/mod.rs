//! Request extractors.

pub mod requester;

pub use requester::Requester;
