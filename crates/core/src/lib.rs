//! Pantry Core - Shared types library.
//!
//! This crate provides common types used across all Pantry components:
//! - `client` - API client SDK (session, cart, catalog)
//! - `cli` - Command-line storefront driving the SDK
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere, including the mock
//! backend used by the integration tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
