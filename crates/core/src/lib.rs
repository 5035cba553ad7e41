//! Trove Core - Shared types library.
//!
//! This crate provides common types used across the Trove components:
//! - `storefront` - Server-rendered marketplace client
//! - `integration-tests` - Router-level and live-API tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The
//! marketplace API is the source of truth for every entity; these types
//! exist so the rest of the workspace can refer to ids and categories
//! without mixing them up.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
