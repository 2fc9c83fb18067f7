//! Brightkit Core - Shared types library.
//!
//! This crate provides common types used across all Brightkit components:
//! - `api` - The JSON backend binary
//! - `integration-tests` - End-to-end test harness
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, plus role and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
