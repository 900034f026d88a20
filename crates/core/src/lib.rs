//! Paper Crane Core - Shared types library.
//!
//! This crate provides common types used across all Paper Crane Toys
//! components:
//! - `storefront` - Headless storefront core (cart, checkout, pagination)
//! - `integration-tests` - Workspace integration tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
