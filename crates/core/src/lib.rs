//! Copperleaf Core - Shared types and pricing engine.
//!
//! This crate provides the types and pure logic shared across all
//! Copperleaf components:
//! - `storefront` - Client library for the order backend and payment processor
//! - `integration-tests` - End-to-end checkout tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, and it is what makes the pricing engine trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, addresses,
//!   statuses, and session credentials
//! - [`pricing`] - The pure checkout pricing engine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use types::*;
