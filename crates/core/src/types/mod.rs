//! Core types for Copperleaf.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod session;
pub mod status;

pub use address::{AddressError, ShippingAddress};
pub use id::*;
pub use session::Session;
pub use status::*;
