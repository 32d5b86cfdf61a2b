//! Greengrocer Core - Shared cart types library.
//!
//! This crate provides the cart data model used across all Greengrocer
//! components:
//! - `cart` - Reconciliation library (store seams, session service)
//! - `storefront` - Public-facing JSON API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and quantities
//! - [`cart`] - `CartLine`, `Cart`, and the pure merge law

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::*;
pub use types::*;
