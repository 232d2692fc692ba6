//! Velora Core - Shared types library.
//!
//! This crate provides common types used across all Velora components:
//! - `storefront` - Public-facing buyer API
//! - `admin` - Internal back-office API
//! - `backend` - Client for the managed table-store collaborator
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
