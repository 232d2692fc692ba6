//! Velora Backend - client for the managed table-store collaborator.
//!
//! All persistence, authentication, and row-level authorization live in an
//! external managed backend, consumed here as a request/response
//! table-oriented REST store plus a token-based auth endpoint. This crate
//! owns the wire contract with that collaborator:
//!
//! - Typed row models for accounts, preferences, products, cart lines,
//!   orders, and order lines
//! - Equality/pattern filters and `select=*,related(*)` join-style reads
//! - Insert/update/delete with representation returns
//! - Sign-up, sign-in, and bearer-token identity resolution
//!
//! Row-level policy enforcement is entirely the collaborator's: buyer calls
//! carry the buyer's bearer token, admin calls carry the service-role key,
//! and the store decides what each may touch. This crate never re-implements
//! those checks.
//!
//! Active-product catalog reads are cached with `moka` (5-minute TTL);
//! everything mutable flows straight through.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::{AuthContext, BackendClient, OrderListing, ProductListing, Session};
pub use config::BackendConfig;
pub use error::BackendError;
