//! Velora Admin library.
//!
//! Back-office functionality as a library for testing and reuse.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
