//! Pattupavadai Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront API server and the
//! `pp-cli` management tool:
//!
//! - [`Email`] - validated account key
//! - [`OrderId`] - store-assigned order identifier
//! - [`AuthProvider`] and [`AccountRole`] - how an account authenticates and
//!   what it may see
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. `sqlx` support is opt-in through the `postgres` feature.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
