//! Pattupavadai storefront API library.
//!
//! This crate provides the storefront backend as a library, allowing it to
//! be tested and reused. The binary in `main.rs` wires it to `PostgreSQL`,
//! Sentry, and the network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
