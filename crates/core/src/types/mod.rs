//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod email;
pub mod id;

pub use account::{AccountRole, AuthProvider, ParseAuthProviderError};
pub use email::{Email, EmailError};
pub use id::*;
