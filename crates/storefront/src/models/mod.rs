//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types.

pub mod account;
pub mod order;

pub use account::{Account, PasswordCredential, SessionToken};
pub use order::{NewOrder, Order, OrderItem};
