//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, password login, Google login, administrator login
//! - `identity` - Google ID-token verification
//! - `orders` - Order placement and listing
//! - `images` - Preview image generation and promotion
//! - `chatbot` - Upstream shopping assistant proxy

pub mod auth;
pub mod chatbot;
pub mod identity;
pub mod images;
pub mod orders;
