//! Session token issuance.
//!
//! Tokens are opaque: 32 bytes from the thread-local CSPRNG, hex encoded.
//! They carry no claims and do not expire; a login simply replaces the
//! account's previous token.

use rand::RngCore;

use crate::models::SessionToken;

const TOKEN_BYTES: usize = 32;

/// Issue a fresh session token.
#[must_use]
pub fn issue_token() -> SessionToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    SessionToken::new(hex::encode(bytes))
}
