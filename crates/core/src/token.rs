//! Rollback token generation.
//!
//! A token is the sole credential needed to restore the state captured by
//! a record, so it must not be derivable from record ids, timestamps, or
//! resource identity. It is pure CSPRNG output with no embedded structure.

use rand_core::{OsRng, RngCore};

/// Length of a rollback token in hex characters (32 random bytes).
pub const ROLLBACK_TOKEN_LEN: usize = 64;

/// Generate a fresh opaque rollback token.
#[must_use]
pub fn generate_rollback_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
