//! # Nonce Generation
//!
//! 32-byte random nonces from the platform CSPRNG. Every covenant carries
//! one so that two otherwise-identical documents never share an `id`.

use rand_core::{OsRng, RngCore};

use crate::hex::bytes_to_hex;

/// Generate a cryptographically secure 32-byte nonce.
pub fn generate_nonce() -> [u8; 32] {
    let mut nonce = [0u8; 32];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generate a nonce and return it as a 64-character lowercase hex string,
/// the form embedded in covenant documents.
pub fn generate_nonce_hex() -> String {
    bytes_to_hex(&generate_nonce())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_32_bytes() {
        assert_eq!(generate_nonce().len(), 32);
    }

    #[test]
    fn nonce_hex_is_64_lowercase_hex_chars() {
        let hex = generate_nonce_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn successive_nonces_differ() {
        // Collision probability over 256 bits is negligible.
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
