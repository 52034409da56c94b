//! # Hex Encoding and Decoding
//!
//! Lowercase hex codec used for every byte value that appears in a
//! document: public keys, signatures, nonces, and hashes. Kept in-tree
//! rather than pulling in a codec crate; the needs here are small and the
//! error messages are protocol-specific.

use crate::error::CryptoError;

/// Encode bytes as a lowercase hex string of length `2 * data.len()`.
pub fn bytes_to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into bytes.
///
/// Accepts upper- or lowercase digits. Rejects odd-length input and
/// non-hex characters.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, CryptoError> {
    if s.len() % 2 != 0 {
        return Err(CryptoError::HexDecode(format!(
            "hex string has odd length: {}",
            s.len()
        )));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| CryptoError::HexDecode(format!("invalid hex at position {i}: {e}")))
        })
        .collect()
}
