//! Password reset token minting.

use rand::{rngs::OsRng, RngCore};

use crate::config::RESET_TOKEN_BYTES;

/// Mint an opaque reset token: 256 bits from the OS RNG, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_alphabet() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..64).map(|_| generate_reset_token()).collect();
        assert_eq!(tokens.len(), 64);
    }
}
