//! Random nonce generation.

use base64::{Engine, engine::general_purpose::STANDARD};
use cspguard_core::{Nonce, NonceSource};
use rand::RngCore;

/// Nonce size in bytes before encoding (128-bit).
const NONCE_BYTES: usize = 16;

/// Cryptographically random nonces, base64-encoded.
///
/// Base64 (standard alphabet) never contains quotes or angle brackets, so the
/// value can be inserted into markup verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonceSource;

impl RandomNonceSource {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Nonce {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Nonce::new(STANDARD.encode(bytes))
    }
}

impl NonceSource for RandomNonceSource {
    fn next_nonce(&self) -> Nonce {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_base64_of_16_bytes() {
        let nonce = RandomNonceSource.next_nonce();
        assert_eq!(nonce.as_str().len(), 24);
        let decoded = STANDARD.decode(nonce.as_str());
        assert!(matches!(decoded, Ok(bytes) if bytes.len() == NONCE_BYTES));
    }

    #[test]
    fn test_nonces_are_unique() {
        let a = RandomNonceSource::generate();
        let b = RandomNonceSource::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_nonce_safe_for_markup() {
        let nonce = RandomNonceSource::generate();
        assert!(!nonce.as_str().contains(['"', '\'', '<', '>']));
    }
}
