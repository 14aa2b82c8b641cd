use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

use crate::VncError;

// 3.3 authentication scheme words
pub(crate) const AUTH_FAILED: u32 = 0;
pub(crate) const AUTH_NONE: u32 = 1;
pub(crate) const AUTH_VNC: u32 = 2;

// SecurityResult words
const AUTH_RESULT_OK: u32 = 0;
const AUTH_RESULT_FAILED: u32 = 1;
const AUTH_RESULT_TOOMANY: u32 = 2;

/// Maps a SecurityResult word to success or the matching failure.
///
/// Anything outside the defined set is treated as a failure, as the
/// reference client does.
pub(crate) fn check_auth_result(result: u32) -> Result<(), VncError> {
    match result {
        AUTH_RESULT_OK => Ok(()),
        AUTH_RESULT_TOOMANY => Err(VncError::AuthTooMany),
        AUTH_RESULT_FAILED => Err(VncError::AuthFailed),
        _ => Err(VncError::AuthFailed),
    }
}

/// Computes the 16-byte response to a VNC authentication challenge.
///
/// The DES key is the password right-padded with NUL bytes to 8 bytes
/// (longer passwords are truncated), with the bits of each byte
/// mirrored as the RFB reference implementation requires. The challenge
/// is encrypted as two independent 8-byte ECB blocks.
///
/// Deterministic: the same `(password, challenge)` always yields the
/// same response.
pub fn challenge_response(password: &str, challenge: &[u8; 16]) -> [u8; 16] {
    let mut key = [0u8; 8];
    for (slot, &byte) in key.iter_mut().zip(password.as_bytes().iter().take(8)) {
        *slot = byte.reverse_bits();
    }

    let cipher = Des::new_from_slice(&key).expect("8-byte key");

    let mut response = *challenge;
    for chunk in response.chunks_exact_mut(8) {
        let mut block = [0u8; 8];
        block.copy_from_slice(chunk);
        let mut block = block.into();
        cipher.encrypt_block(&mut block);
        chunk.copy_from_slice(&block);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_deterministic() {
        let challenge = [0xA5u8; 16];
        assert_eq!(
            challenge_response("secret", &challenge),
            challenge_response("secret", &challenge)
        );
    }

    #[test]
    fn key_padding_and_truncation() {
        let challenge = [0u8; 16];
        // A password longer than 8 bytes is keyed by its first 8 bytes only.
        assert_eq!(
            challenge_response("12345678", &challenge),
            challenge_response("123456789abc", &challenge)
        );
        // Padding bytes matter: different short passwords diverge.
        assert_ne!(
            challenge_response("a", &challenge),
            challenge_response("b", &challenge)
        );
    }

    #[test]
    fn both_blocks_are_encrypted() {
        let challenge = [0u8; 16];
        let response = challenge_response("pass", &challenge);
        // ECB on identical blocks yields identical ciphertext blocks,
        // and neither is the plaintext.
        assert_eq!(response[..8], response[8..]);
        assert_ne!(response[..8], [0u8; 8]);
    }

    #[test]
    fn result_words_map_to_error_kinds() {
        assert!(check_auth_result(0).is_ok());
        assert!(matches!(check_auth_result(1), Err(VncError::AuthFailed)));
        assert!(matches!(check_auth_result(2), Err(VncError::AuthTooMany)));
        assert!(matches!(check_auth_result(7), Err(VncError::AuthFailed)));
    }
}
