//! Field-level encryption for stored phone numbers.
//!
//! Sensitive values are encrypted with AES-256-GCM before they cross the
//! storage boundary and decrypted on the way back. The stored representation
//! is an opaque base64 blob (random 96-bit nonce followed by the
//! ciphertext); readers must not assume any length relationship to the
//! plaintext.
//!
//! Decryption is deliberately forgiving: a value that fails to decrypt
//! (wrong key after a rotation, truncated or tampered blob, bad encoding)
//! degrades to the empty string instead of surfacing an error. A corrupted
//! column reads as "no phone number on file" rather than breaking every
//! read path.
//!
//! # Security
//!
//! Always provide a stable master key in production. Generate one with:
//!
//! ```bash
//! openssl rand -hex 32
//! ```

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::{DialbackError, Result};
use crate::utils::get_env_with_prefix;

/// Nonce size for AES-256-GCM (12 bytes / 96 bits).
const NONCE_SIZE: usize = 12;

/// Reversible transform between plaintext field values and opaque stored
/// blobs, keyed by a process-wide master key.
///
/// The key is loaded once at startup and is immutable for the process
/// lifetime. The cipher is cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    /// Create a cipher from a hex-encoded 256-bit master key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is not valid hex or not
    /// exactly 32 bytes (64 hex characters). A missing or malformed key is a
    /// startup-time failure; no codec operation can run without it.
    pub fn new(hex_key: &str) -> Result<Self> {
        let key_bytes = hex::decode(hex_key)
            .map_err(|e| DialbackError::config(format!("Invalid master key format: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(DialbackError::config(
                "Master key must be 32 bytes (64 hex characters). Generate with: openssl rand -hex 32",
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| DialbackError::config(format!("Cipher init failed: {}", e)))?;

        Ok(Self { cipher })
    }

    /// Create a cipher from the `DIALBACK_MASTER_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the variable is unset or the key is
    /// malformed.
    pub fn from_env() -> Result<Self> {
        let hex_key = get_env_with_prefix("MASTER_KEY").ok_or_else(|| {
            DialbackError::config(
                "Master key is required. Set DIALBACK_MASTER_KEY. \
                Generate a key with: openssl rand -hex 32",
            )
        })?;
        Self::new(&hex_key)
    }

    /// Encrypt a plaintext field value into its stored representation.
    ///
    /// Accepts the canonical string form of the value. A fresh random nonce
    /// is used per call, so the same plaintext encrypts to different blobs.
    ///
    /// # Errors
    ///
    /// Returns an internal error if encryption itself fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| DialbackError::internal(format!("Encryption failed: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        use base64::Engine;
        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    /// Decrypt a stored blob back to the plaintext field value.
    ///
    /// An empty stored value is returned unchanged. Any decryption failure
    /// returns the empty string; the failure is logged at debug level and
    /// never propagated to the caller.
    pub fn decrypt(&self, stored: &str) -> String {
        if stored.is_empty() {
            return String::new();
        }

        use base64::Engine;
        let combined = match base64::engine::general_purpose::STANDARD.decode(stored) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::debug!(
                    target: "dialback.codec.decrypt_failed",
                    "Stored value is not valid base64"
                );
                return String::new();
            }
        };

        if combined.len() < NONCE_SIZE {
            tracing::debug!(
                target: "dialback.codec.decrypt_failed",
                "Stored value shorter than nonce"
            );
            return String::new();
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        match self.cipher.decrypt(nonce, ciphertext) {
            Ok(plaintext) => match String::from_utf8(plaintext) {
                Ok(value) => value,
                Err(_) => {
                    tracing::debug!(
                        target: "dialback.codec.decrypt_failed",
                        "Decrypted value is not valid UTF-8"
                    );
                    String::new()
                }
            },
            Err(_) => {
                tracing::debug!(
                    target: "dialback.codec.decrypt_failed",
                    "Decryption failed (wrong key or tampered value)"
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

    #[test]
    fn test_roundtrip() {
        let cipher = FieldCipher::new(KEY).unwrap();

        let encrypted = cipher.encrypt("+441234567890").unwrap();
        assert_ne!(encrypted, "+441234567890");
        assert!(!encrypted.contains("1234567890"));

        assert_eq!(cipher.decrypt(&encrypted), "+441234567890");
    }

    #[test]
    fn test_randomized_nonce() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let a = cipher.encrypt("+15555550100").unwrap();
        let b = cipher.encrypt("+15555550100").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a), cipher.decrypt(&b));
    }

    #[test]
    fn test_empty_value_passes_through() {
        let cipher = FieldCipher::new(KEY).unwrap();
        assert_eq!(cipher.decrypt(""), "");
    }

    #[test]
    fn test_wrong_key_degrades_to_empty() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let other = FieldCipher::new(OTHER_KEY).unwrap();

        let encrypted = cipher.encrypt("+15555550100").unwrap();
        assert_eq!(other.decrypt(&encrypted), "");
    }

    #[test]
    fn test_tampered_value_degrades_to_empty() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let encrypted = cipher.encrypt("+15555550100").unwrap();

        let mut chars: Vec<char> = encrypted.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert_eq!(cipher.decrypt(&tampered), "");
    }

    #[test]
    fn test_truncated_value_degrades_to_empty() {
        let cipher = FieldCipher::new(KEY).unwrap();
        let encrypted = cipher.encrypt("+15555550100").unwrap();

        assert_eq!(cipher.decrypt(&encrypted[..encrypted.len() / 2]), "");
        // Shorter than the nonce once decoded.
        assert_eq!(cipher.decrypt("AQID"), "");
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        let cipher = FieldCipher::new(KEY).unwrap();
        assert_eq!(cipher.decrypt("not base64 at all!!"), "");
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(FieldCipher::new("too_short").is_err());
        assert!(FieldCipher::new("zz23456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef").is_err());
        assert!(FieldCipher::new("").is_err());
    }
}
